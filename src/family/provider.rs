use futures::future::LocalBoxFuture;
use thiserror::Error;

use super::record::FamilyRecord;

/// What to resolve: a canonical identity, or a free-text search term typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Identity(String),
    Term(String),
}

impl Lookup {
    pub fn describe(&self) -> &str {
        match self {
            Self::Identity(id) => id,
            Self::Term(term) => term,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no person matched {0:?}")]
    NotFound(String),
    #[error("family data provider dropped the request for {0:?}")]
    Disconnected(String),
    #[error("family data provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves identities to family records. Implementations must be idempotent and safe
/// to retry; the engine treats every error as "no data".
pub trait FamilyProvider {
    fn lookup(&self, query: Lookup) -> LocalBoxFuture<'static, Result<FamilyRecord, LookupError>>;
}
