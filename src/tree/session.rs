use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};

use crate::family::FamilyRecord;

pub(crate) type SharedFetch = Shared<LocalBoxFuture<'static, Option<Rc<FamilyRecord>>>>;

enum Fetch {
    InFlight(SharedFetch),
    Resolved(Rc<FamilyRecord>),
}

/// Per-session context: the family cache with its single-flight map, the placeholder aliases,
/// sibling toggle flags and the set of live trigger ids.
#[derive(Default)]
pub struct Session {
    epoch: u64,
    fetches: HashMap<String, Fetch>,
    aliases: HashMap<String, String>,
    sibling_expanded: HashSet<String>,
    active_triggers: BTreeSet<String>,
}

impl Session {
    /// Bumped on every reset so continuations from an older session can tell they are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn clear(&mut self) {
        self.epoch += 1;
        self.fetches.clear();
        self.aliases.clear();
        self.sibling_expanded.clear();
        self.active_triggers.clear();
    }

    pub fn canonical<'a>(&'a self, id: &'a str) -> &'a str {
        self.aliases.get(id).map_or(id, String::as_str)
    }

    pub fn record(&self, id: &str) -> Option<Rc<FamilyRecord>> {
        match self.fetches.get(self.canonical(id))? {
            Fetch::Resolved(record) => Some(Rc::clone(record)),
            Fetch::InFlight(_) => None,
        }
    }

    pub(crate) fn in_flight(&self, id: &str) -> Option<SharedFetch> {
        match self.fetches.get(self.canonical(id))? {
            Fetch::InFlight(fetch) => Some(fetch.clone()),
            Fetch::Resolved(_) => None,
        }
    }

    pub(crate) fn begin(&mut self, id: &str, fetch: SharedFetch) {
        self.fetches.insert(id.to_owned(), Fetch::InFlight(fetch));
    }

    /// Stores a resolved record under its canonical id. A differing requested id becomes an
    /// alias of the canonical one.
    pub(crate) fn resolve(&mut self, requested: &str, record: FamilyRecord) -> Rc<FamilyRecord> {
        if let Some(existing) = self.record(&record.id) {
            self.alias(requested, &record.id);
            return existing;
        }

        let record = Rc::new(record);
        self.fetches
            .insert(record.id.clone(), Fetch::Resolved(Rc::clone(&record)));
        self.alias(requested, &record.id);
        record
    }

    /// Drops the in-flight entry so a later expansion retries.
    pub(crate) fn fail(&mut self, requested: &str) {
        if matches!(self.fetches.get(requested), Some(Fetch::InFlight(_))) {
            self.fetches.remove(requested);
        }
    }

    fn alias(&mut self, requested: &str, canonical: &str) {
        if requested == canonical {
            return;
        }
        if matches!(self.fetches.get(requested), Some(Fetch::InFlight(_))) {
            self.fetches.remove(requested);
        }
        self.aliases
            .insert(requested.to_owned(), canonical.to_owned());
    }

    pub fn siblings_expanded(&self, id: &str) -> bool {
        self.sibling_expanded.contains(id)
    }

    pub(crate) fn set_siblings_expanded(&mut self, id: &str, expanded: bool) {
        if expanded {
            self.sibling_expanded.insert(id.to_owned());
        } else {
            self.sibling_expanded.remove(id);
        }
    }

    pub fn active_triggers(&self) -> impl Iterator<Item = &str> {
        self.active_triggers.iter().map(String::as_str)
    }

    pub(crate) fn track_trigger(&mut self, id: &str) {
        self.active_triggers.insert(id.to_owned());
    }

    pub(crate) fn untrack_trigger(&mut self, id: &str) {
        self.active_triggers.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn record(id: &str) -> FamilyRecord {
        FamilyRecord {
            id: id.to_owned(),
            label: id.to_owned(),
            gender: Default::default(),
            life_span: None,
            family: Default::default(),
        }
    }

    fn pending_fetch() -> SharedFetch {
        futures::future::pending().boxed_local().shared()
    }

    #[test]
    fn placeholder_resolution_aliases_to_canonical() {
        let mut session = Session::default();
        session.begin("queen_victoria", pending_fetch());
        assert!(session.in_flight("queen_victoria").is_some());

        let stored = session.resolve("queen_victoria", record("Q9439"));
        assert_eq!(stored.id, "Q9439");
        assert!(session.in_flight("queen_victoria").is_none());
        assert_eq!(session.canonical("queen_victoria"), "Q9439");
        assert_eq!(
            session.record("queen_victoria").map(|r| r.id.clone()),
            Some("Q9439".to_owned())
        );
    }

    #[test]
    fn resolving_twice_keeps_the_first_record() {
        let mut session = Session::default();
        let first = session.resolve("Q1", record("Q1"));
        let second = session.resolve("q1_term", record("Q1"));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn failures_are_not_cached_and_clear_bumps_epoch() {
        let mut session = Session::default();
        session.begin("Q1", pending_fetch());
        session.fail("Q1");
        assert!(session.in_flight("Q1").is_none());
        assert!(session.record("Q1").is_none());

        session.set_siblings_expanded("Q1", true);
        session.track_trigger("trigger_parents_Q1");
        let epoch = session.epoch();
        session.clear();
        assert_eq!(session.epoch(), epoch + 1);
        assert!(!session.siblings_expanded("Q1"));
        assert_eq!(session.active_triggers().count(), 0);
    }
}
