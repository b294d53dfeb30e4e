mod parse;
mod provider;
mod record;
mod source;

pub use provider::{FamilyProvider, Lookup, LookupError};
pub use record::{Child, Family, FamilyRecord, Gender, Relative};
pub use source::{Dataset, JsonFamilySource};
