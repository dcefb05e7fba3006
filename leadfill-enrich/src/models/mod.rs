//! Data models for contact enrichment

pub mod lookup;
pub mod record;

pub use lookup::{ContactFragment, LookupResult, LookupStatus};
pub use record::{ContactQuery, EnrichedRecord, InputRecord};
