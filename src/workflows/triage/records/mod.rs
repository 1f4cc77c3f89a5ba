pub mod export;
pub mod filter;
mod seed;
mod store;

use chrono::NaiveDateTime;

use super::domain::RecordId;

pub use export::{ExportArtifact, ExportError, ExportFormat};
pub use filter::{RecordFilter, Selection};
pub use seed::example_records;
pub use store::{
    Durability, PriorityTally, RecordStore, RecordStoreError, SeedPolicy, STORAGE_KEY,
};

/// Identity and creation time assigned to a record at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStamp {
    pub id: RecordId,
    pub created_at: NaiveDateTime,
}
