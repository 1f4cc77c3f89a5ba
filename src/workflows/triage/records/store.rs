use chrono::{NaiveDate, Timelike};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::super::clock::Clock;
use super::super::domain::{PatientRecord, Priority, RecordId};
use super::super::storage::KeyValueStore;
use super::export::{self, ExportArtifact, ExportError, ExportFormat};
use super::filter::RecordFilter;
use super::seed;
use super::RecordStamp;

/// Storage key holding the serialized record collection.
pub const STORAGE_KEY: &str = "triagePatients";

/// What to do when storage holds no collection yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    #[default]
    Examples,
    Empty,
}

/// Whether the in-memory collection is known to match persisted storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    Persisted,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordStoreError {
    #[error("a record with id {0} already exists")]
    DuplicateId(RecordId),
    #[error("record {0} not found")]
    NotFound(RecordId),
}

/// Per-priority counts over the whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityTally {
    pub total: usize,
    pub critical: usize,
    pub urgent: usize,
    pub stable: usize,
}

impl PriorityTally {
    pub fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::Urgent => self.urgent,
            Priority::Stable => self.stable,
        }
    }
}

/// Ordered, persisted collection of patient records, newest first.
///
/// Every mutation rewrites the full collection before returning. Storage failures are logged and
/// leave the store running from memory with [`Durability::Degraded`].
pub struct RecordStore<S> {
    storage: S,
    records: Vec<PatientRecord>,
    durability: Durability,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn load(storage: S, policy: SeedPolicy) -> Self {
        let mut seeded = false;
        let (records, durability) = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PatientRecord>>(&raw) {
                Ok(records) => {
                    info!(count = records.len(), "loaded patient records");
                    (records, Durability::Persisted)
                }
                Err(err) => {
                    error!(error = %err, "stored patient records are unreadable; starting empty");
                    (Vec::new(), Durability::Degraded)
                }
            },
            Ok(None) => match policy {
                SeedPolicy::Examples => {
                    info!("no stored patient records; seeding example records");
                    seeded = true;
                    (seed::example_records(), Durability::Persisted)
                }
                SeedPolicy::Empty => (Vec::new(), Durability::Persisted),
            },
            Err(err) => {
                error!(error = %err, "failed to read patient records; starting empty");
                (Vec::new(), Durability::Degraded)
            }
        };

        let mut store = Self {
            storage,
            records,
            durability,
        };
        if seeded {
            store.persist();
        }
        store
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn durability(&self) -> Durability {
        self.durability
    }

    pub fn get(&self, id: RecordId) -> Option<&PatientRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Identifier and timestamp for the next record. The identifier is the clock's epoch
    /// milliseconds, bumped past any stored id so two saves in one millisecond stay distinct.
    /// The timestamp is local wall time truncated to the minute, the precision records persist at.
    pub fn next_stamp(&self, clock: &dyn Clock) -> RecordStamp {
        let now = clock.now();
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let wall = now.naive_local();
        let created_at = wall
            .with_second(0)
            .and_then(|minute| minute.with_nanosecond(0))
            .unwrap_or(wall);
        let floor = self
            .records
            .iter()
            .map(|record| record.id.0.saturating_add(1))
            .max()
            .unwrap_or_default();

        RecordStamp {
            id: RecordId(millis.max(floor)),
            created_at,
        }
    }

    pub fn append(&mut self, record: PatientRecord) -> Result<&PatientRecord, RecordStoreError> {
        if self.get(record.id).is_some() {
            return Err(RecordStoreError::DuplicateId(record.id));
        }

        info!(id = %record.id, priority = %record.priority, "recording patient");
        self.records.insert(0, record);
        self.persist();
        Ok(&self.records[0])
    }

    pub fn remove(&mut self, id: RecordId) -> Result<PatientRecord, RecordStoreError> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(RecordStoreError::NotFound(id))?;

        let removed = self.records.remove(index);
        info!(id = %id, "deleted patient record");
        self.persist();
        Ok(removed)
    }

    /// Drops every record and the persisted key. Returns how many records were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();

        self.durability = match self.storage.remove(STORAGE_KEY) {
            Ok(()) => Durability::Persisted,
            Err(err) => {
                warn!(error = %err, "failed to remove stored patient records");
                Durability::Degraded
            }
        };
        info!(removed, "cleared patient records");
        removed
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<&PatientRecord> {
        let matches = filter.matcher();
        self.records.iter().filter(|&record| matches(record)).collect()
    }

    pub fn tally(&self) -> PriorityTally {
        self.records
            .iter()
            .fold(PriorityTally::default(), |mut tally, record| {
                tally.total += 1;
                match record.priority {
                    Priority::Critical => tally.critical += 1,
                    Priority::Urgent => tally.urgent += 1,
                    Priority::Stable => tally.stable += 1,
                }
                tally
            })
    }

    pub fn export(
        &self,
        format: ExportFormat,
        today: NaiveDate,
    ) -> Result<ExportArtifact, ExportError> {
        export::export(&self.records, format, today)
    }

    fn persist(&mut self) {
        let payload = match serde_json::to_string(&self.records) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "failed to encode patient records");
                self.durability = Durability::Degraded;
                return;
            }
        };

        self.durability = match self.storage.set(STORAGE_KEY, &payload) {
            Ok(()) => {
                debug!(count = self.records.len(), "persisted patient records");
                Durability::Persisted
            }
            Err(err) => {
                warn!(error = %err, "failed to persist patient records; continuing in memory");
                Durability::Degraded
            }
        };
    }
}
