//! Patient intake triage: the four-question priority engine, the single-use assessment session
//! that walks an operator through it, and the persisted record store fed by finalized sessions.

pub mod clock;
pub mod domain;
pub mod engine;
pub mod records;
pub mod router;
pub mod service;
pub mod session;
pub mod storage;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    Answer, AnswerSet, Intake, IntakeError, IntakeForm, PatientRecord, Priority, Question,
    RecordId, Sex, TriageAnswers,
};
pub use engine::{classify, derive_priority, explain, IncompleteAssessment, RuleMatch, TriageRule};
pub use records::{
    Durability, ExportArtifact, ExportFormat, PriorityTally, RecordFilter, RecordStamp,
    RecordStore, RecordStoreError, SeedPolicy, Selection,
};
pub use router::triage_router;
pub use service::{
    RecordListing, SessionId, SessionView, TriageDesk, TriageDeskError, DEFAULT_SESSION_LIMIT,
};
pub use session::{AssessmentSession, FinalizeError, Progress, SessionError};
pub use storage::{DirectoryStore, KeyValueStore, MemoryStore, StorageError};
