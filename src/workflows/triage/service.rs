use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::domain::{
    AnswerSet, Intake, IntakeError, IntakeForm, PatientRecord, Priority, Question, RecordId,
};
use super::engine::IncompleteAssessment;
use super::records::{
    Durability, ExportArtifact, ExportError, ExportFormat, PriorityTally, RecordFilter,
    RecordStore, RecordStoreError,
};
use super::session::{AssessmentSession, Progress, SessionError};
use super::storage::KeyValueStore;

/// Handle for an intake whose questionnaire is still open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Open sessions kept before the oldest is evicted.
pub const DEFAULT_SESSION_LIMIT: usize = 256;

fn next_session_id() -> (u64, SessionId) {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (id, SessionId(format!("session-{id:06}")))
}

struct OpenSession {
    opened: u64,
    intake: Intake,
    session: AssessmentSession,
}

/// Facade composing the record store, the clock, and the intakes currently being triaged.
///
/// Each call takes the relevant lock for its whole duration, so operations are observed one at a
/// time and a save is visible to the next read only after it has been persisted.
///
/// At most `session_limit` sessions stay open; opening one more evicts the oldest.
pub struct TriageDesk<S, C> {
    store: Mutex<RecordStore<S>>,
    sessions: Mutex<HashMap<SessionId, OpenSession>>,
    session_limit: usize,
    clock: Arc<C>,
}

impl<S, C> TriageDesk<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: RecordStore<S>, clock: Arc<C>) -> Self {
        Self {
            store: Mutex::new(store),
            sessions: Mutex::new(HashMap::new()),
            session_limit: DEFAULT_SESSION_LIMIT,
            clock,
        }
    }

    pub fn with_session_limit(mut self, limit: usize) -> Self {
        self.session_limit = limit.max(1);
        self
    }

    /// Validate intake data and start a fresh questionnaire for it.
    pub fn open_session(&self, form: &IntakeForm) -> Result<SessionView, TriageDeskError> {
        let intake = form.validate()?;
        let (opened, id) = next_session_id();
        let open = OpenSession {
            opened,
            intake,
            session: AssessmentSession::new(),
        };
        let view = SessionView::new(&id, &open);

        let mut sessions = self.sessions();
        while sessions.len() >= self.session_limit {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, open)| open.opened)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            warn!(session = %oldest, "evicted oldest open triage session");
        }

        debug!(session = %id, "opened triage session");
        sessions.insert(id, open);
        Ok(view)
    }

    pub fn session(&self, id: &SessionId) -> Result<SessionView, TriageDeskError> {
        let sessions = self.sessions();
        let open = sessions
            .get(id)
            .ok_or_else(|| TriageDeskError::UnknownSession(id.clone()))?;
        Ok(SessionView::new(id, open))
    }

    pub fn answer(
        &self,
        id: &SessionId,
        question: Question,
        value: bool,
    ) -> Result<SessionView, TriageDeskError> {
        let mut sessions = self.sessions();
        let open = sessions
            .get_mut(id)
            .ok_or_else(|| TriageDeskError::UnknownSession(id.clone()))?;
        open.session.answer(question, value)?;
        Ok(SessionView::new(id, open))
    }

    /// Discards an open session. Nothing was persisted for it, so there is nothing to undo.
    pub fn abandon(&self, id: &SessionId) -> Result<(), TriageDeskError> {
        self.sessions()
            .remove(id)
            .map(|_| debug!(session = %id, "abandoned triage session"))
            .ok_or_else(|| TriageDeskError::UnknownSession(id.clone()))
    }

    /// Turn a completed session into a stored record. An incomplete session stays open.
    pub fn finalize(&self, id: &SessionId) -> Result<PatientRecord, TriageDeskError> {
        let mut sessions = self.sessions();
        let open = sessions
            .remove(id)
            .ok_or_else(|| TriageDeskError::UnknownSession(id.clone()))?;

        match self.save(&open.intake, open.session) {
            Ok(record) => Ok(record),
            Err(SaveFailure { session, error }) => {
                if let Some(session) = session {
                    sessions.insert(
                        id.clone(),
                        OpenSession {
                            opened: open.opened,
                            intake: open.intake,
                            session,
                        },
                    );
                }
                Err(error)
            }
        }
    }

    /// Finalize a session driven outside the registry (the CLI walks its own session).
    pub fn record_assessment(
        &self,
        intake: &Intake,
        session: AssessmentSession,
    ) -> Result<PatientRecord, TriageDeskError> {
        self.save(intake, session).map_err(|failure| failure.error)
    }

    pub fn records(&self, filter: &RecordFilter) -> RecordListing {
        let store = self.store();
        RecordListing {
            records: store.filter(filter).into_iter().cloned().collect(),
            tally: store.tally(),
            durability: store.durability(),
        }
    }

    pub fn record(&self, id: RecordId) -> Result<PatientRecord, TriageDeskError> {
        self.store()
            .get(id)
            .cloned()
            .ok_or(TriageDeskError::Store(RecordStoreError::NotFound(id)))
    }

    pub fn delete(&self, id: RecordId) -> Result<PatientRecord, TriageDeskError> {
        Ok(self.store().remove(id)?)
    }

    /// Irreversibly remove every record; callers must pass the operator's explicit confirmation.
    pub fn clear(&self, confirmed: bool) -> Result<usize, TriageDeskError> {
        if !confirmed {
            return Err(TriageDeskError::ConfirmationRequired);
        }
        Ok(self.store().clear())
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, TriageDeskError> {
        let today = self.clock.now().date_naive();
        Ok(self.store().export(format, today)?)
    }

    pub fn durability(&self) -> Durability {
        self.store().durability()
    }

    fn save(
        &self,
        intake: &Intake,
        session: AssessmentSession,
    ) -> Result<PatientRecord, SaveFailure> {
        let mut store = self.store();
        let stamp = store.next_stamp(self.clock.as_ref());

        let record = session.finalize(intake, stamp).map_err(|err| SaveFailure {
            error: TriageDeskError::Incomplete(err.incomplete.clone()),
            session: Some(err.into_session()),
        })?;

        let stored = store.append(record).map_err(|err| SaveFailure {
            error: err.into(),
            session: None,
        })?;

        info!(id = %stored.id, priority = %stored.priority, "patient saved");
        Ok(stored.clone())
    }

    fn store(&self) -> MutexGuard<'_, RecordStore<S>> {
        self.store.lock().expect("record store mutex poisoned")
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, OpenSession>> {
        self.sessions.lock().expect("session registry mutex poisoned")
    }
}

struct SaveFailure {
    session: Option<AssessmentSession>,
    error: TriageDeskError,
}

/// Snapshot of an open session for operator surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub intake: Intake,
    pub answers: AnswerSet,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Priority>,
    pub complete: bool,
}

impl SessionView {
    fn new(id: &SessionId, open: &OpenSession) -> Self {
        let session = &open.session;
        Self {
            session_id: id.clone(),
            intake: open.intake.clone(),
            answers: *session.answers(),
            progress: session.progress(),
            current_question: session.current_question().map(QuestionView::from),
            preview: session.preview_priority().ok(),
            complete: session.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub key: Question,
    pub prompt: &'static str,
    pub position: usize,
    pub total: usize,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            key: question,
            prompt: question.prompt(),
            position: question.position(),
            total: Question::ORDER.len(),
        }
    }
}

/// Filtered records plus totals over the full collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordListing {
    pub records: Vec<PatientRecord>,
    pub tally: PriorityTally,
    pub durability: Durability,
}

#[derive(Debug, thiserror::Error)]
pub enum TriageDeskError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("please answer all triage questions before saving the patient ({0})")]
    Incomplete(IncompleteAssessment),
    #[error(transparent)]
    Store(#[from] RecordStoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("triage session '{0}' not found")]
    UnknownSession(SessionId),
    #[error("clearing all records requires explicit confirmation")]
    ConfirmationRequired,
}
