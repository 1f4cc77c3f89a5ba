use std::fmt;

use serde::Serialize;

use super::domain::{Answer, AnswerSet, Intake, PatientRecord, Priority, Question};
use super::engine::{self, IncompleteAssessment};
use super::records::RecordStamp;

/// Single-use walk through the fixed questionnaire for one patient.
///
/// The current question is derived from the answer set, never tracked separately, so the
/// session can only advance by answering exactly that question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentSession {
    answers: AnswerSet,
}

impl AssessmentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn current_question(&self) -> Option<Question> {
        self.answers.current_question()
    }

    pub fn is_complete(&self) -> bool {
        self.current_question().is_none()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.answered_count(),
            total: Question::ORDER.len(),
        }
    }

    /// Records the answer to the current question and returns the question that follows.
    pub fn answer(
        &mut self,
        question: Question,
        value: bool,
    ) -> Result<Option<Question>, SessionError> {
        let current = self
            .current_question()
            .ok_or(SessionError::AlreadyComplete { attempted: question })?;

        if current != question {
            return Err(SessionError::OutOfOrder {
                expected: current,
                attempted: question,
            });
        }

        self.answers.set(question, Answer::from(value));
        Ok(self.current_question())
    }

    /// Advisory priority for the answers so far; recomputed on every call.
    pub fn preview_priority(&self) -> Result<Priority, IncompleteAssessment> {
        engine::derive_priority(&self.answers)
    }

    /// Consumes a completed session into a patient record.
    ///
    /// An incomplete session is handed back untouched inside the error so the operator can keep
    /// answering.
    pub fn finalize(
        self,
        intake: &Intake,
        stamp: RecordStamp,
    ) -> Result<PatientRecord, FinalizeError> {
        let Some(triage_answers) = self.answers.complete() else {
            let incomplete = IncompleteAssessment::from_answers(&self.answers);
            return Err(FinalizeError {
                session: self,
                incomplete,
            });
        };

        Ok(PatientRecord {
            id: stamp.id,
            name: intake.name().to_string(),
            age: intake.age(),
            time: stamp.created_at.time(),
            date: stamp.created_at.date(),
            priority: engine::classify(&triage_answers),
            symptoms: intake.symptoms().to_string(),
            sex: intake.sex(),
            triage_answers,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.answered, self.total)
    }
}

/// Answer rejected because it does not target the session's current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("expected an answer for '{expected}', got '{attempted}'")]
    OutOfOrder {
        expected: Question,
        attempted: Question,
    },
    #[error("assessment already complete; '{attempted}' cannot be answered again")]
    AlreadyComplete { attempted: Question },
}

/// Finalization attempted before every question was answered.
#[derive(Debug, thiserror::Error)]
#[error("{incomplete}")]
pub struct FinalizeError {
    pub session: AssessmentSession,
    pub incomplete: IncompleteAssessment,
}

impl FinalizeError {
    pub fn into_session(self) -> AssessmentSession {
        self.session
    }
}
