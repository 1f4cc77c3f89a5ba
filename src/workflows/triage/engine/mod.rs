//! Priority derivation for the four-question triage questionnaire.
//!
//! The rule set is a strict precedence list rather than a score: breathing and consciousness
//! failures dominate, then combined bleeding and immobility, then each of those alone.

mod rules;

pub use rules::TriageRule;

use super::domain::{AnswerSet, Priority, Question, TriageAnswers};
use serde::Serialize;

/// Priority for a fully answered questionnaire.
pub fn classify(answers: &TriageAnswers) -> Priority {
    rules::first_match(answers).priority()
}

/// Priority together with the rule that produced it.
pub fn explain(answers: &TriageAnswers) -> RuleMatch {
    let rule = rules::first_match(answers);
    RuleMatch {
        priority: rule.priority(),
        rule,
        rationale: rule.rationale(),
    }
}

/// Priority for a possibly partial answer set. Never guesses: any unanswered question yields
/// [`IncompleteAssessment`].
pub fn derive_priority(answers: &AnswerSet) -> Result<Priority, IncompleteAssessment> {
    answers
        .complete()
        .map(|complete| classify(&complete))
        .ok_or_else(|| IncompleteAssessment::from_answers(answers))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub priority: Priority,
    pub rule: TriageRule,
    pub rationale: &'static str,
}

/// Signal that a priority was requested before every question was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("assessment incomplete: unanswered {}", join_keys(.missing))]
pub struct IncompleteAssessment {
    pub missing: Vec<Question>,
}

impl IncompleteAssessment {
    pub(crate) fn from_answers(answers: &AnswerSet) -> Self {
        Self {
            missing: answers.unanswered(),
        }
    }
}

fn join_keys(questions: &[Question]) -> String {
    questions
        .iter()
        .map(|question| question.key())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::triage::domain::Answer;

    fn answers(breathing: bool, conscious: bool, walking: bool, bleeding: bool) -> TriageAnswers {
        TriageAnswers {
            breathing,
            conscious,
            walking,
            bleeding,
        }
    }

    #[test]
    fn breathing_failure_outranks_combined_bleeding_rule() {
        let matched = explain(&answers(false, false, false, true));
        assert_eq!(matched.rule, TriageRule::NotBreathing);
        assert_eq!(matched.priority, Priority::Critical);
    }

    #[test]
    fn incomplete_lists_missing_questions_in_order() {
        let partial = AnswerSet {
            breathing: Answer::Yes,
            conscious: Answer::Unknown,
            walking: Answer::No,
            bleeding: Answer::Unknown,
        };

        let err = derive_priority(&partial).expect_err("partial set is incomplete");
        assert_eq!(err.missing, vec![Question::Conscious, Question::Bleeding]);
        assert_eq!(
            err.to_string(),
            "assessment incomplete: unanswered conscious, bleeding"
        );
    }
}
