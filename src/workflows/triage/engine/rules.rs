use super::super::domain::{Priority, TriageAnswers};
use serde::Serialize;

/// Identifies which precedence rule produced a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageRule {
    NotBreathing,
    Unconscious,
    BleedingAndImmobile,
    Bleeding,
    Immobile,
    NoRedFlags,
}

impl TriageRule {
    /// Precedence order; the first rule whose condition holds wins.
    pub const PRECEDENCE: [TriageRule; 6] = [
        TriageRule::NotBreathing,
        TriageRule::Unconscious,
        TriageRule::BleedingAndImmobile,
        TriageRule::Bleeding,
        TriageRule::Immobile,
        TriageRule::NoRedFlags,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::NotBreathing => "not_breathing",
            Self::Unconscious => "unconscious",
            Self::BleedingAndImmobile => "bleeding_and_immobile",
            Self::Bleeding => "bleeding",
            Self::Immobile => "immobile",
            Self::NoRedFlags => "no_red_flags",
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::NotBreathing | Self::Unconscious | Self::BleedingAndImmobile => {
                Priority::Critical
            }
            Self::Bleeding | Self::Immobile => Priority::Urgent,
            Self::NoRedFlags => Priority::Stable,
        }
    }

    pub const fn rationale(self) -> &'static str {
        match self {
            Self::NotBreathing => "respiratory failure",
            Self::Unconscious => "unconscious patient, possible head injury or shock",
            Self::BleedingAndImmobile => {
                "severe bleeding with inability to walk suggests major trauma"
            }
            Self::Bleeding => "severe bleeding in an ambulatory patient needs prompt hemostasis",
            Self::Immobile => "non-ambulatory patient, possible fracture or limiting injury",
            Self::NoRedFlags => "breathing, conscious, ambulatory, no severe bleeding",
        }
    }

    pub(crate) fn applies(self, answers: &TriageAnswers) -> bool {
        match self {
            Self::NotBreathing => !answers.breathing,
            Self::Unconscious => !answers.conscious,
            Self::BleedingAndImmobile => answers.bleeding && !answers.walking,
            Self::Bleeding => answers.bleeding,
            Self::Immobile => !answers.walking,
            Self::NoRedFlags => true,
        }
    }
}

pub(crate) fn first_match(answers: &TriageAnswers) -> TriageRule {
    TriageRule::PRECEDENCE
        .into_iter()
        .find(|rule| rule.applies(answers))
        .unwrap_or(TriageRule::NoRedFlags)
}
