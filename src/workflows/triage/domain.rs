use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Time-derived record identifier (milliseconds since the Unix epoch at save time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse::<u64>().map(Self)
    }
}

/// Priority tier assigned by the triage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Urgent,
    Stable,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Critical, Priority::Urgent, Priority::Stable];

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Urgent => "urgent",
            Self::Stable => "stable",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Urgent => "Urgent",
            Self::Stable => "Stable",
        }
    }

    /// Operator-facing explanation shown alongside the final tier.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Critical => "Life-threatening condition requiring immediate medical intervention. Airway, breathing, or circulation compromise detected.",
            Self::Urgent => "Serious condition requiring prompt medical attention. The patient needs priority treatment but is currently stable.",
            Self::Stable => "Non-urgent condition. The patient can safely wait for treatment.",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "urgent" => Ok(Self::Urgent),
            "stable" => Ok(Self::Stable),
            _ => Err(UnknownVariant::new("priority", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Sex {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(UnknownVariant::new("sex", raw)),
        }
    }
}

/// Parse failure for the string forms of the enumerations in this module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The fixed questionnaire, in the order an operator must answer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Question {
    Breathing,
    Conscious,
    Walking,
    Bleeding,
}

impl Question {
    pub const ORDER: [Question; 4] = [
        Question::Breathing,
        Question::Conscious,
        Question::Walking,
        Question::Bleeding,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Breathing => "breathing",
            Self::Conscious => "conscious",
            Self::Walking => "walking",
            Self::Bleeding => "bleeding",
        }
    }

    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Breathing => "Is the patient breathing?",
            Self::Conscious => "Is the patient conscious?",
            Self::Walking => "Can the patient walk?",
            Self::Bleeding => {
                "Does the patient have severe wounds, open fractures, or active bleeding?"
            }
        }
    }

    /// Short label used in text reports.
    pub const fn report_label(self) -> &'static str {
        match self {
            Self::Breathing => "Breathing",
            Self::Conscious => "Conscious",
            Self::Walking => "Can walk",
            Self::Bleeding => "Severe bleeding",
        }
    }

    /// One-based position within the questionnaire.
    pub fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|question| *question == self)
            .map_or(0, |index| index + 1)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Question {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|question| question.key().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownVariant::new("question", raw))
    }
}

/// Three-state answer to a single question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    #[default]
    Unknown,
    Yes,
    No,
}

impl Answer {
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Yes => Some(true),
            Self::No => Some(false),
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl From<Option<bool>> for Answer {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

/// Partially or fully answered questionnaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    #[serde(default)]
    pub breathing: Answer,
    #[serde(default)]
    pub conscious: Answer,
    #[serde(default)]
    pub walking: Answer,
    #[serde(default)]
    pub bleeding: Answer,
}

impl AnswerSet {
    pub fn get(&self, question: Question) -> Answer {
        match question {
            Question::Breathing => self.breathing,
            Question::Conscious => self.conscious,
            Question::Walking => self.walking,
            Question::Bleeding => self.bleeding,
        }
    }

    pub(crate) fn set(&mut self, question: Question, answer: Answer) {
        let slot = match question {
            Question::Breathing => &mut self.breathing,
            Question::Conscious => &mut self.conscious,
            Question::Walking => &mut self.walking,
            Question::Bleeding => &mut self.bleeding,
        };
        *slot = answer;
    }

    /// First unanswered question in fixed order.
    pub fn current_question(&self) -> Option<Question> {
        Question::ORDER
            .into_iter()
            .find(|question| !self.get(*question).is_known())
    }

    pub fn unanswered(&self) -> Vec<Question> {
        Question::ORDER
            .into_iter()
            .filter(|question| !self.get(*question).is_known())
            .collect()
    }

    pub fn answered_count(&self) -> usize {
        Question::ORDER.len() - self.unanswered().len()
    }

    /// Freezes the set once every question has an answer.
    pub fn complete(&self) -> Option<TriageAnswers> {
        Some(TriageAnswers {
            breathing: self.breathing.value()?,
            conscious: self.conscious.value()?,
            walking: self.walking.value()?,
            bleeding: self.bleeding.value()?,
        })
    }
}

/// Frozen, fully answered questionnaire stored on a patient record.
///
/// Persisted payloads from older builds may carry a `pulse` entry; it is accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriageAnswers {
    pub breathing: bool,
    pub conscious: bool,
    pub walking: bool,
    pub bleeding: bool,
}

impl TriageAnswers {
    pub fn get(&self, question: Question) -> bool {
        match question {
            Question::Breathing => self.breathing,
            Question::Conscious => self.conscious,
            Question::Walking => self.walking,
            Question::Bleeding => self.bleeding,
        }
    }
}

impl From<TriageAnswers> for AnswerSet {
    fn from(answers: TriageAnswers) -> Self {
        Self {
            breathing: answers.breathing.into(),
            conscious: answers.conscious.into(),
            walking: answers.walking.into(),
            bleeding: answers.bleeding.into(),
        }
    }
}

/// Validated demographics captured before triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intake {
    name: String,
    age: u32,
    sex: Sex,
    symptoms: String,
}

impl Intake {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        sex: Sex,
        symptoms: impl Into<String>,
    ) -> Result<Self, IntakeError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(IntakeError::MissingName);
        }

        Ok(Self {
            name,
            age,
            sex,
            symptoms: symptoms.into().trim().to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }
}

/// Raw intake form as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub symptoms: String,
}

impl IntakeForm {
    pub fn validate(&self) -> Result<Intake, IntakeError> {
        let raw_age = self.age.trim();
        if raw_age.is_empty() {
            return Err(IntakeError::MissingAge);
        }
        let age = raw_age
            .parse::<u32>()
            .map_err(|_| IntakeError::InvalidAge(raw_age.to_string()))?;

        Intake::new(
            self.name.as_str(),
            age,
            self.sex.unwrap_or(Sex::Male),
            self.symptoms.as_str(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("patient name is required")]
    MissingName,
    #[error("patient age is required")]
    MissingAge,
    #[error("patient age must be a non-negative whole number, got '{0}'")]
    InvalidAge(String),
}

/// Immutable, finalized intake entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: RecordId,
    pub name: String,
    pub age: u32,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub date: NaiveDate,
    pub priority: Priority,
    pub symptoms: String,
    pub sex: Sex,
    pub triage_answers: TriageAnswers,
}

impl PatientRecord {
    pub fn matches_text(&self, needle_lowercase: &str) -> bool {
        self.name.to_lowercase().contains(needle_lowercase)
            || self.symptoms.to_lowercase().contains(needle_lowercase)
    }
}

/// `HH:MM` on write; also accepts seconds and the 12-hour `09:30 AM` form on read.
mod clock_time {
    use super::*;

    const FORMAT: &str = "%H:%M";

    pub(super) fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("failed to parse '{raw}' as HH:MM"))
        })
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveTime> {
        let trimmed = raw.trim();
        [FORMAT, "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_question_follows_fixed_order() {
        let mut answers = AnswerSet::default();
        assert_eq!(answers.current_question(), Some(Question::Breathing));

        answers.set(Question::Breathing, Answer::Yes);
        answers.set(Question::Walking, Answer::No);
        assert_eq!(answers.current_question(), Some(Question::Conscious));
        assert_eq!(answers.answered_count(), 2);
        assert!(answers.complete().is_none());
    }

    #[test]
    fn complete_freezes_answers() {
        let answers = AnswerSet {
            breathing: Answer::Yes,
            conscious: Answer::No,
            walking: Answer::Yes,
            bleeding: Answer::No,
        };

        let frozen = answers.complete().expect("all answered");
        assert!(frozen.breathing);
        assert!(!frozen.conscious);
        assert_eq!(AnswerSet::from(frozen), answers);
        assert_eq!(answers.current_question(), None);
    }

    #[test]
    fn intake_form_rejects_blank_name_and_bad_age() {
        let mut form = IntakeForm {
            name: "   ".to_string(),
            age: "40".to_string(),
            sex: Some(Sex::Female),
            symptoms: "Headache".to_string(),
        };
        assert_eq!(form.validate(), Err(IntakeError::MissingName));

        form.name = "Ruth".to_string();
        form.age = "-3".to_string();
        assert_eq!(
            form.validate(),
            Err(IntakeError::InvalidAge("-3".to_string()))
        );

        form.age = String::new();
        assert_eq!(form.validate(), Err(IntakeError::MissingAge));

        form.age = " 40 ".to_string();
        let intake = form.validate().expect("valid intake");
        assert_eq!(intake.name(), "Ruth");
        assert_eq!(intake.age(), 40);
        assert_eq!(intake.sex(), Sex::Female);
    }

    #[test]
    fn record_tolerates_pulse_and_twelve_hour_times() {
        let raw = r#"{
            "id": 7,
            "name": "Michael",
            "age": 50,
            "time": "09:30 PM",
            "date": "2025-07-19",
            "priority": "stable",
            "symptoms": "Mild arm pain",
            "sex": "male",
            "triageAnswers": {
                "breathing": true,
                "pulse": null,
                "conscious": true,
                "walking": true,
                "bleeding": false
            }
        }"#;

        let record: PatientRecord = serde_json::from_str(raw).expect("legacy record parses");
        assert_eq!(record.time, NaiveTime::from_hms_opt(21, 30, 0).unwrap());

        let json = serde_json::to_value(&record).expect("serializes");
        assert_eq!(json["time"], "21:30");
        assert!(json["triageAnswers"].get("pulse").is_none());
    }

    #[test]
    fn enumerations_parse_from_tags() {
        assert_eq!("Critical".parse::<Priority>(), Ok(Priority::Critical));
        assert_eq!("female".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!("walking".parse::<Question>(), Ok(Question::Walking));
        assert!("pulse".parse::<Question>().is_err());
        assert_eq!(Question::Bleeding.position(), 4);
    }
}
