use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{PatientRecord, Question, UnknownVariant};

const FILE_STEM: &str = "triage-patients";
const CSV_HEADER: [&str; 12] = [
    "ID",
    "Name",
    "Age",
    "Sex",
    "Date",
    "Time",
    "Priority",
    "Symptoms",
    "Breathing",
    "Conscious",
    "Walking",
    "Bleeding",
];
const TXT_RULE: &str = "-------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn filename(self, today: NaiveDate) -> String {
        format!("{FILE_STEM}-{}.{}", today.format("%Y-%m-%d"), self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Txt),
            _ => Err(UnknownVariant {
                kind: "export format",
                value: raw.to_string(),
            }),
        }
    }
}

/// Rendered export ready to be written to disk or streamed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode JSON export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV export was not valid UTF-8")]
    Encoding,
}

pub fn export(
    records: &[PatientRecord],
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let body = match format {
        ExportFormat::Json => to_json(records)?,
        ExportFormat::Csv => to_csv(records)?,
        ExportFormat::Txt => to_txt(records),
    };

    Ok(ExportArtifact {
        format,
        filename: format.filename(today),
        content_type: format.content_type(),
        body,
    })
}

pub fn to_json(records: &[PatientRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Name and symptoms are always quoted; every other column is a plain token.
pub fn to_csv(records: &[PatientRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        let answers = &record.triage_answers;
        writer.write_record([
            record.id.to_string(),
            quoted(&record.name),
            record.age.to_string(),
            record.sex.label().to_string(),
            record.date.format("%Y-%m-%d").to_string(),
            record.time.format("%H:%M").to_string(),
            record.priority.tag().to_string(),
            quoted(&record.symptoms),
            yes_no(answers.breathing).to_string(),
            yes_no(answers.conscious).to_string(),
            yes_no(answers.walking).to_string(),
            yes_no(answers.bleeding).to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(csv::Error::from(err.into_error())))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

pub fn to_txt(records: &[PatientRecord]) -> String {
    records
        .iter()
        .map(txt_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn txt_block(record: &PatientRecord) -> String {
    let mut block = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(block, "PATIENT #{}", record.id);
    let _ = writeln!(block, "Name: {}", record.name);
    let _ = writeln!(block, "Age: {}", record.age);
    let _ = writeln!(block, "Sex: {}", record.sex.label());
    let _ = writeln!(block, "Date: {}", record.date.format("%Y-%m-%d"));
    let _ = writeln!(block, "Time: {}", record.time.format("%H:%M"));
    let _ = writeln!(block, "Priority: {}", record.priority.label());
    let _ = writeln!(block, "Symptoms: {}", record.symptoms);
    block.push_str("Triage assessment:\n");
    for question in Question::ORDER {
        let _ = writeln!(
            block,
            "- {}: {}",
            question.report_label(),
            yes_no(record.triage_answers.get(question))
        );
    }
    block.push('\n');
    block.push_str(TXT_RULE);
    block.push('\n');
    block
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}
