use crate::infra::{open_desk, parse_yes_no, Desk};
use clap::Args;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use triage_desk::config::AppConfig;
use triage_desk::error::AppError;
use triage_desk::telemetry;
use triage_desk::workflows::triage::{
    explain, AnswerSet, AssessmentSession, Durability, ExportFormat, IntakeForm, PatientRecord,
    Priority, Question, RecordFilter, RecordId, RecordListing, Selection, Sex, TriageDeskError,
};

/// Answers supplied on the command line; anything omitted is unanswered.
#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct AnswerArgs {
    /// Is the patient breathing? (yes/no)
    #[arg(long, value_parser = parse_yes_no)]
    pub(crate) breathing: Option<bool>,
    /// Is the patient conscious? (yes/no)
    #[arg(long, value_parser = parse_yes_no)]
    pub(crate) conscious: Option<bool>,
    /// Can the patient walk? (yes/no)
    #[arg(long, value_parser = parse_yes_no)]
    pub(crate) walking: Option<bool>,
    /// Severe wounds, open fractures, or active bleeding? (yes/no)
    #[arg(long, value_parser = parse_yes_no)]
    pub(crate) bleeding: Option<bool>,
}

impl AnswerArgs {
    fn get(&self, question: Question) -> Option<bool> {
        match question {
            Question::Breathing => self.breathing,
            Question::Conscious => self.conscious,
            Question::Walking => self.walking,
            Question::Bleeding => self.bleeding,
        }
    }
}

impl From<AnswerArgs> for AnswerSet {
    fn from(args: AnswerArgs) -> Self {
        Self {
            breathing: args.breathing.into(),
            conscious: args.conscious.into(),
            walking: args.walking.into(),
            bleeding: args.bleeding.into(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Patient name
    #[arg(long)]
    pub(crate) name: String,
    /// Patient age in whole years
    #[arg(long)]
    pub(crate) age: String,
    /// Patient sex (male/female)
    #[arg(long, default_value = "male")]
    pub(crate) sex: Sex,
    /// Free-text description of the presenting symptoms
    #[arg(long, default_value = "")]
    pub(crate) symptoms: String,
    #[command(flatten)]
    pub(crate) answers: AnswerArgs,
    /// Do not prompt for answers missing from the command line
    #[arg(long)]
    pub(crate) no_prompt: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Case-insensitive text matched against name and symptoms
    #[arg(long, default_value = "")]
    pub(crate) search: String,
    /// Priority filter: all, critical, urgent, stable
    #[arg(long, default_value = "all")]
    pub(crate) priority: Selection<Priority>,
    /// Sex filter: all, male, female
    #[arg(long, default_value = "all")]
    pub(crate) sex: Selection<Sex>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Export format: json, csv, txt
    #[arg(long)]
    pub(crate) format: ExportFormat,
    /// Directory receiving the date-stamped export file
    #[arg(long, default_value = ".")]
    pub(crate) output: PathBuf,
    /// Print the export to stdout instead of writing a file
    #[arg(long)]
    pub(crate) stdout: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteArgs {
    /// Identifier of the record to delete
    pub(crate) id: u64,
}

#[derive(Args, Debug)]
pub(crate) struct ClearArgs {
    /// Confirm that every stored patient record should be deleted
    #[arg(long)]
    pub(crate) yes: bool,
}

pub(crate) fn run_priority(args: AnswerArgs) -> Result<(), AppError> {
    let answers = AnswerSet::from(args);
    match answers.complete() {
        Some(complete) => {
            let matched = explain(&complete);
            println!("Priority: {}", matched.priority.label());
            println!("Rule: {} ({})", matched.rule.key(), matched.rationale);
            println!("{}", matched.priority.description());
        }
        None => {
            let missing = answers
                .unanswered()
                .iter()
                .map(|question| question.key())
                .collect::<Vec<_>>();
            println!("Priority: incomplete (unanswered: {})", missing.join(", "));
        }
    }
    Ok(())
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let form = IntakeForm {
        name: args.name,
        age: args.age,
        sex: Some(args.sex),
        symptoms: args.symptoms,
    };
    let intake = form
        .validate()
        .map_err(|err| AppError::Input(err.to_string()))?;

    let desk = desk_from_env()?;
    let stdin = io::stdin();
    let session = walk_session(
        args.answers,
        !args.no_prompt,
        stdin.lock(),
        io::stdout().lock(),
    )?;

    if let Ok(priority) = session.preview_priority() {
        println!("\nTriage result: {}", priority.label());
        println!("{}", priority.description());
    }

    let record = desk.record_assessment(&intake, session)?;
    println!("\nSaved patient #{}", record.id);
    print_record(&record);
    warn_if_degraded(&desk);
    Ok(())
}

pub(crate) fn run_list(args: ListArgs) -> Result<(), AppError> {
    let desk = desk_from_env()?;
    let filter = RecordFilter {
        search: args.search,
        priority: args.priority,
        sex: args.sex,
    };
    let listing = desk.records(&filter);
    render_listing(&listing);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let desk = desk_from_env()?;
    let artifact = desk.export(args.format)?;

    if args.stdout {
        print!("{}", artifact.body);
        return Ok(());
    }

    fs::create_dir_all(&args.output)?;
    let path = args.output.join(&artifact.filename);
    fs::write(&path, artifact.body.as_bytes())?;
    println!("Exported patients to {}", path.display());
    Ok(())
}

pub(crate) fn run_delete(args: DeleteArgs) -> Result<(), AppError> {
    let desk = desk_from_env()?;
    let removed = desk.delete(RecordId(args.id))?;
    println!("Deleted patient #{} ({})", removed.id, removed.name);
    warn_if_degraded(&desk);
    Ok(())
}

pub(crate) fn run_clear(args: ClearArgs) -> Result<(), AppError> {
    let desk = desk_from_env()?;
    let removed = desk.clear(args.yes)?;
    println!("Deleted {removed} patient record(s)");
    warn_if_degraded(&desk);
    Ok(())
}

fn desk_from_env() -> Result<Desk, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(open_desk(&config.storage))
}

/// Walks the questionnaire in fixed order, taking answers from `answers` first and prompting on
/// `input` for the rest. Stops early (leaving the session incomplete) when prompting is disabled
/// or input ends.
pub(crate) fn walk_session<R: BufRead, W: Write>(
    answers: AnswerArgs,
    prompt: bool,
    mut input: R,
    mut output: W,
) -> Result<AssessmentSession, AppError> {
    let mut session = AssessmentSession::new();

    while let Some(question) = session.current_question() {
        let value = match answers.get(question) {
            Some(value) => value,
            None if prompt => match ask(question, &mut input, &mut output)? {
                Some(value) => value,
                None => break,
            },
            None => break,
        };

        session
            .answer(question, value)
            .map_err(TriageDeskError::Session)?;
    }

    Ok(session)
}

fn ask<R: BufRead, W: Write>(
    question: Question,
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<bool>> {
    loop {
        write!(
            output,
            "Question {} of {}: {} [yes/no] ",
            question.position(),
            Question::ORDER.len(),
            question.prompt()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match parse_yes_no(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(message) => writeln!(output, "{message}")?,
        }
    }
}

fn render_listing(listing: &RecordListing) {
    let tally = &listing.tally;
    println!(
        "Total patients: {} | Showing: {}",
        tally.total,
        listing.records.len()
    );
    println!(
        "Critical: {}  Urgent: {}  Stable: {}",
        tally.critical, tally.urgent, tally.stable
    );

    if listing.records.is_empty() {
        println!("\nNo patients found matching the filters");
        return;
    }

    println!();
    for record in &listing.records {
        println!(
            "#{} | {} | {} years, {} | {} {} | {} | {}",
            record.id,
            record.name,
            record.age,
            record.sex.label(),
            record.date,
            record.time.format("%H:%M"),
            record.priority.label(),
            record.symptoms
        );
    }
}

fn print_record(record: &PatientRecord) {
    println!("Name: {}", record.name);
    println!("Age: {}", record.age);
    println!("Sex: {}", record.sex.label());
    println!("Date: {} {}", record.date, record.time.format("%H:%M"));
    println!("Priority: {}", record.priority.label());
}

fn warn_if_degraded(desk: &Desk) {
    if desk.durability() == Durability::Degraded {
        eprintln!("warning: changes could not be written to storage and are held in memory only");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn walk_session_prefers_flags_and_prompts_for_the_rest() {
        let answers = AnswerArgs {
            breathing: Some(true),
            walking: Some(false),
            ..AnswerArgs::default()
        };
        let input = Cursor::new("maybe\nyes\nno\n");
        let mut output = Vec::new();

        let session = walk_session(answers, true, input, &mut output).expect("walk succeeds");

        assert!(session.is_complete());
        assert_eq!(session.preview_priority(), Ok(Priority::Urgent));
        let transcript = String::from_utf8(output).expect("utf8 output");
        assert!(transcript.contains("Question 2 of 4: Is the patient conscious?"));
        assert!(transcript.contains("expected yes or no"));
        assert!(!transcript.contains("Can the patient walk?"));
    }

    #[test]
    fn walk_session_stops_without_prompting() {
        let answers = AnswerArgs {
            breathing: Some(true),
            ..AnswerArgs::default()
        };

        let session = walk_session(answers, false, Cursor::new(""), Vec::new())
            .expect("walk succeeds");

        assert_eq!(session.current_question(), Some(Question::Conscious));
        assert!(session.preview_priority().is_err());
    }

    #[test]
    fn walk_session_leaves_session_open_when_input_ends() {
        let mut output = Vec::new();

        let session = walk_session(
            AnswerArgs::default(),
            true,
            Cursor::new("yes\nperhaps\n"),
            &mut output,
        )
        .expect("walk succeeds");

        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.current_question(), Some(Question::Conscious));
    }
}
