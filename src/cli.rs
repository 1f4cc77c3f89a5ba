use crate::commands::{
    run_assess, run_clear, run_delete, run_export, run_list, run_priority, AnswerArgs, AssessArgs,
    ClearArgs, DeleteArgs, ExportArgs, ListArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use triage_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Triage Desk",
    about = "Assess incoming patients, assign a priority, and manage the patient log",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute the priority for a set of answers without saving anything
    Priority(AnswerArgs),
    /// Record a new patient, prompting for any triage answers not given as flags
    Assess(AssessArgs),
    /// Inspect, export, or delete stored patient records
    Records {
        #[command(subcommand)]
        command: RecordsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RecordsCommand {
    /// List records, newest first, with optional filters
    List(ListArgs),
    /// Export every stored record as JSON, CSV, or plain text
    Export(ExportArgs),
    /// Delete a single record by identifier
    Delete(DeleteArgs),
    /// Delete every stored record
    Clear(ClearArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Priority(args) => run_priority(args),
        Command::Assess(args) => run_assess(args),
        Command::Records { command } => match command {
            RecordsCommand::List(args) => run_list(args),
            RecordsCommand::Export(args) => run_export(args),
            RecordsCommand::Delete(args) => run_delete(args),
            RecordsCommand::Clear(args) => run_clear(args),
        },
    }
}
