use crate::render::{run_inspect, run_render, InspectArgs, RenderArgs, RenderKind};
use crate::server;
use clap::{Args, Parser, Subcommand};
use feedback_reports::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Feedback Reports",
    about = "Render competency feedback reports as PDF documents and archives",
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
    /// Render an evaluation result file into a downloadable artifact
    Render {
        #[command(subcommand)]
        command: RenderCommand,
    },
    /// Print the students of an evaluation result as a listing
    Inspect(InspectArgs),
}

#[derive(Subcommand, Debug)]
enum RenderCommand {
    /// One PDF covering every student
    Aggregate(RenderArgs),
    /// One PDF per student, bundled into a ZIP archive
    PerStudent(RenderArgs),
    /// The raw result as pretty-printed JSON
    Json(RenderArgs),
    /// The raw result as CSV, one row per student
    Csv(RenderArgs),
}

impl RenderCommand {
    fn split(self) -> (RenderKind, RenderArgs) {
        match self {
            RenderCommand::Aggregate(args) => (RenderKind::Aggregate, args),
            RenderCommand::PerStudent(args) => (RenderKind::PerStudent, args),
            RenderCommand::Json(args) => (RenderKind::Json, args),
            RenderCommand::Csv(args) => (RenderKind::Csv, args),
        }
    }
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
        Command::Render { command } => {
            let (kind, args) = command.split();
            run_render(kind, args).await
        }
        Command::Inspect(args) => run_inspect(args),
    }
}
