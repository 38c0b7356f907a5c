use crate::lead::{run_lead_check, run_lead_send, LeadPayloadArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lead_gateway::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Intake Gateway",
    about = "Serve and exercise the concierge website's lead intake endpoints",
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
    /// Inspect or submit a lead payload from the command line
    Lead {
        #[command(subcommand)]
        command: LeadCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LeadCommand {
    /// Normalize and validate a payload without contacting the upstream
    Check(LeadPayloadArgs),
    /// Run a payload through the full gateway against the configured upstream
    Send(LeadPayloadArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Refuse to start when no lead endpoint is configured
    #[arg(long)]
    pub(crate) require_endpoint: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lead {
            command: LeadCommand::Check(args),
        } => run_lead_check(args),
        Command::Lead {
            command: LeadCommand::Send(args),
        } => run_lead_send(args).await,
    }
}
