use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use spinal::cli::{Cli, Commands};
use spinal::cmd;
use spinal::errors::display_error;
use spinal::hooks::exit_code;
use spinal::tracing_init::init_tracing;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!(args = ?std::env::args().collect::<Vec<_>>(), "spinal started");

    let workspace = cli.workspace.as_deref();
    let result: Result<()> = match &cli.command {
        Commands::Hook { event } => {
            // The host must always get a response and exit 0.
            if let Err(e) = cmd::hooks::run(event.as_deref(), workspace) {
                error!(error = ?e, "Failed to write hook response");
            }
            std::process::exit(exit_code::SUCCESS);
        }
        Commands::Pulse { json } => cmd::pulse::run(workspace, *json),
        Commands::Check {
            kind,
            subject,
            json,
        } => cmd::check::run(workspace, *kind, &subject.join(" "), *json),
    };

    if let Err(e) = result {
        error!(error = ?e, "Command failed");
        display_error(&e, cli.verbose);
        std::process::exit(1);
    }
}
