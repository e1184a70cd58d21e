use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::version::version_long;

#[derive(Parser, Debug)]
#[command(name = "spinal")]
#[command(version = version_long())]
#[command(about = "Reflex-policy hooks for coding agents")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace root (default: from the hook input, else the current directory)
    #[arg(short = 'C', long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one hook event: JSON in on stdin, JSON out on stdout
    ///
    /// Always exits 0. Any internal failure yields the event's fail-open
    /// response.
    Hook {
        /// Event name, overriding `hook_event_name` in the input
        event: Option<String>,
    },

    /// Show the brain's pulse: mindset, vitals, and alerts
    Pulse {
        /// Output as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Explain whether a reflex would deny a read, write, or command
    Check {
        /// What is being attempted
        kind: CheckKind,
        /// File path or command (remaining args joined)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        subject: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CheckKind {
    Read,
    Write,
    Shell,
}
