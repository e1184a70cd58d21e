//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};

use crate::handlers::HookContext;

pub mod check;
pub mod hooks;
pub mod pulse;

/// Context for an interactive command: the `--workspace` root, else the
/// current directory.
pub fn workspace_context(workspace: Option<&Path>) -> Result<HookContext> {
    let root = match workspace {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    Ok(HookContext::for_workspace(root))
}
