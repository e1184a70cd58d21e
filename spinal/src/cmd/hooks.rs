use std::path::Path;

use anyhow::Result;
use tracing::{Level, info, instrument};

use crate::handlers::respond;
use crate::hooks::HookRequest;

/// Read one event from stdin and write its response to stdout.
#[instrument(level = Level::TRACE)]
pub fn run(event: Option<&str>, workspace: Option<&Path>) -> Result<()> {
    let request = HookRequest::from_stdin();
    info!(
        event = ?request.hook_event_name,
        forced = ?event,
        session = ?request.session_key(),
        "Hook invoked"
    );
    let output = respond(&request, event, workspace);
    output.write_stdout()
}
