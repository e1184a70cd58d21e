//! User-facing error display for the interactive commands.
//!
//! Hook invocations never reach this: they fail open inside
//! [`crate::handlers::respond`].

use std::io::Write;

use brain_config::BrainError;

use crate::style;

/// Print an error and its cause chain to stderr.
///
/// ```text
/// error: top-level message
///   caused by: chain item
///
///   hint: actionable suggestion (if available)
/// ```
///
/// Without `verbose`, a deeper chain ends with a pointer to `--verbose`;
/// with it, the full Debug representation follows.
pub fn display_error(err: &anyhow::Error, verbose: bool) {
    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(stderr, "{}: {}", style::err_red_bold("error"), err);

    let chain: Vec<_> = err.chain().skip(1).collect();
    if chain.len() == 1 {
        let _ = writeln!(
            stderr,
            "  {}",
            style::err_dim(&format!("caused by: {}", chain[0]))
        );
    } else {
        for (i, cause) in chain.iter().enumerate() {
            let _ = writeln!(
                stderr,
                "  {}",
                style::err_dim(&format!("{}: {}", i + 1, cause))
            );
        }
    }

    if let Some(hint) = hint_for(err) {
        let _ = writeln!(stderr, "\n  {}: {}", style::err_cyan_bold("hint"), hint);
    }

    if verbose {
        let _ = writeln!(stderr, "\nFull error chain:\n{:?}", err);
    } else if !chain.is_empty() {
        let _ = writeln!(
            stderr,
            "\n  {}",
            style::err_dim("run with --verbose for full details")
        );
    }
}

/// The help text of the first brain error in the chain.
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BrainError>())
        .and_then(BrainError::help)
}
