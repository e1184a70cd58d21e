use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::{Level, instrument};

use crate::cli::CheckKind;
use crate::reflex::{Decision, ReflexCategory, ReflexEngine};
use crate::style;

impl CheckKind {
    pub fn category(self) -> ReflexCategory {
        match self {
            CheckKind::Read => ReflexCategory::Sensory,
            CheckKind::Write => ReflexCategory::Motor,
            CheckKind::Shell => ReflexCategory::Inhibition,
        }
    }
}

/// Evaluate one attempted action against the workspace's reflexes.
pub fn evaluate(
    engine: &ReflexEngine,
    kind: CheckKind,
    subject: &str,
    workspace_root: &Path,
) -> Decision {
    match kind {
        CheckKind::Read | CheckKind::Write => {
            engine.evaluate_path(kind.category(), subject, workspace_root)
        }
        CheckKind::Shell => engine.evaluate(kind.category(), subject),
    }
}

/// Explain whether a reflex would deny `subject`.
#[instrument(level = Level::TRACE)]
pub fn run(workspace: Option<&Path>, kind: CheckKind, subject: &str, json: bool) -> Result<()> {
    let ctx = super::workspace_context(workspace)?;
    let decision = evaluate(&ctx.reflex_engine(), kind, subject, &ctx.workspace_root);

    if json {
        let value = match &decision {
            Decision::Allow => json!({
                "subject": subject,
                "category": kind.category().to_string(),
                "verdict": "allow",
            }),
            Decision::Deny { category, pattern } => json!({
                "subject": subject,
                "category": category.to_string(),
                "verdict": "deny",
                "pattern": pattern,
                "reason": category.deny_reason(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match &decision {
        Decision::Allow => println!(
            "{} {} reflex: no pattern matches {}",
            style::verdict("allow"),
            kind.category(),
            style::bold(subject)
        ),
        Decision::Deny { category, pattern } => {
            println!(
                "{} {} reflex: {} matches {}",
                style::verdict("deny"),
                category,
                style::cyan(pattern),
                style::bold(subject)
            );
            println!("  {}", style::dim(category.deny_reason()));
        }
    }
    Ok(())
}
