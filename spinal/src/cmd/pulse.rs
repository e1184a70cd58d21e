use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{Level, instrument};

use crate::pulse::Pulse;
use crate::style;

#[derive(Debug, Serialize)]
struct PulseReport<'a> {
    homeostasis_path: String,
    homeostasis_hash: &'a str,
    vitals_path: String,
    #[serde(flatten)]
    pulse: &'a Pulse,
}

/// Print the brain's pulse for a workspace.
#[instrument(level = Level::TRACE)]
pub fn run(workspace: Option<&Path>, json: bool) -> Result<()> {
    let ctx = super::workspace_context(workspace)?;
    let snapshot = ctx.loader.load();
    let pulse = ctx.pulse(&snapshot);
    let report = PulseReport {
        homeostasis_path: ctx.loader.homeostasis_path().display().to_string(),
        homeostasis_hash: &snapshot.homeostasis.hash,
        vitals_path: ctx.loader.vitals_path().display().to_string(),
        pulse: &pulse,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render(&report));
    }
    Ok(())
}

fn render(report: &PulseReport<'_>) -> String {
    let pulse = report.pulse;
    let mut lines = vec![style::banner(), String::new()];

    lines.push(style::header("Brain"));
    lines.push(format!("  {:<13} {}", style::cyan("workspace:"), pulse.workspace_root));
    lines.push(format!("  {:<13} {}", style::cyan("homeostasis:"), report.homeostasis_path));
    lines.push(format!("  {:<13} {}", style::cyan("vitals:"), report.vitals_path));
    lines.push(format!(
        "  {:<13} {}",
        style::cyan("hash:"),
        style::dim(&report.homeostasis_hash[..report.homeostasis_hash.len().min(12)])
    ));
    lines.push(String::new());

    lines.push(style::header("Pulse"));
    lines.push(format!("  {}", pulse.one_line));
    lines.push(String::new());

    lines.push(style::header("Alerts"));
    if pulse.alerts.is_empty() {
        lines.push(format!("  {}", style::green("none")));
    } else {
        lines.extend(pulse.alerts.iter().map(|a| format!("  {} {}", style::yellow("!"), a)));
    }

    if !pulse.missing_core_files.is_empty() {
        lines.push(String::new());
        lines.push(style::header("Missing core files"));
        lines.extend(
            pulse
                .missing_core_files
                .iter()
                .map(|f| format!("  {}", style::dim(f))),
        );
    }
    lines.join("\n")
}
