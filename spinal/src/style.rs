//! TTY-aware styling for the interactive commands.
//!
//! Built on [`console`], which detects whether the stream is a terminal and
//! respects `NO_COLOR`.

use console::{Emoji, Style};

fn out() -> Style {
    Style::new()
}

fn err() -> Style {
    Style::new().for_stderr()
}

/// Bold text (for headers/titles).
pub fn bold(text: &str) -> String {
    out().bold().apply_to(text).to_string()
}

/// Dim / muted text (for secondary information).
pub fn dim(text: &str) -> String {
    out().dim().apply_to(text).to_string()
}

/// Bold cyan section headers.
pub fn header(text: &str) -> String {
    out().cyan().bold().apply_to(text).to_string()
}

pub fn green(text: &str) -> String {
    out().green().apply_to(text).to_string()
}

pub fn red(text: &str) -> String {
    out().red().apply_to(text).to_string()
}

pub fn yellow(text: &str) -> String {
    out().yellow().apply_to(text).to_string()
}

/// Cyan (for labels).
pub fn cyan(text: &str) -> String {
    out().cyan().apply_to(text).to_string()
}

pub fn err_red_bold(text: &str) -> String {
    err().red().bold().apply_to(text).to_string()
}

pub fn err_dim(text: &str) -> String {
    err().dim().apply_to(text).to_string()
}

/// Bold cyan on stderr (hints).
pub fn err_cyan_bold(text: &str) -> String {
    err().cyan().bold().apply_to(text).to_string()
}

/// Colorize a reflex verdict (allow/deny).
pub fn verdict(verdict: &str) -> String {
    match verdict {
        "allow" => green(verdict),
        "deny" => red(verdict),
        _ => verdict.to_string(),
    }
}

static PULSE: Emoji<'_, '_> = Emoji("⚕ ", "+ ");

/// One-line banner for `spinal pulse`.
pub fn banner() -> String {
    let s = out();
    let mark = s.clone().red().bold().apply_to(PULSE);
    let title = s.clone().white().bold().apply_to("spinal");
    let tagline = s.dim().apply_to("· reflex hooks for the _brain");
    format!("{mark}{title} {tagline}")
}
