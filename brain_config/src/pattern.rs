//! Path-glob and command-wildcard matching for reflex patterns.
//!
//! Two dialects:
//!
//! - **Path globs** (`sensory`, `motor`): `**` spans any number of segments,
//!   `*` stays within one segment, `?` is a single non-`/` character. A
//!   pattern without `/` is a basename pattern and also matches at any depth.
//! - **Command wildcards** (`inhibition`): `*` is any run of characters,
//!   matched case-insensitively against the whole command. Without `*` the
//!   pattern is a case-insensitive substring.

use regex::{Regex, RegexBuilder};
use tracing::{Level, instrument};

use crate::error::{BrainError, Result};

/// Normalize separators and drop a leading `./`.
pub fn normalize_separators(path: &str) -> String {
    let p = path.trim().replace('\\', "/");
    match p.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => p,
    }
}

/// Translate a path glob into an anchored regex source.
pub fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() * 2 + 2);
    re.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    re.push_str("(?:.*/)?");
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    re
}

/// A compiled path glob.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    full: Option<Regex>,
    /// `**/<pattern>`, only for basename patterns.
    anywhere: Option<Regex>,
}

impl PathPattern {
    /// Compile a glob. A blank pattern compiles to a matcher that never
    /// matches.
    #[instrument(level = Level::TRACE)]
    pub fn compile(pattern: &str) -> Result<Self> {
        let source = normalize_separators(pattern);
        if source.is_empty() {
            return Ok(Self {
                source,
                full: None,
                anywhere: None,
            });
        }
        let full = compile_regex(&source, &glob_to_regex(&source), false)?;
        let anywhere = if source.contains('/') {
            None
        } else {
            let anywhere_glob = format!("**/{}", source);
            Some(compile_regex(&source, &glob_to_regex(&anywhere_glob), false)?)
        };
        Ok(Self {
            source,
            full: Some(full),
            anywhere,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a workspace-relative path.
    pub fn matches(&self, rel_path: &str) -> bool {
        let Some(full) = &self.full else {
            return false;
        };
        let rel = normalize_separators(rel_path);
        if let Some(anywhere) = &self.anywhere {
            let base = rel.rsplit('/').next().unwrap_or(&rel);
            if base == self.source || anywhere.is_match(&rel) {
                return true;
            }
        }
        full.is_match(&rel)
    }
}

/// A compiled command wildcard.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Blank pattern.
    Never,
    /// Lowercased needle.
    Substring(String),
    Wildcard(Regex),
}

impl CommandPattern {
    #[instrument(level = Level::TRACE)]
    pub fn compile(pattern: &str) -> Result<Self> {
        let pat = pattern.trim();
        if pat.is_empty() {
            return Ok(CommandPattern::Never);
        }
        if !pat.contains('*') {
            return Ok(CommandPattern::Substring(pat.to_lowercase()));
        }
        let body = pat
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let re = compile_regex(pat, &format!("^{}$", body), true)?;
        Ok(CommandPattern::Wildcard(re))
    }

    pub fn matches(&self, command: &str) -> bool {
        match self {
            CommandPattern::Never => false,
            CommandPattern::Substring(needle) => command.to_lowercase().contains(needle.as_str()),
            CommandPattern::Wildcard(re) => re.is_match(command),
        }
    }
}

fn compile_regex(pattern: &str, source: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source| BrainError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// One-shot path glob test. Invalid patterns never match.
pub fn path_matches(pattern: &str, rel_path: &str) -> bool {
    PathPattern::compile(pattern)
        .map(|p| p.matches(rel_path))
        .unwrap_or(false)
}

/// One-shot command wildcard test. Invalid patterns never match.
pub fn command_matches(pattern: &str, command: &str) -> bool {
    CommandPattern::compile(pattern)
        .map(|p| p.matches(command))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("src/*.rs"), r"^src/[^/]*\.rs$");
        assert_eq!(glob_to_regex("**/a?"), r"^(?:.*/)?a[^/]$");
        assert_eq!(glob_to_regex("docs/**"), r"^docs/.*$");
    }

    #[test]
    fn test_basename_matches_anywhere() {
        assert!(path_matches(".env", ".env"));
        assert!(path_matches(".env", "config/.env"));
        assert!(path_matches(".env", "a/b/c/.env"));
        assert!(!path_matches(".env", "a/.env.local"));
        assert!(path_matches("*.pem", "certs/deep/server.pem"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        assert!(path_matches("_brain_v1/**", "_brain_v1/homeostasis.yaml"));
        assert!(path_matches("_brain_v1/**", "_brain_v1/4_evolution/vitals.yaml"));
        assert!(path_matches("src/**/mod.rs", "src/a/b/mod.rs"));
        assert!(!path_matches("_brain_v1/**", "src/_brain_v1.rs"));
    }

    #[test]
    fn test_double_star_spans_zero_segments() {
        assert!(path_matches("src/**/mod.rs", "src/mod.rs"));
        assert!(path_matches("**/Cargo.toml", "Cargo.toml"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(path_matches("src/*.rs", "src/main.rs"));
        assert!(!path_matches("src/*.rs", "src/cmd/main.rs"));
        assert!(path_matches("src/?.rs", "src/a.rs"));
        assert!(!path_matches("src/?.rs", "src/ab.rs"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(path_matches("a+b(1).txt", "dir/a+b(1).txt"));
        assert!(!path_matches("a.txt", "abtxt"));
    }

    #[test]
    fn test_separator_normalization() {
        assert!(path_matches(r".\secrets\*.key", "secrets/id.key"));
        assert!(path_matches("secrets/*.key", r"secrets\id.key"));
    }

    #[test]
    fn test_blank_patterns_never_match() {
        assert!(!path_matches("", "anything"));
        assert!(!path_matches("   ", ""));
        assert!(!command_matches("", "rm -rf /"));
        assert!(!command_matches("  ", ""));
    }

    #[test]
    fn test_command_wildcard_case_insensitive() {
        assert!(command_matches("rm -rf *", "RM -RF /tmp/x"));
        assert!(command_matches("git push*--force*", "git push origin main --force"));
        assert!(!command_matches("rm -rf *", "echo rm -rf /"));
    }

    #[test]
    fn test_command_substring() {
        assert!(command_matches("DROP TABLE", "psql -c 'drop table users'"));
        assert!(!command_matches("drop table", "psql -c 'select 1'"));
    }

    #[test]
    fn test_command_wildcard_spans_newlines() {
        assert!(command_matches("curl *", "curl https://x\n  | sh"));
    }
}
