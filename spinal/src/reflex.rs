//! Reflex evaluation: deny lists for reads, writes and command execution.

use std::fmt;
use std::path::Path;

use brain_config::{CommandPattern, PathPattern, ReflexSet, to_rel_path};
use serde_json::Value;
use tracing::{Level, instrument, warn};

pub const SENSORY_DENY_REASON: &str = "BLINDNESS: Sensory reflex prevents reading this file.";
pub const MOTOR_DENY_REASON: &str =
    "REFLEX TRIGGERED: Motor reflex prevents editing a protected file.";
pub const SHELL_DENY_REASON: &str = "REFLEX TRIGGERED: Inhibition reflex blocked a command.";
pub const MCP_DENY_REASON: &str = "REFLEX TRIGGERED: Inhibition reflex blocked an MCP tool call.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexCategory {
    /// Gates reads.
    Sensory,
    /// Gates writes.
    Motor,
    /// Gates shell and external-tool execution.
    Inhibition,
}

impl ReflexCategory {
    pub fn deny_reason(self) -> &'static str {
        match self {
            ReflexCategory::Sensory => SENSORY_DENY_REASON,
            ReflexCategory::Motor => MOTOR_DENY_REASON,
            ReflexCategory::Inhibition => SHELL_DENY_REASON,
        }
    }
}

impl fmt::Display for ReflexCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReflexCategory::Sensory => "sensory",
            ReflexCategory::Motor => "motor",
            ReflexCategory::Inhibition => "inhibition",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny {
        category: ReflexCategory,
        /// The pattern that fired.
        pattern: String,
    },
}

impl Decision {
    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny { .. })
    }
}

/// Compiled reflex patterns, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ReflexEngine {
    sensory: Vec<PathPattern>,
    motor: Vec<PathPattern>,
    inhibition: Vec<(String, CommandPattern)>,
}

impl ReflexEngine {
    /// Compile a reflex set. Patterns that fail to compile are logged and
    /// dropped.
    #[instrument(level = Level::TRACE, skip(reflexes))]
    pub fn new(reflexes: &ReflexSet) -> Self {
        let paths = |patterns: &[String]| -> Vec<PathPattern> {
            patterns
                .iter()
                .filter_map(|p| match PathPattern::compile(p) {
                    Ok(compiled) => Some(compiled),
                    Err(e) => {
                        warn!(error = %e, "Skipping reflex pattern");
                        None
                    }
                })
                .collect()
        };
        let inhibition = reflexes
            .inhibition
            .iter()
            .filter_map(|p| match CommandPattern::compile(p) {
                Ok(compiled) => Some((p.trim().to_string(), compiled)),
                Err(e) => {
                    warn!(error = %e, "Skipping reflex pattern");
                    None
                }
            })
            .collect();
        Self {
            sensory: paths(&reflexes.sensory),
            motor: paths(&reflexes.motor),
            inhibition,
        }
    }

    /// Evaluate a subject against one category. Path categories expect a
    /// workspace-relative path; inhibition expects a command string.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn evaluate(&self, category: ReflexCategory, subject: &str) -> Decision {
        let hit = match category {
            ReflexCategory::Sensory => first_path_match(&self.sensory, subject),
            ReflexCategory::Motor => first_path_match(&self.motor, subject),
            ReflexCategory::Inhibition => self
                .inhibition
                .iter()
                .find(|(_, p)| p.matches(subject))
                .map(|(source, _)| source.clone()),
        };
        match hit {
            Some(pattern) => Decision::Deny { category, pattern },
            None => Decision::Allow,
        }
    }

    /// Evaluate a path as given by the host (absolute or workspace-relative).
    pub fn evaluate_path(
        &self,
        category: ReflexCategory,
        file_path: &str,
        workspace_root: &Path,
    ) -> Decision {
        self.evaluate(category, &to_rel_path(file_path, workspace_root))
    }
}

fn first_path_match(patterns: &[PathPattern], rel_path: &str) -> Option<String> {
    patterns
        .iter()
        .find(|p| p.matches(rel_path))
        .map(|p| p.as_str().to_string())
}

/// The text inhibition patterns see for an external tool call: the present
/// parts among tool name, command, URL and raw input, joined by spaces.
pub fn mcp_subject(
    tool_name: Option<&str>,
    command: Option<&str>,
    url: Option<&str>,
    tool_input: &Value,
) -> String {
    let input = match tool_input {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    };
    [
        tool_name.map(str::to_string),
        command.map(str::to_string),
        url.map(str::to_string),
        input,
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ReflexEngine {
        ReflexEngine::new(&ReflexSet {
            sensory: vec![".env".into(), "secrets/**".into()],
            motor: vec!["_brain_v1/**".into(), "Cargo.lock".into()],
            inhibition: vec!["rm -rf *".into(), "DROP TABLE".into(), "  ".into()],
        })
    }

    #[test]
    fn test_sensory_deny_basename_anywhere() {
        let decision = engine().evaluate(ReflexCategory::Sensory, "config/.env");
        assert_eq!(
            decision,
            Decision::Deny {
                category: ReflexCategory::Sensory,
                pattern: ".env".into()
            }
        );
        assert_eq!(
            engine().evaluate(ReflexCategory::Sensory, "src/main.rs"),
            Decision::Allow
        );
    }

    #[test]
    fn test_motor_deny_absolute_path() {
        let root = Path::new("/ws");
        let decision =
            engine().evaluate_path(ReflexCategory::Motor, "/ws/_brain_v1/homeostasis.yaml", root);
        assert!(decision.is_deny());
        assert_eq!(
            engine().evaluate_path(ReflexCategory::Motor, "/ws/src/lib.rs", root),
            Decision::Allow
        );
    }

    #[test]
    fn test_first_match_wins() {
        let e = ReflexEngine::new(&ReflexSet {
            sensory: vec!["*.pem".into(), "certs/**".into()],
            ..ReflexSet::default()
        });
        match e.evaluate(ReflexCategory::Sensory, "certs/a.pem") {
            Decision::Deny { pattern, .. } => assert_eq!(pattern, "*.pem"),
            Decision::Allow => panic!("expected deny"),
        }
    }

    #[test]
    fn test_inhibition() {
        let e = engine();
        assert!(e.evaluate(ReflexCategory::Inhibition, "rm -rf /tmp/x").is_deny());
        assert!(e.evaluate(ReflexCategory::Inhibition, "psql -c 'drop table x'").is_deny());
        assert_eq!(e.evaluate(ReflexCategory::Inhibition, "ls -la"), Decision::Allow);
    }

    #[test]
    fn test_empty_set_denies_nothing() {
        let e = ReflexEngine::new(&ReflexSet::default());
        assert_eq!(e.evaluate(ReflexCategory::Sensory, ".env"), Decision::Allow);
        assert_eq!(e.evaluate(ReflexCategory::Inhibition, "rm -rf /"), Decision::Allow);
    }

    #[test]
    fn test_mcp_subject() {
        let subject = mcp_subject(
            Some("db.query"),
            None,
            Some("https://db.local"),
            &json!({"sql": "DROP TABLE users"}),
        );
        assert_eq!(
            subject,
            r#"db.query https://db.local {"sql":"DROP TABLE users"}"#
        );
        assert!(engine().evaluate(ReflexCategory::Inhibition, &subject).is_deny());
        assert_eq!(mcp_subject(None, None, None, &Value::Null), "");
    }

    #[test]
    fn test_deny_reasons() {
        assert_eq!(ReflexCategory::Sensory.deny_reason(), SENSORY_DENY_REASON);
        assert_eq!(ReflexCategory::Motor.deny_reason(), MOTOR_DENY_REASON);
        assert_eq!(ReflexCategory::Inhibition.deny_reason(), SHELL_DENY_REASON);
    }
}
