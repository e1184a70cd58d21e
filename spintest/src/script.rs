//! Test script parsing for spintest.
//!
//! A script describes a workspace (brain documents, bootstrap files, seeded
//! session state, settings) and an ordered list of steps. Each step is a hook
//! event piped to `spinal hook`, a `spinal` CLI command, or a shell command,
//! followed by assertions on the result.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// A complete end-to-end scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct TestScript {
    pub meta: Meta,

    /// The workspace the steps run against.
    #[serde(default)]
    pub workspace: WorkspaceSpec,

    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: String,

    #[serde(default)]
    #[allow(dead_code)]
    pub description: Option<String>,
}

/// Files to materialize before the first step.
///
/// Text values may use `{{days_ago:N}}`, which renders as an RFC 3339
/// timestamp N days before the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceSpec {
    /// Brain directory relative to the workspace root.
    #[serde(default = "WorkspaceSpec::default_brain_root")]
    pub brain_root: String,

    /// Content of `<brain_root>/homeostasis.yaml`.
    #[serde(default)]
    pub homeostasis: Option<String>,

    /// Content of `<brain_root>/4_evolution/vitals.yaml`.
    #[serde(default)]
    pub vitals: Option<String>,

    /// Create every missing bootstrap core file with placeholder content.
    #[serde(default)]
    pub bootstrap: bool,

    /// Extra files, keyed by workspace-relative path.
    #[serde(default)]
    pub files: BTreeMap<String, String>,

    /// Pre-seeded `.cursor/synaptic_state.json`.
    #[serde(default)]
    pub state: Option<serde_json::Value>,

    /// `.cursor/spinal.json` settings overrides.
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

impl WorkspaceSpec {
    fn default_brain_root() -> String {
        "_brain_v1".into()
    }
}

/// A single step. Exactly one of `event`, `command`, `shell` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub name: String,

    /// Hook event name sent as `hook_event_name`.
    #[serde(default)]
    pub event: Option<String>,

    /// Pass the event as the `spinal hook <event>` argument instead of in
    /// the payload.
    #[serde(default)]
    pub forced: bool,

    /// Conversation id for hook steps. Omitted when null.
    #[serde(default = "Step::default_conversation")]
    pub conversation_id: Option<String>,

    /// Extra payload fields merged into the hook input. String values may
    /// use `{{workspace}}` for the workspace root.
    #[serde(default)]
    pub input: Option<serde_json::Value>,

    /// Raw stdin, sent verbatim instead of a generated payload.
    #[serde(default)]
    pub stdin: Option<String>,

    /// `spinal` CLI arguments, e.g. `pulse --json`.
    #[serde(default)]
    pub command: Option<String>,

    /// Shell command run in the workspace root.
    #[serde(default)]
    pub shell: Option<String>,

    #[serde(default)]
    pub expect: Expectation,
}

/// What a step executes, borrowed from the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    /// A hook payload piped to `spinal hook`.
    Hook,
    /// `spinal <args>`.
    Command(&'a str),
    /// `sh -c <script>` in the workspace.
    Shell(&'a str),
}

impl Step {
    fn default_conversation() -> Option<String> {
        Some("spintest-conversation".into())
    }

    /// The step's action. Assumes [`TestScript::validate`] passed.
    pub fn kind(&self) -> StepKind<'_> {
        match (self.command.as_deref(), self.shell.as_deref()) {
            (Some(cmd), _) => StepKind::Command(cmd),
            (None, Some(shell)) => StepKind::Shell(shell),
            (None, None) => StepKind::Hook,
        }
    }
}

/// Expected outcome of a step. Unset fields are not checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expectation {
    /// Expected exit code (hook steps default to 0).
    #[serde(default)]
    pub exit_code: Option<i32>,

    /// Expected `permission` field: "allow" or "deny".
    #[serde(default)]
    pub permission: Option<String>,

    /// Expected `decision` field: "allow" or "deny".
    #[serde(default)]
    pub decision: Option<String>,

    /// Expected `continue` field.
    #[serde(rename = "continue", default)]
    pub should_continue: Option<bool>,

    /// The output must be exactly `{}`.
    #[serde(default)]
    pub empty: Option<bool>,

    #[serde(default)]
    pub reason_contains: Option<String>,

    #[serde(default)]
    pub user_message_contains: Option<String>,

    /// `user_message` must be absent.
    #[serde(default)]
    pub no_user_message: Option<bool>,

    #[serde(default)]
    pub agent_message_contains: Option<String>,

    #[serde(default)]
    pub context_contains: Option<String>,

    /// `additional_context` must be absent.
    #[serde(default)]
    pub no_context: Option<bool>,

    /// Keys that must be present in `env`.
    #[serde(default)]
    pub env_keys: Vec<String>,

    /// Workspace-relative paths that must exist after the step.
    #[serde(default)]
    pub files_exist: Vec<String>,

    /// Workspace-relative path and substring it must contain.
    #[serde(default)]
    pub file_contains: BTreeMap<String, String>,

    #[serde(default)]
    pub stdout_contains: Option<String>,

    #[serde(default)]
    pub stderr_contains: Option<String>,
}

impl TestScript {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Structural problems that make a step unrunnable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            let kinds = [
                step.event.is_some() || step.stdin.is_some(),
                step.command.is_some(),
                step.shell.is_some(),
            ]
            .iter()
            .filter(|k| **k)
            .count();
            if kinds != 1 {
                errors.push(format!(
                    "step {} ({}): set exactly one of event/stdin, command, shell",
                    i + 1,
                    step.name
                ));
            }
            if step.forced && step.event.is_none() {
                errors.push(format!(
                    "step {} ({}): forced requires event",
                    i + 1,
                    step.name
                ));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let yaml = r#"
meta:
  name: read gating
  description: sensory reflex denies reads

workspace:
  homeostasis: |
    REFLEXES:
      sensory:
        - ".env"
  bootstrap: true
  files:
    config/.env: "SECRET=1"

steps:
  - name: read .env denied
    event: beforeReadFile
    input:
      file_path: config/.env
    expect:
      permission: deny
      user_message_contains: BLINDNESS

  - name: pulse
    command: pulse --json
    expect:
      stdout_contains: '"alerts"'
"#;

        let script = TestScript::from_str(yaml).unwrap();
        assert_eq!(script.meta.name, "read gating");
        assert_eq!(script.workspace.brain_root, "_brain_v1");
        assert!(script.workspace.bootstrap);
        assert_eq!(script.workspace.files["config/.env"], "SECRET=1");
        assert_eq!(script.steps.len(), 2);
        assert_eq!(script.steps[0].expect.permission.as_deref(), Some("deny"));
        assert_eq!(
            script.steps[0].conversation_id.as_deref(),
            Some("spintest-conversation")
        );
        assert!(script.validate().is_empty());
        assert_eq!(script.steps[0].kind(), StepKind::Hook);
        assert_eq!(script.steps[1].kind(), StepKind::Command("pulse --json"));
    }

    #[test]
    fn test_null_conversation_and_continue_key() {
        let yaml = r#"
meta:
  name: no session
steps:
  - name: start
    event: sessionStart
    conversation_id: null
    expect:
      continue: true
"#;
        let script = TestScript::from_str(yaml).unwrap();
        assert_eq!(script.steps[0].conversation_id, None);
        assert_eq!(script.steps[0].expect.should_continue, Some(true));
    }

    #[test]
    fn test_validate_rejects_ambiguous_steps() {
        let yaml = r#"
meta:
  name: bad
steps:
  - name: both
    event: preCompact
    shell: "true"
  - name: neither
  - name: forced without event
    forced: true
    command: pulse
"#;
        let script = TestScript::from_str(yaml).unwrap();
        assert_eq!(script.validate().len(), 3);
    }
}
