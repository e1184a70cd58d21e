//! Wire types for the agent hook protocol.
//!
//! The host writes one JSON object to stdin per event and reads one JSON
//! object back from stdout. Input is parsed leniently: a missing field, a
//! field of the wrong type, or unparsable stdin all degrade to "absent"
//! rather than an error.

use std::io::{Read, Write};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys a write tool may use for its target path, in lookup order.
const TOOL_PATH_KEYS: &[&str] = &[
    "file_path",
    "filePath",
    "path",
    "target_file",
    "targetFile",
    "filename",
];

/// The hook input received from the host via stdin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hook_event_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub workspace_roots: Vec<String>,
    /// Every other field, for event-specific extraction.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HookRequest {
    /// Parse from any reader. Unreadable or non-object input yields an empty
    /// request.
    pub fn from_reader(mut reader: impl Read) -> Self {
        let mut raw = String::new();
        if reader.read_to_string(&mut raw).is_err() {
            return Self::default();
        }
        Self::from_str_lenient(&raw)
    }

    pub fn from_stdin() -> Self {
        Self::from_reader(std::io::stdin().lock())
    }

    pub fn from_str_lenient(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Session key: `conversation_id`, falling back to `session_id`.
    pub fn session_key(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .or(self.session_id.as_deref())
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A non-empty string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Decode the event this request carries. `forced` overrides
    /// `hook_event_name`.
    pub fn event(&self, forced: Option<&str>) -> HookEvent {
        let name = forced
            .or(self.hook_event_name.as_deref())
            .unwrap_or_default();
        HookEvent::from_request(name, self)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Which fail-open default an event falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFamily {
    /// Gated by `permission` (read, shell, external tool).
    Permission,
    /// Gated by `decision` (tool use).
    Decision,
    /// Non-gating, answered with `continue`.
    Continue,
    /// Advisory only.
    Advisory,
}

/// One decoded lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    SessionStart,
    BeforeSubmitPrompt,
    PreCompact,
    BeforeReadFile {
        file_path: Option<String>,
    },
    PreToolUse {
        tool_name: Option<String>,
        tool_input: Value,
    },
    AfterFileEdit {
        file_path: Option<String>,
    },
    BeforeShellExecution {
        command: String,
    },
    BeforeMcpExecution {
        tool_name: Option<String>,
        command: Option<String>,
        url: Option<String>,
        tool_input: Value,
    },
    Unknown(String),
}

impl HookEvent {
    pub fn from_request(name: &str, req: &HookRequest) -> Self {
        let owned = |key: &str| req.str_field(key).map(str::to_string);
        let value = |key: &str| req.field(key).cloned().unwrap_or(Value::Null);
        match name {
            "sessionStart" => HookEvent::SessionStart,
            "beforeSubmitPrompt" => HookEvent::BeforeSubmitPrompt,
            "preCompact" => HookEvent::PreCompact,
            "beforeReadFile" | "beforeTabFileRead" => HookEvent::BeforeReadFile {
                file_path: owned("file_path"),
            },
            "preToolUse" => HookEvent::PreToolUse {
                tool_name: owned("tool_name"),
                tool_input: value("tool_input"),
            },
            "afterFileEdit" | "afterTabFileEdit" => HookEvent::AfterFileEdit {
                file_path: owned("file_path"),
            },
            "beforeShellExecution" => HookEvent::BeforeShellExecution {
                command: owned("command").unwrap_or_default(),
            },
            "beforeMCPExecution" => HookEvent::BeforeMcpExecution {
                tool_name: owned("tool_name"),
                command: owned("command"),
                url: owned("url"),
                tool_input: value("tool_input"),
            },
            other => HookEvent::Unknown(other.to_string()),
        }
    }

    pub fn family(&self) -> EventFamily {
        match self {
            HookEvent::BeforeReadFile { .. }
            | HookEvent::BeforeShellExecution { .. }
            | HookEvent::BeforeMcpExecution { .. } => EventFamily::Permission,
            HookEvent::PreToolUse { .. } => EventFamily::Decision,
            HookEvent::SessionStart | HookEvent::BeforeSubmitPrompt => EventFamily::Continue,
            HookEvent::PreCompact | HookEvent::AfterFileEdit { .. } | HookEvent::Unknown(_) => {
                EventFamily::Advisory
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HookEvent::SessionStart => "sessionStart",
            HookEvent::BeforeSubmitPrompt => "beforeSubmitPrompt",
            HookEvent::PreCompact => "preCompact",
            HookEvent::BeforeReadFile { .. } => "beforeReadFile",
            HookEvent::PreToolUse { .. } => "preToolUse",
            HookEvent::AfterFileEdit { .. } => "afterFileEdit",
            HookEvent::BeforeShellExecution { .. } => "beforeShellExecution",
            HookEvent::BeforeMcpExecution { .. } => "beforeMCPExecution",
            HookEvent::Unknown(name) => name,
        }
    }

    /// The response used when handling this event fails.
    pub fn fail_open(&self) -> HookOutput {
        match self.family() {
            EventFamily::Permission => HookOutput::permission(Permission::Allow),
            EventFamily::Decision => HookOutput::decision(Permission::Allow, None),
            EventFamily::Continue => HookOutput::continue_execution(),
            EventFamily::Advisory => HookOutput::empty(),
        }
    }
}

/// First non-blank string among the known path keys of a tool input.
pub fn extract_tool_path(tool_input: &Value) -> Option<&str> {
    let obj = tool_input.as_object()?;
    TOOL_PATH_KEYS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Allow,
    Deny,
}

/// Environment variables exported on session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEnv {
    #[serde(rename = "BRAIN_HOMEOSTASIS_HASH")]
    pub homeostasis_hash: String,
    #[serde(rename = "BRAIN_HOMEOSTASIS_PATH")]
    pub homeostasis_path: String,
    #[serde(rename = "BRAIN_CORTEX_PATH")]
    pub cortex_path: String,
    #[serde(rename = "BRAIN_VITALS_PATH")]
    pub vitals_path: String,
}

/// The hook output sent to the host via stdout. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HookOutput {
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub should_continue: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<SessionEnv>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl HookOutput {
    /// `{}`
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn continue_execution() -> Self {
        Self {
            should_continue: Some(true),
            ..Self::default()
        }
    }

    pub fn permission(permission: Permission) -> Self {
        Self {
            permission: Some(permission),
            ..Self::default()
        }
    }

    pub fn decision(decision: Permission, reason: Option<String>) -> Self {
        Self {
            decision: Some(decision),
            reason,
            ..Self::default()
        }
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_agent_message(mut self, message: impl Into<String>) -> Self {
        self.agent_message = Some(message.into());
        self
    }

    /// Append a line to `user_message`.
    pub fn push_user_message(&mut self, message: &str) {
        if message.is_empty() {
            return;
        }
        self.user_message = Some(match self.user_message.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{message}"),
            _ => message.to_string(),
        });
    }

    /// Append a block to `additional_context`.
    pub fn push_context(&mut self, block: &str) {
        if block.is_empty() {
            return;
        }
        self.additional_context = Some(match self.additional_context.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{block}"),
            _ => block.to_string(),
        });
    }

    /// Write response to any writer (for testability)
    pub fn write_to(&self, mut writer: impl Write) -> anyhow::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write response to stdout (convenience wrapper for production)
    pub fn write_stdout(&self) -> anyhow::Result<()> {
        self.write_to(std::io::stdout().lock())
    }
}

/// Exit codes for hook responses
pub mod exit_code {
    /// Success - response written to stdout
    pub const SUCCESS: i32 = 0;
}
