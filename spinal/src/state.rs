//! Persisted per-workspace session state and emit-once notice dedup.
//!
//! The record is a JSON object. Fields this module does not know about are
//! carried through every write unchanged. A missing or corrupt file reads as
//! an empty record and is replaced on the next save.

use std::path::{Path, PathBuf};

use brain_config::io::{read_fail_open, write_atomic};
use serde_json::{Map, Value};
use tracing::{Level, debug, info, instrument, warn};

const SESSION_ID: &str = "session_id";
const LAST_INJECTED_HASH: &str = "last_injected_hash";
const LAST_CHECK_TIMESTAMP: &str = "last_check_timestamp";

/// A notice that is surfaced at most once per session and content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Attention,
    Triage,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Attention => "attention",
            NotificationKind::Triage => "triage",
        }
    }

    fn hash_field(self) -> String {
        format!("last_{}_notice_hash", self.as_str())
    }

    fn session_field(self) -> String {
        format!("last_{}_notice_session_id", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The session record of one workspace, loaded once per invocation.
#[derive(Debug, Clone)]
pub struct SessionStateStore {
    path: PathBuf,
    record: Map<String, Value>,
}

impl SessionStateStore {
    /// Load the record at `path`. Never fails.
    #[instrument(level = Level::TRACE)]
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            record: load(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Whether the config with `config_hash` needs injecting into this
    /// session: no hash was stored yet, or the session or hash differs from
    /// the stored one. Reads only.
    pub fn needs_refresh(&self, session_id: Option<&str>, config_hash: &str) -> bool {
        let prev_hash = self.record.get(LAST_INJECTED_HASH);
        !is_truthy(prev_hash)
            || self.record.get(SESSION_ID) != Some(&session_value(session_id))
            || prev_hash.and_then(Value::as_str) != Some(config_hash)
    }

    /// Record that this session has seen the config with `config_hash`, and
    /// save. Call only once the injection it stands for has happened, so a
    /// failed cortex write is retried on the next invocation.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn mark_injected(&mut self, session_id: Option<&str>, config_hash: &str) {
        self.record.insert(SESSION_ID.into(), session_value(session_id));
        self.record
            .insert(LAST_INJECTED_HASH.into(), Value::String(config_hash.into()));
        self.touch();
        self.persist();
        debug!("Marked config injected");
    }

    /// Whether a notice of `kind` with `content_hash` should be shown now.
    ///
    /// Returns `false` for an empty hash, or when the same hash was already
    /// recorded for the same session. Otherwise the pair is recorded and saved
    /// and `true` is returned.
    #[instrument(level = Level::TRACE, skip(self))]
    pub fn should_emit_once(
        &mut self,
        session_id: Option<&str>,
        kind: NotificationKind,
        content_hash: &str,
    ) -> bool {
        if content_hash.is_empty() {
            return false;
        }
        let session = session_value(session_id);
        let hash_field = kind.hash_field();
        let session_field = kind.session_field();

        let already_sent = self.record.get(&hash_field).and_then(Value::as_str)
            == Some(content_hash)
            && self.record.get(&session_field) == Some(&session);
        if already_sent {
            debug!(kind = kind.as_str(), "Notice already sent this session");
            return false;
        }

        self.record
            .insert(hash_field, Value::String(content_hash.into()));
        self.record.insert(session_field, session);
        self.touch();
        self.persist();
        info!(kind = kind.as_str(), "Emitting notice");
        true
    }

    /// Write the record now. Failures are returned to the caller.
    pub fn save(&self) -> brain_config::Result<()> {
        save(&self.path, &self.record)
    }

    fn touch(&mut self) {
        self.record.insert(
            LAST_CHECK_TIMESTAMP.into(),
            Value::from(chrono::Utc::now().timestamp()),
        );
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "Failed to save session state");
        }
    }
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// Read the record. Absence, invalid JSON, or a non-object all yield an
/// empty record.
pub fn load(path: &Path) -> Map<String, Value> {
    let Some(raw) = read_fail_open(path) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(path = %path.display(), "Session state is not an object; starting fresh");
            Map::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt session state; starting fresh");
            Map::new()
        }
    }
}

/// Pretty-printed JSON with a trailing newline, written atomically.
pub fn save(path: &Path, record: &Map<String, Value>) -> brain_config::Result<()> {
    let mut content = serde_json::to_string_pretty(record)?;
    content.push('\n');
    write_atomic(path, &content)
}

fn session_value(session_id: Option<&str>) -> Value {
    session_id.map_or(Value::Null, |s| Value::String(s.to_string()))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
