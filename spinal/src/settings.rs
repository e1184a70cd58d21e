use std::path::{Path, PathBuf};

use brain_config::{BrainLayout, DEFAULT_BRAIN_ROOT};
use dirs::home_dir;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, instrument, warn};

/// Workspace-level override file, relative to the workspace root.
const WORKSPACE_SETTINGS_FILE: &str = ".cursor/spinal.json";

/// Runtime settings, layered: built-in defaults, then the workspace's
/// `.cursor/spinal.json`, then `SPINAL_*` environment variables.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpinalSettings {
    /// Brain directory, relative to the workspace root.
    pub brain_root: String,
    /// Vitals older than this many days raise a staleness alert.
    pub vitals_stale_days: f64,
    /// Tool names whose `preToolUse` events are gated by the motor reflex.
    pub write_tools: Vec<String>,
    /// Session state file, relative to the workspace root.
    pub state_path: String,
    /// Generated cortex artifact, relative to the workspace root.
    pub cortex_path: String,
}

impl Default for SpinalSettings {
    fn default() -> Self {
        Self {
            brain_root: DEFAULT_BRAIN_ROOT.to_string(),
            vitals_stale_days: 7.0,
            write_tools: ["Write", "Edit", "MultiEdit", "NotebookEdit"]
                .into_iter()
                .map(String::from)
                .collect(),
            state_path: ".cursor/synaptic_state.json".to_string(),
            cortex_path: ".cursor/cortex.yaml".to_string(),
        }
    }
}

impl SpinalSettings {
    /// `~/.spinal`, when a home directory is known.
    pub fn settings_dir() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".spinal"))
    }

    pub fn workspace_file(workspace_root: &Path) -> PathBuf {
        workspace_root.join(WORKSPACE_SETTINGS_FILE)
    }

    /// The configured provider stack for a workspace.
    #[instrument(level = Level::TRACE)]
    pub fn figment(workspace_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = Self::workspace_file(workspace_root);
        if file.exists() {
            figment = figment.merge(Json::file(&file));
        }
        figment.merge(Env::prefixed("SPINAL_"))
    }

    /// Defaults and environment only, for use before the workspace is known.
    pub fn base() -> Self {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("SPINAL_"))
            .extract()
            .unwrap_or_default()
    }

    /// Load settings for a workspace. A broken layer is logged and the
    /// defaults are used instead.
    #[instrument(level = Level::TRACE)]
    pub fn load(workspace_root: &Path) -> Self {
        match Self::figment(workspace_root).extract::<Self>() {
            Ok(settings) => {
                debug!(?settings, "Loaded settings");
                settings
            }
            Err(e) => {
                warn!(error = %e, "Invalid spinal settings; using defaults");
                Self::default()
            }
        }
    }

    pub fn layout(&self) -> BrainLayout {
        BrainLayout::new(self.brain_root.as_str())
    }

    pub fn state_file(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.state_path)
    }

    pub fn cortex_file(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.cortex_path)
    }

    pub fn is_write_tool(&self, tool_name: &str) -> bool {
        self.write_tools.iter().any(|t| t == tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let settings = SpinalSettings::load(dir.path());
        assert_eq!(settings.brain_root, "_brain_v1");
        assert_eq!(settings.vitals_stale_days, 7.0);
        assert!(settings.is_write_tool("Write"));
        assert!(settings.is_write_tool("MultiEdit"));
        assert!(!settings.is_write_tool("Read"));
        assert_eq!(
            settings.state_file(dir.path()),
            dir.path().join(".cursor/synaptic_state.json")
        );
    }

    #[test]
    fn test_workspace_file_overrides() {
        let dir = TempDir::new().unwrap();
        let file = SpinalSettings::workspace_file(dir.path());
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, r#"{"vitals_stale_days": 3.5, "write_tools": ["Write"]}"#).unwrap();

        let settings = SpinalSettings::load(dir.path());
        assert_eq!(settings.vitals_stale_days, 3.5);
        assert_eq!(settings.write_tools, vec!["Write"]);
        assert_eq!(settings.cortex_path, ".cursor/cortex.yaml");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let file = SpinalSettings::workspace_file(dir.path());
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, r#"{"vitals_stale_days": "soon"}"#).unwrap();

        assert_eq!(SpinalSettings::load(dir.path()), SpinalSettings::default());
    }

    #[test]
    fn test_layout_uses_brain_root() {
        let settings = SpinalSettings {
            brain_root: "brain".into(),
            ..SpinalSettings::default()
        };
        assert_eq!(settings.layout().homeostasis_rel(), "brain/homeostasis.yaml");
    }
}
