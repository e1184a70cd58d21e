//! Test environment setup for spintest.
//!
//! Creates an isolated temp directory holding a fake HOME and a workspace
//! populated from the script, so spinal reads controlled documents only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brain_config::BrainLayout;
use chrono::{Duration, SecondsFormat, Utc};
use regex::Regex;
use tempfile::TempDir;

use crate::script::WorkspaceSpec;

/// An isolated test environment with controlled HOME and workspace.
pub struct TestEnvironment {
    /// The temp directory that owns the filesystem (dropped = cleaned up).
    _temp: TempDir,

    /// Path to the fake HOME directory.
    pub home_dir: PathBuf,

    /// The workspace root handed to spinal.
    pub workspace_dir: PathBuf,
}

impl TestEnvironment {
    pub fn setup(spec: &WorkspaceSpec) -> Result<Self> {
        let temp = TempDir::new().context("failed to create temp directory")?;
        let base = temp.path();

        let home_dir = base.join("home");
        let workspace_dir = base.join("workspace");
        std::fs::create_dir_all(&home_dir).context("failed to create fake HOME")?;
        std::fs::create_dir_all(&workspace_dir).context("failed to create workspace")?;

        let layout = BrainLayout::new(spec.brain_root.as_str());
        if let Some(ref homeostasis) = spec.homeostasis {
            write_file(&workspace_dir, &layout.homeostasis_rel(), homeostasis)?;
        }
        if let Some(ref vitals) = spec.vitals {
            write_file(&workspace_dir, &layout.vitals_rel(), vitals)?;
        }
        if spec.bootstrap {
            // The two documents are bootstrap files too; only the markdown
            // core files get placeholders.
            for rel in layout.bootstrap_rel_paths().into_iter().skip(2) {
                if !workspace_dir.join(&rel).exists() {
                    write_file(&workspace_dir, &rel, "# core\n")?;
                }
            }
        }
        for (rel, content) in &spec.files {
            write_file(&workspace_dir, rel, content)?;
        }
        if let Some(ref state) = spec.state {
            let json = serde_json::to_string_pretty(state)?;
            write_file(&workspace_dir, ".cursor/synaptic_state.json", &json)?;
        }
        if let Some(ref settings) = spec.settings {
            let json = serde_json::to_string_pretty(settings)?;
            write_file(&workspace_dir, ".cursor/spinal.json", &json)?;
        }

        Ok(Self {
            _temp: temp,
            home_dir,
            workspace_dir,
        })
    }

    /// Log file spinal writes to during the run.
    pub fn log_path(&self) -> PathBuf {
        self.home_dir.join(".spinal/spinal.log")
    }
}

fn write_file(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, render_template(content))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Expand `{{days_ago:N}}` placeholders.
pub fn render_template(content: &str) -> String {
    let Ok(re) = Regex::new(r"\{\{days_ago:(-?\d+)\}\}") else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex::Captures<'_>| {
        let days: i64 = caps[1].parse().unwrap_or(0);
        (Utc::now() - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_setup_materializes_workspace() {
        let spec = WorkspaceSpec {
            brain_root: "_brain_v1".into(),
            homeostasis: Some("MINDSET:\n  mode: build\n".into()),
            vitals: None,
            bootstrap: true,
            files: [("src/.env".to_string(), "X=1".to_string())].into(),
            state: Some(serde_json::json!({"session_id": "old"})),
            settings: Some(serde_json::json!({"vitals_stale_days": 3})),
        };

        let env = TestEnvironment::setup(&spec).unwrap();
        let ws = &env.workspace_dir;
        assert!(ws.join("_brain_v1/homeostasis.yaml").exists());
        assert!(!ws.join("_brain_v1/4_evolution/vitals.yaml").exists());
        assert!(
            ws.join("_brain_v1/3_context/synapses/0-9/_syn_8_tech_stack_map_drift_protocol.md")
                .exists()
        );
        assert!(ws.join("src/.env").exists());
        assert!(ws.join(".cursor/synaptic_state.json").exists());
        assert!(ws.join(".cursor/spinal.json").exists());
        assert!(env.home_dir.exists());
    }

    #[test]
    fn test_render_days_ago() {
        let rendered = render_template("generated_at: \"{{days_ago:10}}\"");
        let ts = rendered
            .trim_start_matches("generated_at: \"")
            .trim_end_matches('"');
        let parsed = DateTime::parse_from_rfc3339(ts).unwrap();
        let age = Utc::now().signed_duration_since(parsed);
        assert!((age.num_hours() - 240).abs() <= 1);
        assert_eq!(render_template("plain"), "plain");
    }
}
