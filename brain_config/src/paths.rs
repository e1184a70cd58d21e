//! Workspace layout of the brain documents and path normalization.

use std::path::{Component, Path, PathBuf};

use tracing::{Level, instrument};

use crate::pattern::normalize_separators;

/// Default directory (relative to the workspace root) holding the brain.
pub const DEFAULT_BRAIN_ROOT: &str = "_brain_v1";

const HOMEOSTASIS_FILE: &str = "homeostasis.yaml";
const VITALS_FILE: &str = "4_evolution/vitals.yaml";

/// Core markdown files, relative to the brain root, that must exist for the
/// brain to be considered bootstrapped.
const BOOTSTRAP_FILES: &[&str] = &[
    "1_directives/synapses/0-9/_syn_1_surgical_triage_rubric.md",
    "1_directives/synapses/0-9/_syn_2_phase_lock_protocol.md",
    "1_directives/synapses/10-99/_syn_10_director_chain_ingestion_order.md",
    "2_identity/synapses/0-9/_syn_7_core_values_pillars.md",
    "3_context/synapses/0-9/_syn_8_tech_stack_map_drift_protocol.md",
];

/// Where the brain documents live inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrainLayout {
    brain_root: String,
}

impl Default for BrainLayout {
    fn default() -> Self {
        Self::new(DEFAULT_BRAIN_ROOT)
    }
}

impl BrainLayout {
    pub fn new(brain_root: impl Into<String>) -> Self {
        let root = normalize_separators(&brain_root.into());
        let root = root.trim_end_matches('/').to_string();
        Self {
            brain_root: if root.is_empty() {
                DEFAULT_BRAIN_ROOT.to_string()
            } else {
                root
            },
        }
    }

    pub fn brain_root(&self) -> &str {
        &self.brain_root
    }

    /// Workspace-relative path of the homeostasis document.
    pub fn homeostasis_rel(&self) -> String {
        format!("{}/{}", self.brain_root, HOMEOSTASIS_FILE)
    }

    /// Workspace-relative path of the vitals document.
    pub fn vitals_rel(&self) -> String {
        format!("{}/{}", self.brain_root, VITALS_FILE)
    }

    /// Every file the bootstrap check requires, documents first.
    pub fn bootstrap_rel_paths(&self) -> Vec<String> {
        let mut paths = vec![self.homeostasis_rel(), self.vitals_rel()];
        paths.extend(
            BOOTSTRAP_FILES
                .iter()
                .map(|f| format!("{}/{}", self.brain_root, f)),
        );
        paths
    }
}

/// Pick the workspace root: the first candidate containing the brain
/// directory, else the first candidate, else `cwd`.
#[instrument(level = Level::TRACE, skip(cwd))]
pub fn resolve_workspace_root(candidates: &[String], brain_root: &str, cwd: &Path) -> PathBuf {
    let candidates: Vec<&String> = candidates.iter().filter(|c| !c.is_empty()).collect();
    candidates
        .iter()
        .find(|root| Path::new(root.as_str()).join(brain_root).exists())
        .or_else(|| candidates.first())
        .map(|root| PathBuf::from(root.as_str()))
        .unwrap_or_else(|| cwd.to_path_buf())
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else if components.is_empty() {
                    components.push(component);
                }
            }
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Express `file_path` relative to `workspace_root` with `/` separators.
///
/// Relative inputs are joined to the root first. If the result falls outside
/// the root, the input itself (separator-normalized) is returned.
pub fn to_rel_path(file_path: &str, workspace_root: &Path) -> String {
    if file_path.trim().is_empty() {
        return String::new();
    }
    let unified = file_path.replace('\\', "/");
    let candidate = Path::new(&unified);
    let abs = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        workspace_root.join(candidate)
    };
    let abs = lexical_normalize(&abs);
    let root = lexical_normalize(workspace_root);

    match abs.strip_prefix(&root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => normalize_separators(file_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = BrainLayout::default();
        assert_eq!(layout.homeostasis_rel(), "_brain_v1/homeostasis.yaml");
        assert_eq!(layout.vitals_rel(), "_brain_v1/4_evolution/vitals.yaml");
        let bootstrap = layout.bootstrap_rel_paths();
        assert_eq!(bootstrap.len(), 7);
        assert_eq!(bootstrap[0], "_brain_v1/homeostasis.yaml");
        assert!(bootstrap[6].ends_with("_syn_8_tech_stack_map_drift_protocol.md"));
    }

    #[test]
    fn test_layout_custom_root() {
        let layout = BrainLayout::new("brain/");
        assert_eq!(layout.homeostasis_rel(), "brain/homeostasis.yaml");
        assert_eq!(BrainLayout::new("").brain_root(), DEFAULT_BRAIN_ROOT);
    }

    #[test]
    fn test_to_rel_path() {
        let root = Path::new("/ws");
        assert_eq!(to_rel_path("/ws/src/main.rs", root), "src/main.rs");
        assert_eq!(to_rel_path("src/main.rs", root), "src/main.rs");
        assert_eq!(to_rel_path("./src/../.env", root), ".env");
        assert_eq!(to_rel_path(r"config\.env", root), "config/.env");
        assert_eq!(to_rel_path("", root), "");
    }

    #[test]
    fn test_to_rel_path_escape_falls_back_to_input() {
        let root = Path::new("/ws");
        assert_eq!(to_rel_path("/etc/passwd", root), "/etc/passwd");
        assert_eq!(to_rel_path("../other/.env", root), "../other/.env");
        assert_eq!(to_rel_path("/wsx/file", root), "/wsx/file");
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(lexical_normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(lexical_normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_resolve_workspace_root_prefers_brain_owner() {
        let plain = TempDir::new().unwrap();
        let brain = TempDir::new().unwrap();
        std::fs::create_dir_all(brain.path().join(DEFAULT_BRAIN_ROOT)).unwrap();
        let roots = vec![
            plain.path().display().to_string(),
            brain.path().display().to_string(),
        ];
        let cwd = Path::new("/cwd");
        assert_eq!(
            resolve_workspace_root(&roots, DEFAULT_BRAIN_ROOT, cwd),
            brain.path()
        );
    }

    #[test]
    fn test_resolve_workspace_root_fallbacks() {
        let cwd = Path::new("/cwd");
        let roots = vec!["/nonexistent/a".to_string(), "/nonexistent/b".to_string()];
        assert_eq!(
            resolve_workspace_root(&roots, DEFAULT_BRAIN_ROOT, cwd),
            PathBuf::from("/nonexistent/a")
        );
        assert_eq!(resolve_workspace_root(&[], DEFAULT_BRAIN_ROOT, cwd), cwd);
    }
}
