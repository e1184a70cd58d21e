//! Loads the brain documents of one workspace into typed views.
//!
//! Every load goes back to disk. Nothing here fails: a missing or unreadable
//! document is reported through `exists` and parses as empty.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{Level, debug, instrument};

use crate::homeostasis::Homeostasis;
use crate::io::read_fail_open;
use crate::parse::parse;
use crate::paths::BrainLayout;
use crate::vitals::VitalsSnapshot;

/// Lowercase hex SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct LoadedHomeostasis {
    pub path: PathBuf,
    pub exists: bool,
    /// Raw document text (empty when absent).
    pub raw: String,
    /// SHA-256 of `raw`.
    pub hash: String,
    pub parsed: Homeostasis,
}

#[derive(Debug, Clone)]
pub struct LoadedVitals {
    pub path: PathBuf,
    pub exists: bool,
    pub parsed: VitalsSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapStatus {
    pub required: Vec<String>,
    pub missing: Vec<String>,
}

/// Both documents plus the bootstrap check, as read in one pass.
#[derive(Debug, Clone)]
pub struct BrainSnapshot {
    pub homeostasis: LoadedHomeostasis,
    pub vitals: LoadedVitals,
    pub bootstrap: BootstrapStatus,
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace_root: PathBuf,
    layout: BrainLayout,
}

impl ConfigLoader {
    pub fn new(workspace_root: impl Into<PathBuf>, layout: BrainLayout) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            layout,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn layout(&self) -> &BrainLayout {
        &self.layout
    }

    pub fn homeostasis_path(&self) -> PathBuf {
        self.workspace_root.join(self.layout.homeostasis_rel())
    }

    pub fn vitals_path(&self) -> PathBuf {
        self.workspace_root.join(self.layout.vitals_rel())
    }

    #[instrument(level = Level::TRACE, skip(self))]
    pub fn load_homeostasis(&self) -> LoadedHomeostasis {
        let path = self.homeostasis_path();
        let raw = read_fail_open(&path);
        let exists = raw.is_some();
        let raw = raw.unwrap_or_default();
        let parsed = Homeostasis::from_document(&parse(&raw));
        debug!(path = %path.display(), exists, "Loaded homeostasis");
        LoadedHomeostasis {
            hash: sha256_hex(&raw),
            path,
            exists,
            raw,
            parsed,
        }
    }

    #[instrument(level = Level::TRACE, skip(self))]
    pub fn load_vitals(&self) -> LoadedVitals {
        let path = self.vitals_path();
        let raw = read_fail_open(&path);
        let exists = raw.is_some();
        let parsed = VitalsSnapshot::from_document(&parse(raw.as_deref().unwrap_or_default()));
        debug!(path = %path.display(), exists, "Loaded vitals");
        LoadedVitals {
            path,
            exists,
            parsed,
        }
    }

    #[instrument(level = Level::TRACE, skip(self))]
    pub fn bootstrap_status(&self) -> BootstrapStatus {
        let required = self.layout.bootstrap_rel_paths();
        let missing = required
            .iter()
            .filter(|rel| !self.workspace_root.join(rel.as_str()).exists())
            .cloned()
            .collect();
        BootstrapStatus { required, missing }
    }

    pub fn load(&self) -> BrainSnapshot {
        BrainSnapshot {
            homeostasis: self.load_homeostasis(),
            vitals: self.load_vitals(),
            bootstrap: self.bootstrap_status(),
        }
    }
}
