//! # Brain Config
//!
//! Reading the `_brain` documents that drive the spinal reflex hooks.
//!
//! ## Overview
//!
//! A workspace carries two small configuration documents under its brain
//! root (`_brain_v1` by default):
//!
//! 1. **Homeostasis** (`homeostasis.yaml`) - the agent's `MINDSET`, the
//!    `REFLEXES` deny lists, and optional `TRIAGE` keyword overrides
//! 2. **Vitals** (`4_evolution/vitals.yaml`) - scanner output: counters,
//!    chemical state and gates
//!
//! This library provides:
//! - A tolerant parser for the YAML subset those documents use ([`parse`])
//! - Typed views over the parsed tree ([`Homeostasis`], [`VitalsSnapshot`])
//! - Path-glob and command-wildcard matchers ([`pattern`])
//! - A loader that reads everything for one workspace, failing open
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brain_config::{BrainLayout, ConfigLoader};
//!
//! let loader = ConfigLoader::new("/path/to/workspace", BrainLayout::default());
//! let snapshot = loader.load();
//!
//! for glob in &snapshot.homeostasis.parsed.reflexes.motor {
//!     println!("write-protected: {glob}");
//! }
//! println!("missing bootstrap files: {}", snapshot.bootstrap.missing.len());
//! ```
//!
//! ## Patterns
//!
//! ```rust
//! use brain_config::pattern::{command_matches, path_matches};
//!
//! assert!(path_matches(".env", "config/.env"));
//! assert!(path_matches("_brain_v1/**", "_brain_v1/4_evolution/vitals.yaml"));
//! assert!(command_matches("rm -rf *", "RM -RF /tmp"));
//! ```

pub mod error;
pub mod homeostasis;
pub mod io;
pub mod loader;
pub mod parse;
pub mod paths;
pub mod pattern;
pub mod vitals;

pub use error::{BrainError, Result};
pub use homeostasis::{Homeostasis, MindsetConfig, ReflexSet, TriageKeywords};
pub use loader::{
    BootstrapStatus, BrainSnapshot, ConfigLoader, LoadedHomeostasis, LoadedVitals, sha256_hex,
};
pub use parse::{Document, Scalar, Section};
pub use paths::{BrainLayout, DEFAULT_BRAIN_ROOT, resolve_workspace_root, to_rel_path};
pub use pattern::{CommandPattern, PathPattern};
pub use vitals::{BrainVitals, ChemicalState, Gates, VitalsSnapshot};
