//! Typed view of the homeostasis document (`MINDSET`, `REFLEXES`, `TRIAGE`).

use serde::Serialize;

use crate::parse::{Document, Section};

/// The agent's declared working mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MindsetConfig {
    pub mode: Option<String>,
    pub caution: Option<String>,
    pub focus: Option<String>,
}

impl MindsetConfig {
    pub fn from_section(section: Option<&Section>) -> Self {
        let Some(section) = section else {
            return Self::default();
        };
        Self {
            mode: section.label("mode"),
            caution: section.label("caution"),
            focus: section.label("focus"),
        }
    }
}

/// Ordered deny patterns per reflex category. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReflexSet {
    /// Path globs that block reads.
    pub sensory: Vec<String>,
    /// Path globs that block writes.
    pub motor: Vec<String>,
    /// Command wildcards that block execution.
    pub inhibition: Vec<String>,
}

impl ReflexSet {
    pub fn from_section(section: Option<&Section>) -> Self {
        let Some(section) = section else {
            return Self::default();
        };
        let list = |key: &str| section.list(key).map(<[String]>::to_vec).unwrap_or_default();
        Self {
            sensory: list("sensory"),
            motor: list("motor"),
            inhibition: list("inhibition"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sensory.is_empty() && self.motor.is_empty() && self.inhibition.is_empty()
    }
}

const DEFAULT_SKELETAL: &[&str] = &[
    "architecture",
    "infrastructure",
    "schema migration",
    "database migration",
    "new dependency",
    "install package",
    "upgrade dependency",
    "downgrade dependency",
    "ci pipeline",
    "deployment pipeline",
    "dockerfile",
    "kubernetes",
    "terraform",
    "monorepo",
    "build system",
    "tsconfig",
    "vite.config",
    "webpack config",
    "eslint config",
    "auth flow",
    "permissions model",
    "api contract",
    "cross-cutting",
    "global config",
];

const DEFAULT_SURFACE: &[&str] = &[
    "typo",
    "spelling",
    "wording",
    "copy edit",
    "docs",
    "documentation",
    "readme",
    "comment",
    "formatting",
    "lint fix",
    "ui text",
    "placeholder text",
    "css color",
    "style only",
];

/// Keyword lists used to grade a prompt. Stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageKeywords {
    pub skeletal: Vec<String>,
    pub surface: Vec<String>,
}

impl Default for TriageKeywords {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            skeletal: owned(DEFAULT_SKELETAL),
            surface: owned(DEFAULT_SURFACE),
        }
    }
}

impl TriageKeywords {
    /// Built-in lists, each replaced by the section's list when declared
    /// (an explicit `[]` disables that grade).
    pub fn from_section(section: Option<&Section>) -> Self {
        let mut keywords = Self::default();
        let Some(section) = section else {
            return keywords;
        };
        let lowered = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        if let Some(items) = section.list("skeletal") {
            keywords.skeletal = lowered(items);
        }
        if let Some(items) = section.list("surface") {
            keywords.surface = lowered(items);
        }
        keywords
    }
}

/// Everything read from the homeostasis document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Homeostasis {
    pub mindset: MindsetConfig,
    pub reflexes: ReflexSet,
    pub triage: TriageKeywords,
}

impl Homeostasis {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            mindset: MindsetConfig::from_section(doc.section("MINDSET")),
            reflexes: ReflexSet::from_section(doc.section("REFLEXES")),
            triage: TriageKeywords::from_section(doc.section("TRIAGE")),
        }
    }
}
