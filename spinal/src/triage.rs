//! Prompt triage: grade a submitted prompt by keyword signals.
//!
//! Grade A (skeletal) prompts touch architecture-level concerns and lock the
//! agent into an architect phase; grade C (surface) prompts are cosmetic;
//! everything else is grade B.

use brain_config::{TriageKeywords, sha256_hex};
use serde::Serialize;
use serde_json::{Map, Value};

/// Top-level request keys that may hold the prompt directly.
const DIRECT_KEYS: &[&str] = &[
    "prompt",
    "text",
    "message",
    "user_message",
    "user_prompt",
    "submitted_prompt",
    "current_prompt",
];

/// Top-level containers searched after the direct keys.
const CONTAINER_KEYS: &[&str] = &["payload", "request", "data", "tool_input"];

/// Keys searched inside an object value.
const NESTED_KEYS: &[&str] = &["text", "content", "prompt", "message", "input"];

const TOP_SIGNALS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triage {
    pub grade: Grade,
    /// `skeletal`, `muscle` or `surface`.
    pub layer: &'static str,
    pub reason: String,
    pub hits: Vec<String>,
    pub prompt_available: bool,
}

impl Triage {
    pub fn phase(&self) -> &'static str {
        match self.grade {
            Grade::A => "ARCHITECT_LOCK",
            _ => "SURGEON_ELIGIBLE",
        }
    }

    /// Dedup hash for the grade-A notice.
    pub fn notice_hash(&self) -> String {
        sha256_hex(&format!(
            "{}|{}|{}",
            self.grade.as_str(),
            self.reason,
            self.hits.join("|")
        ))
    }

    /// The one-line user notice for a skeletal prompt.
    pub fn notice(&self) -> String {
        let top = self.top_hits().join(", ");
        if top.is_empty() {
            "BRAIN TRIAGE: Grade A (skeletal) -> PHASE ARCHITECT.".to_string()
        } else {
            format!("BRAIN TRIAGE: Grade A (skeletal) -> PHASE ARCHITECT. Signals: {top}")
        }
    }

    fn top_hits(&self) -> &[String] {
        &self.hits[..self.hits.len().min(TOP_SIGNALS)]
    }
}

/// Grade the prompt carried by a request.
pub fn classify(fields: &Map<String, Value>, keywords: &TriageKeywords) -> Triage {
    match extract_prompt_text(fields) {
        Some(text) => classify_text(&text, keywords),
        None => Triage {
            grade: Grade::B,
            layer: "muscle",
            reason: "prompt_unavailable".into(),
            hits: Vec::new(),
            prompt_available: false,
        },
    }
}

pub fn classify_text(text: &str, keywords: &TriageKeywords) -> Triage {
    let normalized = normalize(text);
    let scan = |list: &[String]| -> Vec<String> {
        list.iter()
            .filter(|k| !k.is_empty() && normalized.contains(k.as_str()))
            .cloned()
            .collect()
    };

    let signals = |prefix: &str, hits: &[String]| {
        format!("{prefix}:{}", hits[..hits.len().min(TOP_SIGNALS)].join("|"))
    };

    let skeletal = scan(&keywords.skeletal);
    if !skeletal.is_empty() {
        return Triage {
            grade: Grade::A,
            layer: "skeletal",
            reason: signals("skeletal_signals", &skeletal),
            hits: skeletal,
            prompt_available: true,
        };
    }
    let surface = scan(&keywords.surface);
    if !surface.is_empty() {
        return Triage {
            grade: Grade::C,
            layer: "surface",
            reason: signals("surface_signals", &surface),
            hits: surface,
            prompt_available: true,
        };
    }
    Triage {
        grade: Grade::B,
        layer: "muscle",
        reason: "default_logic_scope".into(),
        hits: Vec::new(),
        prompt_available: true,
    }
}

/// Lowercase and collapse whitespace runs.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Find the prompt text in a request's fields.
pub fn extract_prompt_text(fields: &Map<String, Value>) -> Option<String> {
    DIRECT_KEYS
        .iter()
        .chain(CONTAINER_KEYS)
        .find_map(|key| fields.get(*key).and_then(coerce_text))
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        Value::Object(obj) => NESTED_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(coerce_text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_extract_direct_keys_in_order() {
        let f = fields(json!({"text": "second", "prompt": "  first  "}));
        assert_eq!(extract_prompt_text(&f).as_deref(), Some("first"));

        let f = fields(json!({"prompt": "   ", "current_prompt": "later"}));
        assert_eq!(extract_prompt_text(&f).as_deref(), Some("later"));
    }

    #[test]
    fn test_extract_arrays_and_nested() {
        let f = fields(json!({"message": ["a", 1, " ", "b"]}));
        assert_eq!(extract_prompt_text(&f).as_deref(), Some("a\nb"));

        let f = fields(json!({"payload": {"meta": 1, "content": {"text": "deep"}}}));
        assert_eq!(extract_prompt_text(&f).as_deref(), Some("deep"));

        let f = fields(json!({"data": {"other": "x"}}));
        assert_eq!(extract_prompt_text(&f), None);
    }

    #[test]
    fn test_classify_skeletal() {
        let t = classify_text(
            "Please redo the   ARCHITECTURE and add a Dockerfile plus terraform and a monorepo",
            &TriageKeywords::default(),
        );
        assert_eq!(t.grade, Grade::A);
        assert_eq!(t.layer, "skeletal");
        assert_eq!(t.reason, "skeletal_signals:architecture|dockerfile|terraform");
        assert_eq!(t.hits.len(), 4);
        assert_eq!(t.phase(), "ARCHITECT_LOCK");
        assert_eq!(
            t.notice(),
            "BRAIN TRIAGE: Grade A (skeletal) -> PHASE ARCHITECT. Signals: architecture, dockerfile, terraform"
        );
    }

    #[test]
    fn test_classify_surface_and_default() {
        let t = classify_text("fix a typo in the README", &TriageKeywords::default());
        assert_eq!(t.grade, Grade::C);
        assert_eq!(t.reason, "surface_signals:typo|readme");
        assert_eq!(t.phase(), "SURGEON_ELIGIBLE");

        let t = classify_text("make the parser faster", &TriageKeywords::default());
        assert_eq!(t.grade, Grade::B);
        assert_eq!(t.layer, "muscle");
        assert_eq!(t.reason, "default_logic_scope");
    }

    #[test]
    fn test_classify_without_prompt() {
        let t = classify(&Map::new(), &TriageKeywords::default());
        assert!(!t.prompt_available);
        assert_eq!(t.reason, "prompt_unavailable");
    }

    #[test]
    fn test_whitespace_collapse_matches_multiword_keywords() {
        let t = classify_text("add a\n\tnew   dependency", &TriageKeywords::default());
        assert_eq!(t.hits, vec!["new dependency"]);
    }

    #[test]
    fn test_custom_keywords() {
        let keywords = TriageKeywords {
            skeletal: vec!["engine rewrite".into()],
            surface: vec![],
        };
        assert_eq!(classify_text("engine rewrite now", &keywords).grade, Grade::A);
        assert_eq!(classify_text("fix typo", &keywords).grade, Grade::B);
    }

    #[test]
    fn test_notice_hash_depends_on_hits() {
        let k = TriageKeywords::default();
        let a = classify_text("terraform", &k);
        let b = classify_text("kubernetes", &k);
        assert_eq!(a.notice_hash(), classify_text("terraform", &k).notice_hash());
        assert_ne!(a.notice_hash(), b.notice_hash());
    }
}
