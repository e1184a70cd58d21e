//! The cortex: a compact digest of the brain for the agent's context window.
//!
//! Rendered two ways from the same data: a YAML artifact written to the
//! workspace (`.cursor/cortex.yaml` by default) and a one-line-per-section
//! block injected as `additional_context`.

use brain_config::{MindsetConfig, ReflexSet};
use serde::Serialize;

use crate::pulse::Pulse;
use crate::triage::Triage;

/// Everything the renderers need.
#[derive(Debug, Clone, Copy)]
pub struct CortexInput<'a> {
    pub mindset: &'a MindsetConfig,
    pub reflexes: &'a ReflexSet,
    /// SHA-256 of the homeostasis document.
    pub hash: &'a str,
    pub pulse: &'a Pulse,
    /// Workspace-relative homeostasis path.
    pub source: &'a str,
}

/// The YAML artifact.
pub fn build_cortex_yaml(input: &CortexInput<'_>) -> String {
    let r = input.reflexes;
    let list_block = |items: &[String]| -> String {
        if items.is_empty() {
            return "  []".to_string();
        }
        items
            .iter()
            .map(|item| format!("\n  - {}", quote(item)))
            .collect()
    };

    let mut out = [
        "# AUTO-GENERATED - DO NOT EDIT".to_string(),
        format!("# Source: {}", input.source),
        format!("workspace_root: {}", quote(&input.pulse.workspace_root)),
        format!("MINDSET: {{ {} }}", mindset_fields(input.mindset)),
        "REFLEXES:".to_string(),
        format!("  motor:{}", list_block(&r.motor)),
        format!("  sensory:{}", list_block(&r.sensory)),
        format!("  inhibition:{}", list_block(&r.inhibition)),
        vitals_line(input.pulse),
        gates_line(input.pulse),
        bootstrap_line(input.pulse),
        format!("ALERTS: {}", compact_list(&input.pulse.alerts)),
        "INSTINCT: \"Motor reflex denies writes. Sensory reflex denies reads. Inhibition denies shell/MCP.\"".to_string(),
        format!("HASH: {}", quote(input.hash)),
    ]
    .join("\n");
    out.push('\n');
    out
}

/// The `additional_context` block.
pub fn build_additional_context(input: &CortexInput<'_>) -> String {
    let r = input.reflexes;
    [
        "_brain cortex (auto-injected by hooks)".to_string(),
        format!("source: {}", input.source),
        format!("workspace_root: {}", input.pulse.workspace_root),
        format!("hash: {}", input.hash),
        format!("MINDSET: {{ {} }}", mindset_fields(input.mindset)),
        format!(
            "REFLEXES: {{ sensory: {}, motor: {}, inhibition: {} }}",
            compact_list(&r.sensory),
            compact_list(&r.motor),
            compact_list(&r.inhibition)
        ),
        vitals_line(input.pulse),
        gates_line(input.pulse),
        bootstrap_line(input.pulse),
        format!("ALERTS: {}", compact_list(&input.pulse.alerts)),
        "INSTINCT: sensory=blindness (deny read), motor=withdrawal (deny write), inhibition=deny shell/MCP".to_string(),
    ]
    .join("\n")
}

/// The triage block appended to prompt-submission context.
pub fn build_triage_context(triage: &Triage) -> String {
    [
        "_brain triage".to_string(),
        format!(
            "TRIAGE: {{ grade: {}, layer: {}, reason: {}, phase: {} }}",
            quote(triage.grade.as_str()),
            quote(triage.layer),
            quote(&triage.reason),
            quote(triage.phase())
        ),
        format!("TRIAGE_MATCHES: {}", compact_list(&triage.hits)),
    ]
    .join("\n")
}

fn mindset_fields(m: &MindsetConfig) -> String {
    let field = |v: &Option<String>| quote(v.as_deref().unwrap_or_default());
    format!(
        "mode: {}, caution: {}, focus: {}",
        field(&m.mode),
        field(&m.caution),
        field(&m.focus)
    )
}

fn vitals_line(pulse: &Pulse) -> String {
    let v = &pulse.vitals;
    format!(
        "VITALS: {{ generated_at: {}, age_days: {}, inflammation: {}, cortisol: {}, mode: {} }}",
        quote(v.generated_at.as_deref().unwrap_or_default()),
        quote(&v.age_days_label),
        json_or_unknown(v.inflammation),
        json_or_unknown(v.cortisol),
        json_or_unknown(v.mode.as_deref())
    )
}

fn gates_line(pulse: &Pulse) -> String {
    format!(
        "GATES: {{ block_new_features: {}, require_wbc: {} }}",
        json_or_unknown(pulse.vitals.block_new_features),
        compact_list(&pulse.vitals.require_wbc)
    )
}

fn bootstrap_line(pulse: &Pulse) -> String {
    format!(
        "BOOTSTRAP: {{ missing_core_files: {} }}",
        compact_list(&pulse.missing_core_files)
    )
}

/// A JSON string literal.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// The value as JSON, or `"unknown"` when absent.
fn json_or_unknown<T: Serialize>(value: Option<T>) -> String {
    value
        .and_then(|v| serde_json::to_string(&v).ok())
        .unwrap_or_else(|| quote("unknown"))
}

/// `["a", "b"]` or `[]`.
fn compact_list(items: &[String]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::VitalsSummary;
    use crate::triage::classify_text;
    use brain_config::TriageKeywords;

    fn pulse() -> Pulse {
        Pulse {
            workspace_root: "/ws".into(),
            alerts: vec!["vitals_missing".into()],
            missing_core_files: vec![],
            vitals: VitalsSummary {
                age_days_label: "unknown".into(),
                inflammation: Some(1),
                require_wbc: vec!["scan".into()],
                ..VitalsSummary::default()
            },
            ..Pulse::default()
        }
    }

    fn reflexes() -> ReflexSet {
        ReflexSet {
            sensory: vec![".env".into()],
            motor: vec!["_brain_v1/**".into(), "Cargo.lock".into()],
            inhibition: vec![],
        }
    }

    fn mindset() -> MindsetConfig {
        MindsetConfig {
            mode: Some("deep_focus".into()),
            caution: None,
            focus: Some("api \"v2\"".into()),
        }
    }

    #[test]
    fn test_cortex_yaml() {
        let (m, r, p) = (mindset(), reflexes(), pulse());
        let yaml = build_cortex_yaml(&CortexInput {
            mindset: &m,
            reflexes: &r,
            hash: "abc",
            pulse: &p,
            source: "_brain_v1/homeostasis.yaml",
        });
        let expected = r#"# AUTO-GENERATED - DO NOT EDIT
# Source: _brain_v1/homeostasis.yaml
workspace_root: "/ws"
MINDSET: { mode: "deep_focus", caution: "", focus: "api \"v2\"" }
REFLEXES:
  motor:
  - "_brain_v1/**"
  - "Cargo.lock"
  sensory:
  - ".env"
  inhibition:  []
VITALS: { generated_at: "", age_days: "unknown", inflammation: 1, cortisol: "unknown", mode: "unknown" }
GATES: { block_new_features: "unknown", require_wbc: ["scan"] }
BOOTSTRAP: { missing_core_files: [] }
ALERTS: ["vitals_missing"]
INSTINCT: "Motor reflex denies writes. Sensory reflex denies reads. Inhibition denies shell/MCP."
HASH: "abc"
"#;
        assert_eq!(yaml, expected);
    }

    #[test]
    fn test_additional_context() {
        let (m, r, p) = (mindset(), reflexes(), pulse());
        let ctx = build_additional_context(&CortexInput {
            mindset: &m,
            reflexes: &r,
            hash: "abc",
            pulse: &p,
            source: "_brain_v1/homeostasis.yaml",
        });
        let lines: Vec<&str> = ctx.lines().collect();
        assert_eq!(lines[0], "_brain cortex (auto-injected by hooks)");
        assert_eq!(lines[2], "workspace_root: /ws");
        assert_eq!(lines[3], "hash: abc");
        assert_eq!(
            lines[5],
            r#"REFLEXES: { sensory: [".env"], motor: ["_brain_v1/**", "Cargo.lock"], inhibition: [] }"#
        );
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_triage_context() {
        let t = classify_text("update the README", &TriageKeywords::default());
        assert_eq!(
            build_triage_context(&t),
            "_brain triage\nTRIAGE: { grade: \"C\", layer: \"surface\", reason: \"surface_signals:readme\", phase: \"SURGEON_ELIGIBLE\" }\nTRIAGE_MATCHES: [\"readme\"]"
        );
    }
}
