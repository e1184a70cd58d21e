//! The pulse: a derived health summary of the brain, rebuilt per invocation.

use std::path::Path;

use brain_config::{BrainSnapshot, MindsetConfig, sha256_hex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{Level, debug, instrument};

const UNKNOWN: &str = "unknown";
const MS_PER_DAY: f64 = 86_400_000.0;

/// The vitals fields surfaced in context blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VitalsSummary {
    pub generated_at: Option<String>,
    /// Days since `generated_at` with one decimal, or `unknown`.
    pub age_days_label: String,
    pub inflammation: Option<i64>,
    pub cortisol: Option<i64>,
    pub mode: Option<String>,
    pub block_new_features: Option<bool>,
    pub require_wbc: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pulse {
    pub workspace_root: String,
    pub one_line: String,
    pub alerts: Vec<String>,
    pub missing_core_files: Vec<String>,
    /// Present only when `alerts` is non-empty.
    pub attention_message: Option<String>,
    /// SHA-256 of the alerts joined by `|`; present only with alerts.
    pub attention_hash: Option<String>,
    pub vitals: VitalsSummary,
}

impl Pulse {
    /// Derive the pulse. `now` is injected so staleness is testable.
    #[instrument(level = Level::TRACE, skip(snapshot))]
    pub fn compute(
        snapshot: &BrainSnapshot,
        workspace_root: &Path,
        stale_days: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let homeostasis = &snapshot.homeostasis;
        let vitals = &snapshot.vitals.parsed;
        let chemical = &vitals.chemical_state;
        let gates = &vitals.gates;
        let reflexes = &homeostasis.parsed.reflexes;

        let age_days = vitals
            .generated_at_utc()
            .map(|ts| ((now - ts).num_milliseconds() as f64 / MS_PER_DAY).max(0.0));

        let mut alerts = Vec::new();
        if !homeostasis.exists {
            alerts.push("homeostasis_missing".to_string());
        }
        if !snapshot.vitals.exists {
            alerts.push("vitals_missing".to_string());
        }
        if !snapshot.bootstrap.missing.is_empty() {
            alerts.push(format!(
                "missing_core_files:{}",
                snapshot.bootstrap.missing.len()
            ));
        }
        if let Some(age) = age_days
            && age > stale_days
        {
            alerts.push(format!("vitals_stale:{:.1}d", age));
        }
        if gates.block_new_features == Some(true) {
            alerts.push("gate:block_new_features=true".to_string());
        }
        if !gates.require_wbc.is_empty() {
            alerts.push(format!("gate:require_wbc:{}", gates.require_wbc.len()));
        }
        if let Some(v) = chemical.inflammation
            && v >= 1
        {
            alerts.push(format!("inflammation:{}", v));
        }
        if let Some(v) = chemical.cortisol
            && v >= 2
        {
            alerts.push(format!("cortisol:{}", v));
        }

        let age_days_label = age_days
            .map(|a| format!("{:.1}", a))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let one_line = summary_line(
            &homeostasis.parsed.mindset,
            chemical.inflammation,
            chemical.cortisol,
            gates.block_new_features,
            (
                reflexes.sensory.len(),
                reflexes.motor.len(),
                reflexes.inhibition.len(),
            ),
            &age_days_label,
        );

        let (attention_message, attention_hash) = if alerts.is_empty() {
            (None, None)
        } else {
            (
                Some(format!("BRAIN ATTENTION: {}", alerts.join(" | "))),
                Some(sha256_hex(&alerts.join("|"))),
            )
        };
        debug!(alerts = ?alerts, "Computed pulse");

        Pulse {
            workspace_root: workspace_root.display().to_string(),
            one_line,
            alerts,
            missing_core_files: snapshot.bootstrap.missing.clone(),
            attention_message,
            attention_hash,
            vitals: VitalsSummary {
                generated_at: vitals.generated_at.clone(),
                age_days_label,
                inflammation: chemical.inflammation,
                cortisol: chemical.cortisol,
                mode: chemical.mode.clone(),
                block_new_features: gates.block_new_features,
                require_wbc: gates.require_wbc.clone(),
            },
        }
    }
}

fn label<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn summary_line(
    mindset: &MindsetConfig,
    inflammation: Option<i64>,
    cortisol: Option<i64>,
    block_new_features: Option<bool>,
    (sensory, motor, inhibition): (usize, usize, usize),
    age_days_label: &str,
) -> String {
    [
        "_brain pulse".to_string(),
        format!("mode={}", label(mindset.mode.as_deref())),
        format!("caution={}", label(mindset.caution.as_deref())),
        format!("focus={}", label(mindset.focus.as_deref())),
        format!("inflammation={}", label(inflammation)),
        format!("cortisol={}", label(cortisol)),
        format!("block_new_features={}", label(block_new_features)),
        format!("reflexes(s/m/i)={}/{}/{}", sensory, motor, inhibition),
        format!("vitals_age_days={}", age_days_label),
    ]
    .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_config::{BrainLayout, ConfigLoader};
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn bootstrapped(vitals: &str) -> TempDir {
        let layout = BrainLayout::default();
        let mut files: Vec<(String, String)> = layout
            .bootstrap_rel_paths()
            .into_iter()
            .map(|p| (p, "# core\n".to_string()))
            .collect();
        files[0].1 = "MINDSET:\n  mode: build\nREFLEXES:\n  motor:\n    - \"_brain_v1/**\"\n".into();
        files[1].1 = vitals.to_string();
        let refs: Vec<(&str, &str)> = files.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        workspace(&refs)
    }

    fn pulse_for(dir: &TempDir) -> Pulse {
        let snapshot = ConfigLoader::new(dir.path(), BrainLayout::default()).load();
        Pulse::compute(&snapshot, dir.path(), 7.0, now())
    }

    fn generated(days_ago: i64) -> String {
        format!(
            "generated_at: \"{}\"\n",
            (now() - Duration::days(days_ago)).to_rfc3339()
        )
    }

    #[test]
    fn test_missing_workspace_only_missing_alerts() {
        let dir = workspace(&[]);
        let pulse = pulse_for(&dir);
        assert_eq!(
            pulse.alerts,
            vec!["homeostasis_missing", "vitals_missing", "missing_core_files:7"]
        );
        assert_eq!(
            pulse.attention_message.as_deref(),
            Some("BRAIN ATTENTION: homeostasis_missing | vitals_missing | missing_core_files:7")
        );
        assert_eq!(
            pulse.one_line,
            "_brain pulse | mode=unknown | caution=unknown | focus=unknown | inflammation=unknown | cortisol=unknown | block_new_features=unknown | reflexes(s/m/i)=0/0/0 | vitals_age_days=unknown"
        );
    }

    #[test]
    fn test_stale_vitals() {
        let pulse = pulse_for(&bootstrapped(&generated(10)));
        assert_eq!(pulse.alerts, vec!["vitals_stale:10.0d"]);
        assert_eq!(pulse.vitals.age_days_label, "10.0");
    }

    #[test]
    fn test_fresh_vitals_no_alerts() {
        let pulse = pulse_for(&bootstrapped(&generated(3)));
        assert!(pulse.alerts.is_empty());
        assert_eq!(pulse.attention_message, None);
        assert_eq!(pulse.attention_hash, None);
        assert!(pulse.one_line.contains("mode=build"));
        assert!(pulse.one_line.contains("reflexes(s/m/i)=0/1/0"));
        assert!(pulse.one_line.ends_with("vitals_age_days=3.0"));
    }

    #[test]
    fn test_future_timestamp_clamps_to_zero() {
        let pulse = pulse_for(&bootstrapped(&generated(-2)));
        assert_eq!(pulse.vitals.age_days_label, "0.0");
    }

    #[test]
    fn test_unparsable_timestamp_is_unknown() {
        let pulse = pulse_for(&bootstrapped("generated_at: last tuesday\n"));
        assert_eq!(pulse.vitals.age_days_label, "unknown");
        assert!(pulse.alerts.is_empty());
    }

    #[test]
    fn test_alert_order() {
        let vitals = format!(
            "{}chemical_state:\n  inflammation: 1\n  cortisol: 2\ngates:\n  block_new_features: true\n  require_wbc:\n    - a\n    - b\n",
            generated(30)
        );
        let pulse = pulse_for(&bootstrapped(&vitals));
        assert_eq!(
            pulse.alerts,
            vec![
                "vitals_stale:30.0d",
                "gate:block_new_features=true",
                "gate:require_wbc:2",
                "inflammation:1",
                "cortisol:2",
            ]
        );
    }

    #[test]
    fn test_thresholds() {
        let vitals = format!(
            "{}chemical_state:\n  inflammation: 0\n  cortisol: 1\n",
            generated(1)
        );
        assert!(pulse_for(&bootstrapped(&vitals)).alerts.is_empty());
    }

    #[test]
    fn test_attention_hash_stable_and_sensitive() {
        let a = pulse_for(&workspace(&[]));
        let b = pulse_for(&workspace(&[]));
        assert_eq!(a.attention_hash, b.attention_hash);
        assert_eq!(
            a.attention_hash.as_deref(),
            Some(sha256_hex("homeostasis_missing|vitals_missing|missing_core_files:7").as_str())
        );

        let c = pulse_for(&workspace(&[("_brain_v1/homeostasis.yaml", "")]));
        assert_ne!(a.attention_hash, c.attention_hash);
    }
}
