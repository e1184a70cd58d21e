//! Typed view of the vitals document written by the brain scanner.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::parse::{Document, Scalar};

/// Counters from the last documentation scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BrainVitals {
    pub md_files: Option<i64>,
    pub md_lines: Option<i64>,
    pub md_bytes: Option<i64>,
    pub last_scan_at: Option<String>,
}

/// Stress indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChemicalState {
    pub inflammation: Option<i64>,
    pub cortisol: Option<i64>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Gates {
    pub block_new_features: Option<bool>,
    /// Order-preserving, duplicates collapsed.
    pub require_wbc: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VitalsSnapshot {
    pub generated_at: Option<String>,
    pub brain_vitals: BrainVitals,
    pub chemical_state: ChemicalState,
    pub gates: Gates,
}

impl VitalsSnapshot {
    pub fn from_document(doc: &Document) -> Self {
        let generated_at = doc.scalar("generated_at").and_then(Scalar::as_label);

        let brain_vitals = doc
            .section("brain_vitals")
            .map(|s| BrainVitals {
                md_files: s.int("md_files"),
                md_lines: s.int("md_lines"),
                md_bytes: s.int("md_bytes"),
                last_scan_at: s.label("last_scan_at"),
            })
            .unwrap_or_default();

        let chemical_state = doc
            .section("chemical_state")
            .map(|s| ChemicalState {
                inflammation: s.int("inflammation"),
                cortisol: s.int("cortisol"),
                mode: s.label("mode"),
            })
            .unwrap_or_default();

        let gates = doc
            .section("gates")
            .map(|s| {
                let mut require_wbc: Vec<String> = Vec::new();
                for item in s.list("require_wbc").unwrap_or_default() {
                    if !require_wbc.contains(item) {
                        require_wbc.push(item.clone());
                    }
                }
                Gates {
                    block_new_features: s.bool("block_new_features"),
                    require_wbc,
                }
            })
            .unwrap_or_default();

        Self {
            generated_at,
            brain_vitals,
            chemical_state,
            gates,
        }
    }

    /// `generated_at` as a UTC instant, if it parses.
    pub fn generated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.generated_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DD[ T]HH:MM:SS` (taken as
/// UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use chrono::TimeZone;

    const VITALS: &str = r#"
generated_at: "2025-01-01T00:00:00Z"
brain_vitals:
  last_scan_at: "2025-01-01T00:00:00Z"
  md_files: 42
  md_lines: 1200
  md_bytes: 56000
chemical_state:
  inflammation: 2   # raised by WBC scan
  cortisol: 1
  mode: "recovery"
gates:
  block_new_features: false
  require_wbc:
    - scan_auth
    - scan_db
    - scan_auth
"#;

    #[test]
    fn test_from_document() {
        let v = VitalsSnapshot::from_document(&parse(VITALS));
        assert_eq!(v.generated_at.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(v.brain_vitals.md_files, Some(42));
        assert_eq!(v.brain_vitals.md_bytes, Some(56000));
        assert_eq!(v.chemical_state.inflammation, Some(2));
        assert_eq!(v.chemical_state.cortisol, Some(1));
        assert_eq!(v.chemical_state.mode.as_deref(), Some("recovery"));
        assert_eq!(v.gates.block_new_features, Some(false));
    }

    #[test]
    fn test_require_wbc_dedup_preserves_order() {
        let v = VitalsSnapshot::from_document(&parse(VITALS));
        assert_eq!(v.gates.require_wbc, vec!["scan_auth", "scan_db"]);
    }

    #[test]
    fn test_missing_document_is_default() {
        assert_eq!(
            VitalsSnapshot::from_document(&parse("")),
            VitalsSnapshot::default()
        );
    }

    #[test]
    fn test_non_integer_counters_are_absent() {
        let v = VitalsSnapshot::from_document(&parse("chemical_state:\n  cortisol: high\n"));
        assert_eq!(v.chemical_state.cortisol, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
