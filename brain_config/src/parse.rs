//! Minimal indentation-based parser for brain documents.
//!
//! The brain documents use a small, regular subset of YAML:
//!
//! ```yaml
//! generated_at: "2025-01-01T00:00:00Z"   # top-level scalar
//! REFLEXES:                              # top-level section
//!   mode: deep_focus                     # section scalar (indent 2)
//!   motor:                               # section list key (indent 2)
//!     - "_brain_v1/**"                   # list item (indent >= 4)
//!   sensory: []                          # present-but-empty list
//! ```
//!
//! Only that subset is understood. Anything else is skipped silently, so a
//! malformed document degrades to a partially-filled (or empty) [`Document`]
//! instead of an error.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{Level, instrument, trace};

/// Spaces a tab expands to before indentation is measured.
const TAB_WIDTH: usize = 4;

/// A parsed scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Scalar {
    /// Classify an already comment-stripped raw value.
    ///
    /// Quoted values are always strings; bare `true`/`false` are booleans and
    /// bare integer literals are integers.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(unquoted) = strip_wrapping_quotes(raw) {
            return Scalar::Str(unquoted.to_string());
        }
        match raw {
            "true" => return Scalar::Bool(true),
            "false" => return Scalar::Bool(false),
            _ => {}
        }
        if is_integer_literal(raw)
            && let Ok(n) = raw.parse::<i64>()
        {
            return Scalar::Int(n);
        }
        Scalar::Str(raw.to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as a label. Integers and booleans render as their literal
    /// text; an empty string is `None`.
    pub fn as_label(&self) -> Option<String> {
        let s = self.to_string();
        if s.is_empty() { None } else { Some(s) }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A top-level named block and its one level of nested content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Scalar fields (last write wins).
    pub scalars: BTreeMap<String, Scalar>,
    /// List fields. Presence of a key with an empty vector means the
    /// document declared the list but gave it no items.
    pub lists: BTreeMap<String, Vec<String>>,
}

impl Section {
    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.scalars.get(key)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.lists.get(key).map(Vec::as_slice)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.scalar(key).and_then(Scalar::as_int)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.scalar(key).and_then(Scalar::as_bool)
    }

    pub fn label(&self, key: &str) -> Option<String> {
        self.scalar(key).and_then(Scalar::as_label)
    }
}

/// The generic tree produced by [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub scalars: BTreeMap<String, Scalar>,
    pub sections: BTreeMap<String, Section>,
}

impl Document {
    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.scalars.get(key)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.sections.is_empty()
    }
}

/// Parse raw document text. Never fails; unrecognized lines are skipped.
#[instrument(level = Level::TRACE, skip(text))]
pub fn parse(text: &str) -> Document {
    let mut parser = Parser::default();
    for raw_line in text.lines() {
        parser.line(raw_line);
    }
    parser.doc
}

/// Parser state: the section and list key that subsequent, more indented
/// lines attach to.
#[derive(Default)]
struct Parser {
    doc: Document,
    section: Option<String>,
    list_key: Option<String>,
}

impl Parser {
    fn line(&mut self, raw_line: &str) {
        let line = raw_line.replace('\t', &" ".repeat(TAB_WIDTH));
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }
        let indent = line.len() - line.trim_start_matches(' ').len();

        match indent {
            0 => self.top_level(trimmed),
            2 => self.section_key(trimmed),
            n if n >= 4 => self.list_item(trimmed),
            _ => trace!(line = %raw_line, "skipping line with unsupported indentation"),
        }
    }

    fn top_level(&mut self, trimmed: &str) {
        self.list_key = None;
        let Some((key, rest)) = split_key(trimmed) else {
            trace!(line = %trimmed, "skipping unrecognized top-level line");
            return;
        };
        let value = strip_inline_comment(rest);
        if value.is_empty() || value == "[]" {
            self.doc.sections.entry(key.to_string()).or_default();
            self.section = (value.is_empty()).then(|| key.to_string());
            return;
        }
        self.section = None;
        self.doc
            .scalars
            .insert(key.to_string(), Scalar::from_raw(value));
    }

    fn section_key(&mut self, trimmed: &str) {
        self.list_key = None;
        let Some(section_name) = self.section.as_ref() else {
            return;
        };
        let Some((key, rest)) = split_key(trimmed) else {
            return;
        };
        let section = self.doc.sections.entry(section_name.clone()).or_default();
        let value = strip_inline_comment(rest);
        if value.is_empty() || value == "[]" {
            // `key:` opens a list; `key: []` declares it empty. Either way a
            // repeated key starts over rather than appending to the old one.
            section.lists.insert(key.to_string(), Vec::new());
            self.list_key = Some(key.to_string());
            return;
        }
        section
            .scalars
            .insert(key.to_string(), Scalar::from_raw(value));
    }

    fn list_item(&mut self, trimmed: &str) {
        let (Some(section_name), Some(list_key)) = (self.section.as_ref(), self.list_key.as_ref())
        else {
            return;
        };
        let Some(item) = trimmed.strip_prefix('-') else {
            // A nested mapping, not a list: stop collecting into this key.
            self.list_key = None;
            return;
        };
        let item = item.trim_start_matches('-');
        let item = strip_inline_comment(item);
        let item = strip_wrapping_quotes(item).unwrap_or(item).trim();
        if item.is_empty() {
            return;
        }
        if let Some(list) = self
            .doc
            .sections
            .get_mut(section_name)
            .and_then(|s| s.lists.get_mut(list_key))
        {
            list.push(item.to_string());
        }
    }
}

/// Split `key: rest` where key is an identifier (`[A-Za-z_][A-Za-z0-9_]*`).
fn split_key(trimmed: &str) -> Option<(&str, &str)> {
    let colon = trimmed.find(':')?;
    let key = trimmed[..colon].trim_end();
    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, &trimmed[colon + 1..]))
}

/// Remove a trailing `<whitespace>#...` comment and trim the remainder.
pub fn strip_inline_comment(value: &str) -> &str {
    let mut prev_ws = true;
    for (i, c) in value.char_indices() {
        if c == '#' && prev_ws && i > 0 {
            return value[..i].trim();
        }
        prev_ws = c.is_whitespace();
    }
    value.trim()
}

/// Return the inner text if `value` is wrapped in matching single or double
/// quotes.
pub fn strip_wrapping_quotes(value: &str) -> Option<&str> {
    let v = value.trim();
    if v.len() < 2 {
        return None;
    }
    ['"', '\''].into_iter().find_map(|q| {
        v.strip_prefix(q)
            .and_then(|inner| inner.strip_suffix(q))
    })
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# HOMEOSTASIS
version: 3
enabled: true
MINDSET:
  mode: "deep_focus"   # current mode
  caution: high
  focus: 'api'
REFLEXES:
  motor:
    - "_brain_v1/**"
    - .env  # secrets
  sensory: []
  inhibition:
    - rm -rf *
"#;

    #[test]
    fn test_parse_top_level_scalars() {
        let doc = parse(SAMPLE);
        assert_eq!(doc.scalar("version"), Some(&Scalar::Int(3)));
        assert_eq!(doc.scalar("enabled"), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn test_parse_section_scalars_strip_quotes_and_comments() {
        let doc = parse(SAMPLE);
        let mindset = doc.section("MINDSET").unwrap();
        assert_eq!(mindset.label("mode").as_deref(), Some("deep_focus"));
        assert_eq!(mindset.label("caution").as_deref(), Some("high"));
        assert_eq!(mindset.label("focus").as_deref(), Some("api"));
    }

    #[test]
    fn test_parse_lists() {
        let doc = parse(SAMPLE);
        let reflexes = doc.section("REFLEXES").unwrap();
        assert_eq!(
            reflexes.list("motor").unwrap(),
            &["_brain_v1/**".to_string(), ".env".to_string()]
        );
        assert_eq!(reflexes.list("sensory"), Some(&[][..]));
        assert_eq!(reflexes.list("inhibition").unwrap(), &["rm -rf *".to_string()]);
        assert_eq!(reflexes.list("missing"), None);
    }

    #[test]
    fn test_tabs_count_as_four_spaces() {
        let doc = parse("gates:\n  require_wbc:\n\t- \"scan\"\n");
        assert_eq!(
            doc.section("gates").unwrap().list("require_wbc").unwrap(),
            &["scan".to_string()]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "::nonsense\n   odd: indent\nchemical_state:\n  cortisol: 2\n - stray\n  !bad key: 1\n";
        let doc = parse(text);
        let chem = doc.section("chemical_state").unwrap();
        assert_eq!(chem.int("cortisol"), Some(2));
        assert_eq!(chem.scalars.len(), 1);
    }

    #[test]
    fn test_scalar_after_section_closes_it() {
        let doc = parse("gates:\n  block_new_features: true\ngenerated_at: now\n  stray: 1\n");
        assert_eq!(doc.section("gates").unwrap().bool("block_new_features"), Some(true));
        assert!(doc.section("gates").unwrap().scalar("stray").is_none());
        assert_eq!(doc.scalar("generated_at"), Some(&Scalar::Str("now".into())));
    }

    #[test]
    fn test_quoted_literals_stay_strings() {
        let doc = parse("s:\n  a: \"true\"\n  b: '12'\n  c: 12\n  d: -4\n  e: 1.5\n");
        let s = doc.section("s").unwrap();
        assert_eq!(s.scalar("a"), Some(&Scalar::Str("true".into())));
        assert_eq!(s.scalar("b"), Some(&Scalar::Str("12".into())));
        assert_eq!(s.int("c"), Some(12));
        assert_eq!(s.int("d"), Some(-4));
        assert_eq!(s.scalar("e"), Some(&Scalar::Str("1.5".into())));
    }

    #[test]
    fn test_nested_mapping_does_not_leak_into_list() {
        let text = "scopes:\n  brain_md:\n    root: \"_brain_v1\"\n    include:\n      - \"**/*.md\"\n";
        let doc = parse(text);
        assert_eq!(doc.section("scopes").unwrap().list("brain_md"), Some(&[][..]));
    }

    #[test]
    fn test_hash_without_leading_space_is_not_a_comment() {
        assert_eq!(strip_inline_comment("issue#12 # note"), "issue#12");
        assert_eq!(strip_inline_comment("  # only comment"), "");
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse(SAMPLE), parse(SAMPLE));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("# just a comment\n\n").is_empty());
    }
}
