//! Assertion engine for spintest.
//!
//! Validates step results against the expectations in a test script.

use std::path::Path;

use serde_json::Value;

use crate::runner::StepResult;
use crate::script::Expectation;

/// Result of checking assertions for a single step.
#[derive(Debug)]
pub struct AssertionResult {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Check all assertions for a step. `workspace` resolves file expectations.
pub fn check(expect: &Expectation, result: &StepResult, workspace: &Path) -> AssertionResult {
    let mut failures = Vec::new();

    if let Some(expected_code) = expect.exit_code
        && result.exit_code != expected_code
    {
        failures.push(format!(
            "exit code: expected {}, got {}",
            expected_code, result.exit_code
        ));
    }

    let wants_json = expect.permission.is_some()
        || expect.decision.is_some()
        || expect.should_continue.is_some()
        || expect.empty.is_some()
        || expect.reason_contains.is_some()
        || expect.user_message_contains.is_some()
        || expect.no_user_message.is_some()
        || expect.agent_message_contains.is_some()
        || expect.context_contains.is_some()
        || expect.no_context.is_some()
        || !expect.env_keys.is_empty();

    match (&result.output, wants_json) {
        (Some(output), true) => check_output(expect, output, &mut failures),
        (None, true) => failures.push(format!(
            "expected JSON output, but stdout was not valid JSON: {}",
            result.stdout
        )),
        (_, false) => {}
    }

    for rel in &expect.files_exist {
        if !workspace.join(rel).exists() {
            failures.push(format!("files_exist: {} does not exist", rel));
        }
    }

    for (rel, expected_substr) in &expect.file_contains {
        match std::fs::read_to_string(workspace.join(rel)) {
            Ok(content) if content.contains(expected_substr.as_str()) => {}
            Ok(content) => failures.push(format!(
                "file_contains: expected {} to contain \"{}\", got:\n{}",
                rel,
                expected_substr,
                head(&content)
            )),
            Err(e) => failures.push(format!("file_contains: cannot read {}: {}", rel, e)),
        }
    }

    if let Some(ref expected_substr) = expect.stdout_contains
        && !result.stdout.contains(expected_substr.as_str())
    {
        failures.push(format!(
            "stdout_contains: expected stdout to contain \"{}\", got:\n{}",
            expected_substr,
            head(&result.stdout)
        ));
    }

    if let Some(ref expected_substr) = expect.stderr_contains
        && !result.stderr.contains(expected_substr.as_str())
    {
        failures.push(format!(
            "stderr_contains: expected stderr to contain \"{}\", got:\n{}",
            expected_substr,
            head(&result.stderr)
        ));
    }

    AssertionResult {
        passed: failures.is_empty(),
        failures,
    }
}

fn check_output(expect: &Expectation, output: &Value, failures: &mut Vec<String>) {
    let pretty = || serde_json::to_string_pretty(output).unwrap_or_default();

    let mut expect_str = |label: &str, field: &str, expected: &Option<String>| {
        if let Some(expected) = expected {
            match output.get(field).and_then(Value::as_str) {
                Some(actual) if actual == expected => {}
                Some(actual) => failures.push(format!(
                    "{}: expected \"{}\", got \"{}\"",
                    label, expected, actual
                )),
                None => failures.push(format!(
                    "{}: expected \"{}\", but field is missing in: {}",
                    label,
                    expected,
                    pretty()
                )),
            }
        }
    };
    expect_str("permission", "permission", &expect.permission);
    expect_str("decision", "decision", &expect.decision);

    if let Some(expected) = expect.should_continue
        && output.get("continue").and_then(Value::as_bool) != Some(expected)
    {
        failures.push(format!("continue: expected {}, got: {}", expected, pretty()));
    }

    if expect.empty == Some(true) && output.as_object().is_none_or(|o| !o.is_empty()) {
        failures.push(format!("empty: expected {{}}, got: {}", pretty()));
    }

    let mut expect_contains = |label: &str, field: &str, expected: &Option<String>| {
        if let Some(expected) = expected {
            let actual = output.get(field).and_then(Value::as_str).unwrap_or_default();
            if !actual.contains(expected.as_str()) {
                failures.push(format!(
                    "{}: expected {} to contain \"{}\", got \"{}\"",
                    label, field, expected, actual
                ));
            }
        }
    };
    expect_contains("reason_contains", "reason", &expect.reason_contains);
    expect_contains(
        "user_message_contains",
        "user_message",
        &expect.user_message_contains,
    );
    expect_contains(
        "agent_message_contains",
        "agent_message",
        &expect.agent_message_contains,
    );
    expect_contains(
        "context_contains",
        "additional_context",
        &expect.context_contains,
    );

    if expect.no_user_message == Some(true) && output.get("user_message").is_some() {
        failures.push(format!(
            "no_user_message: expected no user_message, got: {}",
            pretty()
        ));
    }
    if expect.no_context == Some(true) && output.get("additional_context").is_some() {
        failures.push(format!(
            "no_context: expected no additional_context, got: {}",
            pretty()
        ));
    }

    for key in &expect.env_keys {
        if output.get("env").and_then(|e| e.get(key)).is_none() {
            failures.push(format!("env_keys: {} missing in: {}", key, pretty()));
        }
    }
}

fn head(text: &str) -> String {
    text.lines().take(20).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(output: Value) -> StepResult {
        StepResult {
            exit_code: 0,
            stdout: output.to_string(),
            output: Some(output),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_deny_pass() {
        let expect = Expectation {
            exit_code: Some(0),
            permission: Some("deny".into()),
            user_message_contains: Some("BLINDNESS".into()),
            ..Expectation::default()
        };
        let r = result(json!({
            "permission": "deny",
            "user_message": "BLINDNESS: Sensory reflex prevents reading this file."
        }));
        let assertion = check(&expect, &r, Path::new("/nonexistent"));
        assert!(assertion.passed, "failures: {:?}", assertion.failures);
    }

    #[test]
    fn test_permission_mismatch() {
        let expect = Expectation {
            permission: Some("allow".into()),
            ..Expectation::default()
        };
        let assertion = check(
            &expect,
            &result(json!({"permission": "deny"})),
            Path::new("/"),
        );
        assert!(!assertion.passed);
        assert!(assertion.failures[0].contains("expected \"allow\""));
    }

    #[test]
    fn test_empty_and_absent_fields() {
        let expect = Expectation {
            empty: Some(true),
            no_user_message: Some(true),
            no_context: Some(true),
            ..Expectation::default()
        };
        assert!(check(&expect, &result(json!({})), Path::new("/")).passed);
        assert!(!check(&expect, &result(json!({"continue": true})), Path::new("/")).passed);
    }

    #[test]
    fn test_continue_and_env_keys() {
        let expect = Expectation {
            should_continue: Some(true),
            env_keys: vec!["BRAIN_CORTEX_PATH".into()],
            ..Expectation::default()
        };
        let ok = result(json!({"continue": true, "env": {"BRAIN_CORTEX_PATH": "/x"}}));
        assert!(check(&expect, &ok, Path::new("/")).passed);
        let missing = result(json!({"continue": true}));
        assert_eq!(check(&expect, &missing, Path::new("/")).failures.len(), 1);
    }

    #[test]
    fn test_non_json_stdout() {
        let expect = Expectation {
            decision: Some("allow".into()),
            ..Expectation::default()
        };
        let r = StepResult {
            exit_code: 0,
            output: None,
            stdout: "oops".into(),
            stderr: String::new(),
        };
        let assertion = check(&expect, &r, Path::new("/"));
        assert!(assertion.failures[0].contains("not valid JSON"));
    }

    #[test]
    fn test_file_expectations() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello world").unwrap();
        let expect = Expectation {
            files_exist: vec!["a.txt".into(), "b.txt".into()],
            file_contains: [("a.txt".to_string(), "world".to_string())].into(),
            ..Expectation::default()
        };
        let assertion = check(&expect, &result(json!({})), dir.path());
        assert_eq!(assertion.failures.len(), 1);
        assert!(assertion.failures[0].contains("b.txt"));
    }
}
