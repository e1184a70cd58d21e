//! Test runner for spintest.
//!
//! Invokes the spinal binary as a subprocess, piping hook JSON via stdin
//! and capturing stdout/stderr/exit code.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use crate::environment::TestEnvironment;
use crate::script::Step;

/// Result of running a single step.
#[derive(Debug)]
pub struct StepResult {
    /// Exit code from the process.
    pub exit_code: i32,

    /// Parsed JSON output from stdout (if valid JSON).
    pub output: Option<Value>,

    /// Raw stdout.
    pub stdout: String,

    /// Raw stderr.
    pub stderr: String,
}

impl StepResult {
    fn from_output(output: std::process::Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            output: serde_json::from_str::<Value>(&stdout).ok(),
            stdout,
            stderr,
        }
    }
}

/// Finds the spinal binary, preferring a freshly-built one from the workspace.
pub fn find_spinal_binary() -> Result<PathBuf> {
    // Sibling of the spintest binary (both in target/debug/).
    if let Some(sibling) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("spinal")))
        && sibling.exists()
    {
        return Ok(sibling);
    }

    let workspace_debug = Path::new("target/debug/spinal");
    if workspace_debug.exists() {
        return Ok(workspace_debug.to_path_buf());
    }

    if let Ok(output) = Command::new("which").arg("spinal").output()
        && output.status.success()
    {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    bail!("spinal binary not found. Run `cargo build --bins` first.")
}

/// A `spinal` invocation isolated from the caller's configuration.
fn spinal_command(spinal_bin: &Path, env: &TestEnvironment) -> Command {
    let mut cmd = Command::new(spinal_bin);
    // Prevent any ambient spinal config from leaking in.
    for (key, _) in std::env::vars() {
        if key.starts_with("SPINAL_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("HOME", &env.home_dir)
        .env("SPINAL_LOG", env.log_path())
        .current_dir(&env.workspace_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Pipe a hook event into `spinal hook`.
pub fn run_hook(spinal_bin: &Path, env: &TestEnvironment, step: &Step) -> Result<StepResult> {
    let stdin = match step.stdin {
        Some(ref raw) => raw.clone(),
        None => build_stdin_json(env, step)?,
    };

    let mut cmd = spinal_command(spinal_bin, env);
    cmd.arg("hook");
    if step.forced
        && let Some(ref event) = step.event
    {
        cmd.arg(event);
    }

    let mut child = cmd
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn spinal binary: {}", spinal_bin.display()))?;

    {
        let child_stdin = child.stdin.as_mut().context("failed to open spinal stdin")?;
        child_stdin
            .write_all(stdin.as_bytes())
            .context("failed to write to spinal stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("failed to wait for spinal process")?;
    Ok(StepResult::from_output(output))
}

/// Run `spinal <args>` directly, e.g. `spinal check shell "rm -rf /"`.
pub fn run_command(spinal_bin: &Path, env: &TestEnvironment, command: &str) -> Result<StepResult> {
    let args = shlex::split(command)
        .ok_or_else(|| anyhow::anyhow!("failed to parse command: {}", command))?;
    if args.is_empty() {
        bail!("empty command");
    }

    let output = spinal_command(spinal_bin, env)
        .args(&args)
        .stdin(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn spinal command: spinal {}", command))?
        .wait_with_output()
        .with_context(|| format!("failed to wait for spinal command: spinal {}", command))?;
    Ok(StepResult::from_output(output))
}

/// Run a shell command in the workspace, for setup between hook steps.
pub fn run_shell(env: &TestEnvironment, shell_cmd: &str) -> Result<StepResult> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(shell_cmd)
        .env("HOME", &env.home_dir)
        .current_dir(&env.workspace_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn shell command: {}", shell_cmd))?
        .wait_with_output()
        .with_context(|| format!("failed to wait for shell command: {}", shell_cmd))?;
    Ok(StepResult::from_output(output))
}

/// Build the JSON piped to spinal's stdin for a hook step.
fn build_stdin_json(env: &TestEnvironment, step: &Step) -> Result<String> {
    let workspace = env.workspace_dir.to_string_lossy().into_owned();
    let mut payload = Map::new();

    if !step.forced
        && let Some(ref event) = step.event
    {
        payload.insert("hook_event_name".into(), Value::String(event.clone()));
    }
    if let Some(ref conversation) = step.conversation_id {
        payload.insert("conversation_id".into(), Value::String(conversation.clone()));
    }
    payload.insert(
        "workspace_roots".into(),
        Value::Array(vec![Value::String(workspace.clone())]),
    );

    match step.input {
        Some(Value::Object(ref fields)) => {
            for (key, value) in fields {
                payload.insert(key.clone(), substitute(value, &workspace));
            }
        }
        Some(Value::Null) | None => {}
        Some(ref other) => bail!("step input must be a mapping, got {}", other),
    }

    Ok(serde_json::to_string(&Value::Object(payload))?)
}

/// Replace `{{workspace}}` in every string of a JSON value.
fn substitute(value: &Value, workspace: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace("{{workspace}}", workspace)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, workspace)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, workspace)))
                .collect(),
        ),
        other => other.clone(),
    }
}
