//! spintest: scripted end-to-end scenarios for the `spinal` binary.
//!
//! ```bash
//! spintest run tests/                 # every *.yaml in the directory
//! spintest run -v tests/fail_open.yaml
//! spintest validate tests/
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

mod assertions;
mod environment;
mod runner;
mod script;

use environment::TestEnvironment;
use runner::StepResult;
use script::{Step, StepKind, TestScript};

#[derive(Parser, Debug)]
#[command(name = "spintest", about = "Run YAML hook scenarios against spinal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script, or every script in a directory
    Run {
        path: PathBuf,

        /// Print each step's exit code, stdout and stderr
        #[arg(short, long)]
        verbose: bool,

        /// spinal binary to test (defaults to the one next to spintest)
        #[arg(long)]
        spinal_bin: Option<PathBuf>,
    },

    /// Check scripts for structural errors without running them
    Validate { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            path,
            verbose,
            spinal_bin,
        } => cmd_run(&path, verbose, spinal_bin),
        Commands::Validate { path } => cmd_validate(&path),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Pass/fail counts across scripts.
#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    passed: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, ok: bool) {
        if ok {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    fn absorb(&mut self, other: Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
    }

    fn ok(&self) -> bool {
        self.failed == 0
    }
}

fn cmd_run(path: &Path, verbose: bool, spinal_bin: Option<PathBuf>) -> Result<bool> {
    let spinal_bin = match spinal_bin {
        Some(p) => p,
        None => runner::find_spinal_binary()?,
    };
    eprintln!("spinal: {}", spinal_bin.display());

    let mut total = Tally::default();
    for script_path in collect_scripts(path)? {
        let script = load_valid(&script_path)?;
        eprintln!("\n{} ({})", script.meta.name, script_path.display());
        let tally = run_script(&spinal_bin, &script, verbose)?;
        eprintln!("  {}", if tally.ok() { "ok" } else { "FAILED" });
        total.absorb(tally);
    }

    eprintln!("\n{} steps passed, {} failed", total.passed, total.failed);
    Ok(total.ok())
}

/// Run every step of one script against a fresh workspace.
fn run_script(spinal_bin: &Path, script: &TestScript, verbose: bool) -> Result<Tally> {
    let env = TestEnvironment::setup(&script.workspace)
        .with_context(|| format!("setting up workspace for {}", script.meta.name))?;

    let mut tally = Tally::default();
    for (i, step) in script.steps.iter().enumerate() {
        let label = format!("  [{}] {}", i + 1, step.name);
        let result = match run_step(spinal_bin, &env, step) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("{label}  ERROR: {:#}", e);
                tally.record(false);
                continue;
            }
        };

        let assertion = assertions::check(&step.expect, &result, &env.workspace_dir);
        tally.record(assertion.passed);
        if assertion.passed {
            eprintln!("{label}  pass");
        } else {
            eprintln!("{label}  FAIL");
            for failure in &assertion.failures {
                eprintln!("      {}", failure);
            }
        }
        if verbose {
            print_result(&result);
        }
    }
    Ok(tally)
}

fn run_step(spinal_bin: &Path, env: &TestEnvironment, step: &Step) -> Result<StepResult> {
    match step.kind() {
        StepKind::Hook => runner::run_hook(spinal_bin, env, step),
        StepKind::Command(args) => runner::run_command(spinal_bin, env, args),
        StepKind::Shell(script) => runner::run_shell(env, script),
    }
}

fn print_result(result: &StepResult) {
    eprintln!("      exit {}", result.exit_code);
    for (label, text) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
        if !text.trim().is_empty() {
            eprintln!("      {label}: {}", text.trim());
        }
    }
}

fn cmd_validate(path: &Path) -> Result<bool> {
    let mut ok = true;
    for script_path in collect_scripts(path)? {
        match load_valid(&script_path) {
            Ok(script) => eprintln!("{}: {} steps", script_path.display(), script.steps.len()),
            Err(e) => {
                ok = false;
                eprintln!("{}: {:#}", script_path.display(), e);
            }
        }
    }
    Ok(ok)
}

/// Parse a script and reject it when any step is structurally invalid.
fn load_valid(path: &Path) -> Result<TestScript> {
    let script =
        TestScript::from_file(path).with_context(|| format!("parsing {}", path.display()))?;
    let errors = script.validate();
    if !errors.is_empty() {
        bail!("{}", errors.join("; "));
    }
    Ok(script)
}

/// A single script, or the sorted `*.yaml`/`*.yml` files of a directory.
fn collect_scripts(path: &Path) -> Result<Vec<PathBuf>> {
    let scripts = if path.is_dir() {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("reading directory {}", path.display()))?
        {
            let p = entry?.path();
            if p.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
                found.push(p);
            }
        }
        found.sort();
        found
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        bail!("{} does not exist", path.display());
    };

    if scripts.is_empty() {
        bail!("no scripts found in {}", path.display());
    }
    Ok(scripts)
}
