//! Event routing and per-event hook handlers.
//!
//! [`respond`] is the single entry point: it decodes the event, runs its
//! handler, and turns any error or panic into the event family's fail-open
//! response. Handlers themselves only decide.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brain_config::io::{read_fail_open, write_atomic};
use brain_config::{BrainSnapshot, ConfigLoader, resolve_workspace_root};
use chrono::{DateTime, Utc};
use tracing::{Level, debug, error, info, instrument, warn};

use crate::cortex::{CortexInput, build_additional_context, build_cortex_yaml, build_triage_context};
use crate::hooks::{HookEvent, HookOutput, HookRequest, Permission, SessionEnv, extract_tool_path};
use crate::pulse::Pulse;
use crate::reflex::{Decision, MCP_DENY_REASON, ReflexCategory, ReflexEngine, mcp_subject};
use crate::settings::SpinalSettings;
use crate::state::{NotificationKind, SessionStateStore};
use crate::triage::{self, Grade};

const SHELL_AGENT_MESSAGE: &str = "Inhibition reflex: shell execution denied by _brain reflexes.";
const MCP_AGENT_MESSAGE: &str = "Inhibition reflex: MCP execution denied by _brain reflexes.";

/// Per-invocation context: where the workspace is and how it is configured.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub workspace_root: PathBuf,
    pub settings: SpinalSettings,
    pub loader: ConfigLoader,
    pub session_id: Option<String>,
    pub now: DateTime<Utc>,
}

impl HookContext {
    /// Build the context for a request. `workspace_override` wins over the
    /// request's `workspace_roots`.
    pub fn from_request(req: &HookRequest, workspace_override: Option<&Path>) -> Self {
        let workspace_root = match workspace_override {
            Some(root) => root.to_path_buf(),
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                let brain_root = SpinalSettings::base().brain_root;
                resolve_workspace_root(&req.workspace_roots, &brain_root, &cwd)
            }
        };
        let mut ctx = Self::for_workspace(workspace_root);
        ctx.session_id = req.session_key().map(str::to_string);
        ctx
    }

    pub fn for_workspace(workspace_root: PathBuf) -> Self {
        let settings = SpinalSettings::load(&workspace_root);
        let loader = ConfigLoader::new(workspace_root.clone(), settings.layout());
        Self {
            workspace_root,
            settings,
            loader,
            session_id: None,
            now: Utc::now(),
        }
    }

    pub fn pulse(&self, snapshot: &BrainSnapshot) -> Pulse {
        Pulse::compute(
            snapshot,
            &self.workspace_root,
            self.settings.vitals_stale_days,
            self.now,
        )
    }

    pub fn reflex_engine(&self) -> ReflexEngine {
        ReflexEngine::new(&self.loader.load_homeostasis().parsed.reflexes)
    }

    fn open_state(&self) -> SessionStateStore {
        SessionStateStore::open(&self.settings.state_file(&self.workspace_root))
    }
}

/// Handle one request end to end. Never fails.
#[instrument(level = Level::TRACE, skip(req))]
pub fn respond(
    req: &HookRequest,
    forced_event: Option<&str>,
    workspace_override: Option<&Path>,
) -> HookOutput {
    let event = req.event(forced_event);
    fail_open(&event, || {
        let ctx = HookContext::from_request(req, workspace_override);
        dispatch(&event, req, &ctx)
    })
}

/// Run `handler`, mapping an error or a panic to the event's fail-open output.
fn fail_open(event: &HookEvent, handler: impl FnOnce() -> Result<HookOutput>) -> HookOutput {
    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            error!(event = event.name(), error = ?e, "Hook handler failed; failing open");
            event.fail_open()
        }
        Err(_) => {
            error!(event = event.name(), "Hook handler panicked; failing open");
            event.fail_open()
        }
    }
}

/// Route an event to its handler.
pub fn dispatch(event: &HookEvent, req: &HookRequest, ctx: &HookContext) -> Result<HookOutput> {
    match event {
        HookEvent::SessionStart => handle_session_start(ctx),
        HookEvent::BeforeSubmitPrompt => handle_before_submit_prompt(req, ctx),
        HookEvent::PreCompact => Ok(handle_pre_compact(ctx)),
        HookEvent::BeforeReadFile { file_path } => {
            Ok(handle_before_read_file(file_path.as_deref(), ctx))
        }
        HookEvent::PreToolUse {
            tool_name,
            tool_input,
        } => Ok(handle_pre_tool_use(
            tool_name.as_deref(),
            extract_tool_path(tool_input),
            ctx,
        )),
        HookEvent::AfterFileEdit { file_path } => {
            Ok(handle_after_file_edit(file_path.as_deref(), ctx))
        }
        HookEvent::BeforeShellExecution { command } => {
            Ok(handle_before_shell_execution(command, ctx))
        }
        HookEvent::BeforeMcpExecution {
            tool_name,
            command,
            url,
            tool_input,
        } => {
            let subject = mcp_subject(
                tool_name.as_deref(),
                command.as_deref(),
                url.as_deref(),
                tool_input,
            );
            Ok(handle_before_mcp_execution(&subject, ctx))
        }
        HookEvent::Unknown(name) => {
            debug!(event = %name, "Ignoring unrecognized hook event");
            Ok(HookOutput::empty())
        }
    }
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

struct Refreshed {
    snapshot: BrainSnapshot,
    pulse: Pulse,
    changed: bool,
}

impl Refreshed {
    fn cortex_input<'a>(&'a self, source: &'a str) -> CortexInput<'a> {
        let parsed = &self.snapshot.homeostasis.parsed;
        CortexInput {
            mindset: &parsed.mindset,
            reflexes: &parsed.reflexes,
            hash: &self.snapshot.homeostasis.hash,
            pulse: &self.pulse,
            source,
        }
    }
}

/// Reload the brain and regenerate the cortex artifact when the hash or
/// session changed. The session record is only updated once the cortex is on
/// disk.
#[instrument(level = Level::TRACE, skip(ctx, store))]
fn refresh_cortex(ctx: &HookContext, store: &mut SessionStateStore) -> Result<Refreshed> {
    let snapshot = ctx.loader.load();
    let pulse = ctx.pulse(&snapshot);
    let session = ctx.session_id.as_deref();
    let changed = store.needs_refresh(session, &snapshot.homeostasis.hash);
    let refreshed = Refreshed {
        snapshot,
        pulse,
        changed,
    };

    if changed {
        let source = ctx.loader.layout().homeostasis_rel();
        let cortex_path = ctx.settings.cortex_file(&ctx.workspace_root);
        let yaml = build_cortex_yaml(&refreshed.cortex_input(&source));
        write_atomic(&cortex_path, &yaml)
            .with_context(|| format!("writing cortex to {}", cortex_path.display()))?;
        info!(path = %cortex_path.display(), "Regenerated cortex");
    }
    store.mark_injected(session, &refreshed.snapshot.homeostasis.hash);
    Ok(refreshed)
}

/// Inject the full context and export the brain paths.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_session_start(ctx: &HookContext) -> Result<HookOutput> {
    let mut store = ctx.open_state();
    let refreshed = refresh_cortex(ctx, &mut store)?;
    let source = ctx.loader.layout().homeostasis_rel();

    let mut output = HookOutput::continue_execution().with_user_message(&refreshed.pulse.one_line);
    output.env = Some(SessionEnv {
        homeostasis_hash: refreshed.snapshot.homeostasis.hash.clone(),
        homeostasis_path: ctx.loader.homeostasis_path().display().to_string(),
        cortex_path: ctx
            .settings
            .cortex_file(&ctx.workspace_root)
            .display()
            .to_string(),
        vitals_path: ctx.loader.vitals_path().display().to_string(),
    });
    output.push_context(&build_additional_context(&refreshed.cortex_input(&source)));

    info!(
        session = ?ctx.session_id,
        alerts = refreshed.pulse.alerts.len(),
        "Session started"
    );
    Ok(output)
}

/// Re-inject context when the brain changed, add prompt triage, and surface
/// attention and skeletal-triage notices once per session.
#[instrument(level = Level::TRACE, skip(req, ctx))]
pub fn handle_before_submit_prompt(req: &HookRequest, ctx: &HookContext) -> Result<HookOutput> {
    let mut store = ctx.open_state();
    let refreshed = refresh_cortex(ctx, &mut store)?;
    let session = ctx.session_id.as_deref();
    let mut output = HookOutput::continue_execution();

    if refreshed.changed {
        let source = ctx.loader.layout().homeostasis_rel();
        output.push_context(&build_additional_context(&refreshed.cortex_input(&source)));
    }

    let triage = triage::classify(&req.fields, &refreshed.snapshot.homeostasis.parsed.triage);
    if triage.prompt_available {
        output.push_context(&build_triage_context(&triage));
    }

    if let (Some(message), Some(hash)) = (
        refreshed.pulse.attention_message.as_deref(),
        refreshed.pulse.attention_hash.as_deref(),
    ) && store.should_emit_once(session, NotificationKind::Attention, hash)
    {
        output.push_user_message(message);
    }

    if triage.grade == Grade::A
        && store.should_emit_once(session, NotificationKind::Triage, &triage.notice_hash())
    {
        info!(reason = %triage.reason, "Skeletal prompt triaged");
        output.push_user_message(&triage.notice());
    }

    Ok(output)
}

/// Remind the user to restart when the cortex may be stale after compaction.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_pre_compact(ctx: &HookContext) -> HookOutput {
    let cortex_path = ctx.settings.cortex_file(&ctx.workspace_root);
    match read_fail_open(&cortex_path) {
        Some(cortex) if !cortex.is_empty() => {
            let layout = ctx.loader.layout();
            HookOutput::empty().with_user_message(format!(
                "Context compaction: _brain cortex exists. If you changed `{}` or `{}`, start a new chat to re-inject cortex.",
                layout.homeostasis_rel(),
                layout.vitals_rel()
            ))
        }
        _ => HookOutput::empty(),
    }
}

// ---------------------------------------------------------------------------
// Reflexes
// ---------------------------------------------------------------------------

/// Sensory reflex: deny reads of protected paths.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_before_read_file(file_path: Option<&str>, ctx: &HookContext) -> HookOutput {
    let Some(file_path) = file_path else {
        return HookOutput::permission(Permission::Allow);
    };
    match ctx
        .reflex_engine()
        .evaluate_path(ReflexCategory::Sensory, file_path, &ctx.workspace_root)
    {
        Decision::Deny { category, pattern } => {
            info!(path = %file_path, pattern = %pattern, "Sensory reflex denied read");
            HookOutput::permission(Permission::Deny).with_user_message(category.deny_reason())
        }
        Decision::Allow => HookOutput::permission(Permission::Allow),
    }
}

/// Motor reflex: deny write-tool calls on protected paths before they run.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_pre_tool_use(
    tool_name: Option<&str>,
    file_path: Option<&str>,
    ctx: &HookContext,
) -> HookOutput {
    let allow = || HookOutput::decision(Permission::Allow, None);
    let Some(tool_name) = tool_name.filter(|t| ctx.settings.is_write_tool(t)) else {
        return allow();
    };
    let Some(file_path) = file_path else {
        return allow();
    };
    match ctx
        .reflex_engine()
        .evaluate_path(ReflexCategory::Motor, file_path, &ctx.workspace_root)
    {
        Decision::Deny { category, pattern } => {
            info!(tool = %tool_name, path = %file_path, pattern = %pattern, "Motor reflex denied write");
            HookOutput::decision(Permission::Deny, Some(category.deny_reason().to_string()))
        }
        Decision::Allow => allow(),
    }
}

/// Advisory: a completed edit to a motor-protected path is logged, nothing
/// more. Writes are only ever stopped before they happen.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_after_file_edit(file_path: Option<&str>, ctx: &HookContext) -> HookOutput {
    if let Some(file_path) = file_path
        && let Decision::Deny { pattern, .. } =
            ctx.reflex_engine()
                .evaluate_path(ReflexCategory::Motor, file_path, &ctx.workspace_root)
    {
        warn!(path = %file_path, pattern = %pattern, "Protected file was edited");
    }
    HookOutput::empty()
}

/// Inhibition reflex for shell commands.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_before_shell_execution(command: &str, ctx: &HookContext) -> HookOutput {
    match ctx
        .reflex_engine()
        .evaluate(ReflexCategory::Inhibition, command)
    {
        Decision::Deny { category, pattern } => {
            info!(command = %command, pattern = %pattern, "Inhibition reflex denied command");
            HookOutput::permission(Permission::Deny)
                .with_user_message(category.deny_reason())
                .with_agent_message(SHELL_AGENT_MESSAGE)
        }
        Decision::Allow => HookOutput::permission(Permission::Allow),
    }
}

/// Inhibition reflex for external tool calls.
#[instrument(level = Level::TRACE, skip(ctx))]
pub fn handle_before_mcp_execution(subject: &str, ctx: &HookContext) -> HookOutput {
    match ctx
        .reflex_engine()
        .evaluate(ReflexCategory::Inhibition, subject)
    {
        Decision::Deny { pattern, .. } => {
            info!(subject = %subject, pattern = %pattern, "Inhibition reflex denied MCP call");
            HookOutput::permission(Permission::Deny)
                .with_user_message(MCP_DENY_REASON)
                .with_agent_message(MCP_AGENT_MESSAGE)
        }
        Decision::Allow => HookOutput::permission(Permission::Allow),
    }
}
