//! Spinal: reflex-policy hooks for coding agents.
//!
//! The agent host invokes `spinal hook` once per lifecycle event. Each
//! invocation reads the workspace's `_brain` documents, decides, and answers
//! with one JSON object. Nothing is cached between invocations except the
//! small session record in `.cursor/synaptic_state.json`.
//!
//! # Modules
//!
//! - [`hooks`]: input/output types for the hook protocol.
//! - [`handlers`]: the event router and its fail-open boundary.
//! - [`reflex`]: sensory, motor, and inhibition deny lists.
//! - [`pulse`]: the derived health summary and its alerts.
//! - [`state`]: persisted session state and emit-once notices.
//! - [`triage`]: prompt grading by keyword signals.
//! - [`cortex`]: the generated digest and injected context blocks.
//! - [`settings`]: layered runtime settings.
//!
//! # Example
//!
//! ```no_run
//! use spinal::handlers::respond;
//! use spinal::hooks::HookRequest;
//!
//! let request = HookRequest::from_stdin();
//! respond(&request, None, None).write_stdout().unwrap();
//! ```

pub mod cli;
pub mod cmd;
pub mod cortex;
pub mod errors;
pub mod handlers;
pub mod hooks;
pub mod pulse;
pub mod reflex;
pub mod settings;
pub mod state;
pub mod style;
pub mod tracing_init;
pub mod triage;
pub mod version;
