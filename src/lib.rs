//! Interactive terminal client for an assistant service.
//!
//! One persisted thread per working directory. Every turn asks the service for
//! the latest run on that thread, waits while it is busy, runs requested
//! `terminal` tool calls locally and submits their output, then prints the
//! messages that arrived since the previous turn. The operator is prompted only
//! once the run has completed (or when no run exists yet).
//!
//! # Layout
//! - [`orchestrator::RunOrchestrator`] owns the per-turn decision loop.
//! - [`tools`] executes shell commands and builds tool-output batches.
//! - [`session::ChatSession`] binds the orchestrator to operator I/O and the thread store.
//! - [`render`] formats transcript lines; [`config`] and [`logging`] are process setup.

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod tools;

pub use crate::cancel::{new_cancel_signal, CancelSignal};
pub use crate::config::{
    working_dir, ChatConfig, ConfigError, PollPolicy, ToolPolicy, UnsupportedToolPolicy,
};
pub use crate::error::ChatError;
pub use crate::orchestrator::{RunOrchestrator, TurnEvent, TurnOutcome};
pub use crate::render::{Palette, RenderCursor};
pub use crate::session::{ChatSession, SessionEnd, EXIT_TOKEN};
pub use crate::tools::{ShellToolExecutor, ToolDispatcher, ToolError, ToolExecutor};
