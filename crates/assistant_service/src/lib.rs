//! Provider-neutral contract for a remote conversational-agent service.
//!
//! This crate defines the resource shapes exchanged with the service (threads,
//! runs, messages, tool calls) and the synchronous [`AssistantService`] trait the
//! chat orchestrator drives. It contains no transport code; see
//! `assistants_api` for the HTTP implementation and `assistant_service_mock`
//! for a scripted one.

mod pagination;
mod resources;

use thiserror::Error;

pub use pagination::{Order, Pagination};
pub use resources::{
    CreateMessage, FunctionCall, ListPage, Message, MessageContent, RequiredAction, Role, Run,
    RunStatus, SubmitToolOutputs, TextContent, Thread, ToolCall, ToolOutput, SHELL_TOOL_NAME,
};

/// Failure of one service call. Every variant is unrecoverable for that call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Minimum operation set the chat orchestrator needs from the remote service.
///
/// Calls are blocking and never retried by callers; a returned error is final.
pub trait AssistantService: Send + Sync {
    fn create_thread(&self) -> Result<Thread, ServiceError>;

    fn create_message(
        &self,
        thread_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ServiceError>;

    fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ServiceError>;

    fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError>;

    fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError>;

    /// Submits the complete output batch for a run waiting on tool calls.
    fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ServiceError>;

    fn list_runs(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Run>, ServiceError>;

    fn list_messages(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Message>, ServiceError>;
}
