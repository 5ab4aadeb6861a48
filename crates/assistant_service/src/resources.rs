use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Function name of the only host capability the chat client executes.
pub const SHELL_TOOL_NAME: &str = "terminal";

/// Persistent conversation context on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub created_at: i64,
}

/// Closed set of run states reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// Returns true while the run still needs polling rather than action or input.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    /// Returns true for states the run can never leave.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Failed | Self::Completed | Self::Expired
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, exactly as the agent produced it.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ShellArguments {
    command: String,
}

impl ToolCall {
    #[must_use]
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.to_string(),
            },
        }
    }

    /// Builds a shell-capability call carrying `command`.
    #[must_use]
    pub fn shell(id: impl Into<String>, command: &str) -> Self {
        Self::function(id, SHELL_TOOL_NAME, serde_json::json!({ "command": command }))
    }

    #[must_use]
    pub fn is_shell(&self) -> bool {
        self.function.name == SHELL_TOOL_NAME
    }

    /// Decodes the `command` argument of a shell-capability call.
    pub fn shell_command(&self) -> Result<String, serde_json::Error> {
        serde_json::from_str::<ShellArguments>(&self.function.arguments).map(|args| args.command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub submit_tool_outputs: SubmitToolOutputs,
}

impl RequiredAction {
    #[must_use]
    pub fn submit_tool_outputs(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            action_type: "submit_tool_outputs".to_string(),
            submit_tool_outputs: SubmitToolOutputs { tool_calls },
        }
    }
}

/// Captured result answering one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    #[must_use]
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// One asynchronous unit of agent work against a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub failed_at: Option<i64>,
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    #[serde(default)]
    pub expired_at: Option<i64>,
    /// Opaque service diagnostic; carried for display only.
    #[serde(default)]
    pub last_error: Option<Value>,
}

impl Run {
    #[must_use]
    pub fn new(id: impl Into<String>, thread_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            assistant_id: String::new(),
            status,
            created_at: 0,
            required_action: None,
            started_at: None,
            expires_at: None,
            completed_at: None,
            failed_at: None,
            cancelled_at: None,
            expired_at: None,
            last_error: None,
        }
    }

    /// Tool calls requested by the run, empty unless it requires action.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .map(|action| action.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or(&[])
    }

    /// Human-readable form of `last_error`.
    #[must_use]
    pub fn last_error_text(&self) -> Option<String> {
        match self.last_error.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Value>,
}

/// One ordered content segment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl MessageContent {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: Some(TextContent {
                value: value.into(),
                annotations: Vec::new(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

impl Message {
    #[must_use]
    pub fn text(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: Role,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            content: vec![MessageContent::text(text)],
            created_at: 0,
            assistant_id: None,
            run_id: None,
        }
    }

    /// Literal text of every text segment, in segment order.
    pub fn text_segments(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .filter_map(|segment| segment.text.as_ref())
            .map(|text| text.value.as_str())
    }
}

/// Request body for posting a message on a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateMessage {
    pub role: Role,
    pub content: String,
}

impl CreateMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One page of a list endpoint, in the order the service delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> ListPage<T> {
    #[must_use]
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            first_id: None,
            last_id: None,
            has_more: false,
        }
    }
}
