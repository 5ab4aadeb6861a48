//! Deterministic scripted implementation of the `assistant_service` contract.
//!
//! The mock keeps an in-memory thread with its runs and messages, advances the
//! latest run through a caller-provided poll script, and records every call so
//! tests can assert on the exact request sequence. It contains no transport
//! logic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use assistant_service::{
    AssistantService, CreateMessage, ListPage, Message, Order, Pagination, RequiredAction, Role,
    Run, RunStatus, ServiceError, Thread, ToolCall, ToolOutput,
};

const DEFAULT_PAGE_LIMIT: usize = 20;

/// Operation discriminant used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    CreateThread,
    CreateMessage,
    CreateRun,
    GetRun,
    CancelRun,
    SubmitToolOutputs,
    ListRuns,
    ListMessages,
}

/// One recorded call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    CreateThread,
    CreateMessage {
        thread_id: String,
        content: String,
    },
    CreateRun {
        thread_id: String,
        assistant_id: String,
    },
    GetRun {
        thread_id: String,
        run_id: String,
    },
    CancelRun {
        thread_id: String,
        run_id: String,
    },
    SubmitToolOutputs {
        thread_id: String,
        run_id: String,
        outputs: Vec<ToolOutput>,
    },
    ListRuns {
        thread_id: String,
        pagination: Pagination,
    },
    ListMessages {
        thread_id: String,
        pagination: Pagination,
    },
}

impl ServiceCall {
    #[must_use]
    pub fn op(&self) -> ServiceOp {
        match self {
            Self::CreateThread => ServiceOp::CreateThread,
            Self::CreateMessage { .. } => ServiceOp::CreateMessage,
            Self::CreateRun { .. } => ServiceOp::CreateRun,
            Self::GetRun { .. } => ServiceOp::GetRun,
            Self::CancelRun { .. } => ServiceOp::CancelRun,
            Self::SubmitToolOutputs { .. } => ServiceOp::SubmitToolOutputs,
            Self::ListRuns { .. } => ServiceOp::ListRuns,
            Self::ListMessages { .. } => ServiceOp::ListMessages,
        }
    }
}

/// State the latest run moves to on the next `get_run`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollStep {
    pub status: RunStatus,
    pub tool_calls: Vec<ToolCall>,
    pub reply: Option<String>,
    pub last_error: Option<String>,
}

impl PollStep {
    #[must_use]
    pub fn status(status: RunStatus) -> Self {
        Self {
            status,
            tool_calls: Vec::new(),
            reply: None,
            last_error: None,
        }
    }

    /// Completes the run and appends an assistant reply to the thread.
    #[must_use]
    pub fn completed_with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::status(RunStatus::Completed)
        }
    }

    #[must_use]
    pub fn requires_action(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::status(RunStatus::RequiresAction)
        }
    }

    #[must_use]
    pub fn failed(last_error: impl Into<String>) -> Self {
        Self {
            last_error: Some(last_error.into()),
            ..Self::status(RunStatus::Failed)
        }
    }
}

#[derive(Debug)]
struct ScriptState {
    next_id: u64,
    clock: i64,
    threads: Vec<Thread>,
    runs: Vec<Run>,
    messages: Vec<Message>,
    poll_script: VecDeque<PollStep>,
    status_after_create: RunStatus,
    status_after_submit: RunStatus,
    failures: HashMap<ServiceOp, ServiceError>,
    calls: Vec<ServiceCall>,
}

impl ScriptState {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}_{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn record(&mut self, call: ServiceCall) -> Result<(), ServiceError> {
        let op = call.op();
        self.calls.push(call);
        match self.failures.remove(&op) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn run_mut(&mut self, thread_id: &str, run_id: &str) -> Result<&mut Run, ServiceError> {
        self.runs
            .iter_mut()
            .find(|run| run.id == run_id && run.thread_id == thread_id)
            .ok_or_else(|| ServiceError::Status {
                status: 404,
                message: format!("No run found with id '{run_id}'."),
            })
    }

    fn push_message(
        &mut self,
        thread_id: &str,
        role: Role,
        text: &str,
        run_id: Option<String>,
    ) -> Message {
        let id = self.next_id("msg");
        let mut message = Message::text(id, thread_id, role, text);
        message.created_at = self.tick();
        message.run_id = run_id;
        self.messages.push(message.clone());
        message
    }
}

/// Scripted in-memory assistant service.
#[derive(Debug)]
pub struct ScriptedService {
    state: Mutex<ScriptState>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                next_id: 1,
                clock: 1_700_000_000,
                threads: Vec::new(),
                runs: Vec::new(),
                messages: Vec::new(),
                poll_script: VecDeque::new(),
                status_after_create: RunStatus::Queued,
                status_after_submit: RunStatus::Queued,
                failures: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Seeds an existing run as the newest run of its thread.
    #[must_use]
    pub fn with_run(self, run: Run) -> Self {
        lock_unpoisoned(&self.state).runs.push(run);
        self
    }

    /// Seeds an existing message as the newest message of its thread.
    #[must_use]
    pub fn with_message(self, thread_id: &str, role: Role, text: &str) -> Self {
        lock_unpoisoned(&self.state).push_message(thread_id, role, text, None);
        self
    }

    /// Appends one step to the poll script consumed by `get_run`.
    #[must_use]
    pub fn then_poll(self, step: PollStep) -> Self {
        lock_unpoisoned(&self.state).poll_script.push_back(step);
        self
    }

    #[must_use]
    pub fn with_status_after_create(self, status: RunStatus) -> Self {
        lock_unpoisoned(&self.state).status_after_create = status;
        self
    }

    #[must_use]
    pub fn with_status_after_submit(self, status: RunStatus) -> Self {
        lock_unpoisoned(&self.state).status_after_submit = status;
        self
    }

    /// Makes the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: ServiceOp, error: ServiceError) {
        lock_unpoisoned(&self.state).failures.insert(op, error);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        lock_unpoisoned(&self.state).calls.clone()
    }

    #[must_use]
    pub fn count(&self, op: ServiceOp) -> usize {
        lock_unpoisoned(&self.state)
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Every submitted output batch, in submission order.
    #[must_use]
    pub fn submitted_batches(&self) -> Vec<Vec<ToolOutput>> {
        lock_unpoisoned(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                ServiceCall::SubmitToolOutputs { outputs, .. } => Some(outputs.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn runs(&self) -> Vec<Run> {
        lock_unpoisoned(&self.state).runs.clone()
    }

    /// Messages oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock_unpoisoned(&self.state).messages.clone()
    }

    #[must_use]
    pub fn remaining_poll_steps(&self) -> usize {
        lock_unpoisoned(&self.state).poll_script.len()
    }
}

impl AssistantService for ScriptedService {
    fn create_thread(&self) -> Result<Thread, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::CreateThread)?;
        let thread = Thread {
            id: state.next_id("thread"),
            created_at: state.tick(),
        };
        state.threads.push(thread.clone());
        Ok(thread)
    }

    fn create_message(
        &self,
        thread_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::CreateMessage {
            thread_id: thread_id.to_string(),
            content: message.content.clone(),
        })?;
        Ok(state.push_message(thread_id, message.role, &message.content, None))
    }

    fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::CreateRun {
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
        })?;
        let id = state.next_id("run");
        let mut run = Run::new(id, thread_id, state.status_after_create);
        run.assistant_id = assistant_id.to_string();
        run.created_at = state.tick();
        state.runs.push(run.clone());
        Ok(run)
    }

    fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::GetRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        })?;

        let Some(step) = state.poll_script.pop_front() else {
            return Ok(state.run_mut(thread_id, run_id)?.clone());
        };

        let now = state.tick();
        if let Some(reply) = step.reply.as_deref() {
            state.push_message(thread_id, Role::Assistant, reply, Some(run_id.to_string()));
        }
        let run = state.run_mut(thread_id, run_id)?;
        run.status = step.status;
        run.required_action = if step.tool_calls.is_empty() {
            None
        } else {
            Some(RequiredAction::submit_tool_outputs(step.tool_calls))
        };
        run.last_error = step.last_error.map(serde_json::Value::String);
        match step.status {
            RunStatus::Completed => run.completed_at = Some(now),
            RunStatus::Failed => run.failed_at = Some(now),
            RunStatus::Cancelled => run.cancelled_at = Some(now),
            RunStatus::Expired => run.expired_at = Some(now),
            _ => {}
        }
        Ok(run.clone())
    }

    fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::CancelRun {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        })?;
        let run = state.run_mut(thread_id, run_id)?;
        if run.status.is_terminal() {
            return Err(ServiceError::Status {
                status: 400,
                message: format!("Cannot cancel run with status '{}'.", run.status),
            });
        }
        run.status = RunStatus::Cancelling;
        Ok(run.clone())
    }

    fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::SubmitToolOutputs {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            outputs: outputs.to_vec(),
        })?;
        let next_status = state.status_after_submit;
        let run = state.run_mut(thread_id, run_id)?;
        if run.status != RunStatus::RequiresAction {
            return Err(ServiceError::Status {
                status: 400,
                message: format!(
                    "Runs in status '{}' do not accept tool outputs.",
                    run.status
                ),
            });
        }
        run.status = next_status;
        run.required_action = None;
        Ok(run.clone())
    }

    fn list_runs(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Run>, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::ListRuns {
            thread_id: thread_id.to_string(),
            pagination: pagination.clone(),
        })?;
        let runs = state
            .runs
            .iter()
            .filter(|run| run.thread_id == thread_id)
            .cloned()
            .collect();
        Ok(page(runs, pagination, |run: &Run| run.id.clone()))
    }

    fn list_messages(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Message>, ServiceError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record(ServiceCall::ListMessages {
            thread_id: thread_id.to_string(),
            pagination: pagination.clone(),
        })?;
        let messages = state
            .messages
            .iter()
            .filter(|message| message.thread_id == thread_id)
            .cloned()
            .collect();
        Ok(page(messages, pagination, |message: &Message| {
            message.id.clone()
        }))
    }
}

/// Orders `items` (oldest first) per `pagination`; the service defaults to newest first.
fn page<T>(
    mut items: Vec<T>,
    pagination: &Pagination,
    id_of: impl Fn(&T) -> String,
) -> ListPage<T> {
    if pagination.order.unwrap_or(Order::Desc) == Order::Desc {
        items.reverse();
    }
    if let Some(after) = pagination.after.as_deref() {
        if let Some(position) = items.iter().position(|item| id_of(item) == after) {
            items.drain(..=position);
        }
    }

    let limit = pagination
        .limit
        .map(|limit| limit as usize)
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_PAGE_LIMIT);
    let has_more = items.len() > limit;
    items.truncate(limit);

    ListPage {
        first_id: items.first().map(&id_of),
        last_id: items.last().map(&id_of),
        has_more,
        data: items,
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
