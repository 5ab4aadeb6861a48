#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use assistant_chat::{
    new_cancel_signal, CancelSignal, ChatConfig, PollPolicy, RunOrchestrator, ToolDispatcher,
    ToolError, ToolExecutor, ToolPolicy, TurnEvent, UnsupportedToolPolicy,
};
use assistant_service::AssistantService;

/// Executor answering from a fixed command table and recording what it ran.
#[derive(Default)]
pub struct ScriptedExecutor {
    replies: HashMap<String, String>,
    ran: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, command: &str, output: &str) -> Self {
        self.replies.insert(command.to_string(), output.to_string());
        self
    }

    pub fn ran(&self) -> Vec<String> {
        lock_unpoisoned(&self.ran).clone()
    }
}

impl ToolExecutor for ScriptedExecutor {
    fn execute(&self, command: &str) -> Result<String, ToolError> {
        lock_unpoisoned(&self.ran).push(command.to_string());
        Ok(self.replies.get(command).cloned().unwrap_or_default())
    }
}

pub fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_secs(5)),
    }
}

pub fn tool_policy() -> ToolPolicy {
    ToolPolicy {
        timeout: Some(Duration::from_secs(5)),
        concurrency: 1,
        unsupported: UnsupportedToolPolicy::Report,
    }
}

pub fn orchestrator(
    service: Arc<dyn AssistantService>,
    executor: Arc<dyn ToolExecutor>,
    thread_id: &str,
    poll: PollPolicy,
) -> (RunOrchestrator, CancelSignal) {
    let cancel = new_cancel_signal();
    let orchestrator = RunOrchestrator::new(
        service,
        ToolDispatcher::new(executor, tool_policy()),
        thread_id,
        "asst_test",
        poll,
        Arc::clone(&cancel),
    );
    (orchestrator, cancel)
}

pub fn test_config(store_path: PathBuf) -> ChatConfig {
    ChatConfig {
        api_key: "sk-test".to_string(),
        assistant_id: "asst_test".to_string(),
        base_url: "http://127.0.0.1:9/v1".to_string(),
        store_path,
        poll: fast_poll(),
        tools: tool_policy(),
        debug: false,
    }
}

/// Texts of rendered message events, in emission order.
pub fn message_texts(events: &[TurnEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            TurnEvent::Message(message) => Some(message.text_segments().collect::<Vec<_>>().join("\n")),
            _ => None,
        })
        .collect()
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
