//! Per-turn run lifecycle: poll the latest run, act on it, surface new messages.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use assistant_service::{
    AssistantService, CreateMessage, Message, Pagination, Run, RunStatus, ServiceError,
};

use crate::cancel::{sleep_unless_cancelled, CancelSignal};
use crate::config::PollPolicy;
use crate::error::ChatError;
use crate::render::RenderCursor;
use crate::tools::ToolDispatcher;

pub const MESSAGE_PAGE_LIMIT: u32 = 20;

/// Progress reported while a turn runs.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Polling {
        run_id: String,
        status: RunStatus,
    },
    CancelRequested {
        run_id: String,
    },
    ToolStarted {
        call_id: String,
        command: String,
    },
    OutputsSubmitted {
        run_id: String,
        count: usize,
    },
    Message(Message),
    RunEnded {
        run_id: String,
        status: RunStatus,
        last_error: Option<String>,
    },
}

/// Whether the operator should be asked for input after this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    ReadyToPrompt,
    Continue,
}

pub struct RunOrchestrator {
    service: Arc<dyn AssistantService>,
    tools: ToolDispatcher,
    thread_id: String,
    assistant_id: String,
    poll: PollPolicy,
    cancel: CancelSignal,
    cursor: RenderCursor,
    reported_terminal_run: Option<String>,
}

impl RunOrchestrator {
    #[must_use]
    pub fn new(
        service: Arc<dyn AssistantService>,
        tools: ToolDispatcher,
        thread_id: impl Into<String>,
        assistant_id: impl Into<String>,
        poll: PollPolicy,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            service,
            tools,
            thread_id: thread_id.into(),
            assistant_id: assistant_id.into(),
            poll,
            cancel,
            cursor: RenderCursor::new(),
            reported_terminal_run: None,
        }
    }

    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    #[must_use]
    pub fn cursor(&self) -> &RenderCursor {
        &self.cursor
    }

    /// Runs one turn against the latest run of the thread.
    pub fn run_turn(&mut self, emit: &mut dyn FnMut(TurnEvent)) -> Result<TurnOutcome, ChatError> {
        // An interrupt pressed at the prompt must not cancel the next run.
        self.cancel.store(false, Ordering::SeqCst);

        let latest = self
            .service
            .list_runs(&self.thread_id, &Pagination::limit(1))?
            .data
            .into_iter()
            .next();
        let Some(mut run) = latest else {
            tracing::debug!(thread_id = %self.thread_id, "no runs yet");
            return Ok(TurnOutcome::ReadyToPrompt);
        };
        tracing::debug!(run_id = %run.id, status = %run.status, "latest run");

        if run.status.is_busy() {
            run = self.wait_while_busy(run, emit)?;
        }

        let mut ended = None;
        let outcome = match run.status {
            RunStatus::RequiresAction => {
                self.submit_tool_outputs(&run, emit)?;
                TurnOutcome::Continue
            }
            RunStatus::Completed => TurnOutcome::ReadyToPrompt,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Expired => {
                if self.reported_terminal_run.as_deref() == Some(run.id.as_str()) {
                    TurnOutcome::ReadyToPrompt
                } else {
                    tracing::warn!(run_id = %run.id, status = %run.status, "run ended without completing");
                    self.reported_terminal_run = Some(run.id.clone());
                    ended = Some(TurnEvent::RunEnded {
                        run_id: run.id.clone(),
                        status: run.status,
                        last_error: run.last_error_text(),
                    });
                    TurnOutcome::Continue
                }
            }
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => {
                TurnOutcome::Continue
            }
        };

        self.render_new_messages(emit)?;
        if let Some(event) = ended {
            emit(event);
        }
        Ok(outcome)
    }

    /// Posts operator input and starts a run for the configured assistant.
    pub fn submit_user_message(&mut self, text: &str) -> Result<Run, ChatError> {
        self.service
            .create_message(&self.thread_id, &CreateMessage::user(text))?;
        let run = self
            .service
            .create_run(&self.thread_id, &self.assistant_id)?;
        tracing::debug!(run_id = %run.id, status = %run.status, "run created");
        Ok(run)
    }

    fn wait_while_busy(
        &mut self,
        mut run: Run,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<Run, ChatError> {
        let started = Instant::now();
        let mut cancel_requested = false;

        while run.status.is_busy() {
            emit(TurnEvent::Polling {
                run_id: run.id.clone(),
                status: run.status,
            });

            let mut interval = self.poll.interval;
            if let Some(timeout) = self.poll.timeout {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(ChatError::PollTimeout {
                        run_id: run.id,
                        waited,
                    });
                }
                interval = interval.min(timeout - waited);
            }

            if sleep_unless_cancelled(interval, &self.cancel) {
                self.cancel.store(false, Ordering::SeqCst);
                if cancel_requested {
                    tracing::warn!(run_id = %run.id, status = %run.status, "interrupted again while cancelling");
                    return Err(ChatError::Interrupted { run_id: run.id });
                }
                cancel_requested = true;
                self.request_cancel(&run, emit)?;
            }

            run = self.service.get_run(&self.thread_id, &run.id)?;
            tracing::debug!(run_id = %run.id, status = %run.status, "polled run");
        }

        Ok(run)
    }

    fn request_cancel(&self, run: &Run, emit: &mut dyn FnMut(TurnEvent)) -> Result<(), ChatError> {
        tracing::info!(run_id = %run.id, "cancelling run on interrupt");
        emit(TurnEvent::CancelRequested {
            run_id: run.id.clone(),
        });
        match self.service.cancel_run(&self.thread_id, &run.id) {
            Ok(_) => Ok(()),
            // The run may have left the busy set between the last poll and the cancel.
            Err(ServiceError::Status { status, message }) if status < 500 => {
                tracing::warn!(run_id = %run.id, status, %message, "cancel rejected");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    fn submit_tool_outputs(
        &self,
        run: &Run,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), ChatError> {
        let calls = run.tool_calls();
        tracing::debug!(run_id = %run.id, calls = calls.len(), "run requires action");

        let outputs = self.tools.dispatch(calls, &mut |call, command| {
            tracing::info!(call_id = %call.id, command, "executing tool call");
            emit(TurnEvent::ToolStarted {
                call_id: call.id.clone(),
                command: command.to_string(),
            });
        })?;

        self.service
            .submit_tool_outputs(&self.thread_id, &run.id, &outputs)?;
        emit(TurnEvent::OutputsSubmitted {
            run_id: run.id.clone(),
            count: outputs.len(),
        });
        Ok(())
    }

    fn render_new_messages(&mut self, emit: &mut dyn FnMut(TurnEvent)) -> Result<(), ChatError> {
        let page = self.service.list_messages(
            &self.thread_id,
            &Pagination::newest_first(MESSAGE_PAGE_LIMIT),
        )?;
        for message in self.cursor.take_unseen(&page.data) {
            emit(TurnEvent::Message(message.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("thread_id", &self.thread_id)
            .field("assistant_id", &self.assistant_id)
            .field("poll", &self.poll)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
