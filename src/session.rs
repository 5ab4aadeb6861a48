//! Interactive chat loop bound to one persisted thread.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use assistant_service::AssistantService;
use session_store::{ThreadOrigin, ThreadStore};

use crate::cancel::CancelSignal;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::orchestrator::{RunOrchestrator, TurnEvent, TurnOutcome};
use crate::render::{Palette, BANNER, PROMPT};
use crate::tools::{ToolDispatcher, ToolExecutor};

/// Operator input that ends the session.
pub const EXIT_TOKEN: &str = "exit";

/// Why the session loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ExitToken,
    EndOfInput,
}

enum PromptReply {
    Message(String),
    Exit,
    EndOfInput,
}

pub struct ChatSession<R, W> {
    orchestrator: RunOrchestrator,
    origin: ThreadOrigin,
    input: R,
    output: W,
    palette: Palette,
}

impl<R: BufRead, W: Write> ChatSession<R, W> {
    /// Resolves the thread (persisted or newly created) and wires the orchestrator.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        config: &ChatConfig,
        service: Arc<dyn AssistantService>,
        executor: Arc<dyn ToolExecutor>,
        cancel: CancelSignal,
        input: R,
        output: W,
        palette: Palette,
    ) -> Result<Self, ChatError> {
        let store = ThreadStore::at(&config.store_path);
        let (thread, origin) =
            store.load_or_create(|| service.create_thread().map_err(ChatError::from))?;
        match origin {
            ThreadOrigin::Loaded => {
                tracing::info!(thread_id = %thread.id, path = %store.path().display(), "resuming thread")
            }
            ThreadOrigin::Created => {
                tracing::info!(thread_id = %thread.id, path = %store.path().display(), "created thread")
            }
        }

        let orchestrator = RunOrchestrator::new(
            service,
            ToolDispatcher::new(executor, config.tools),
            thread.id,
            config.assistant_id.clone(),
            config.poll,
            cancel,
        );

        Ok(Self {
            orchestrator,
            origin,
            input,
            output,
            palette,
        })
    }

    #[must_use]
    pub fn thread_id(&self) -> &str {
        self.orchestrator.thread_id()
    }

    #[must_use]
    pub fn origin(&self) -> ThreadOrigin {
        self.origin
    }

    /// Drives turns until the operator types the exit token or input ends.
    pub fn run(&mut self) -> Result<SessionEnd, ChatError> {
        writeln!(self.output, "{BANNER}")?;

        loop {
            let palette = self.palette;
            let output = &mut self.output;
            let mut write_result: io::Result<()> = Ok(());
            let outcome = self.orchestrator.run_turn(&mut |event: TurnEvent| {
                if write_result.is_ok() {
                    write_result = write_event(&mut *output, palette, &event);
                }
            })?;
            write_result?;

            if outcome != TurnOutcome::ReadyToPrompt {
                continue;
            }

            match self.prompt()? {
                PromptReply::Exit => return Ok(SessionEnd::ExitToken),
                PromptReply::EndOfInput => {
                    writeln!(self.output)?;
                    return Ok(SessionEnd::EndOfInput);
                }
                PromptReply::Message(text) => {
                    self.orchestrator.submit_user_message(&text)?;
                }
            }
        }
    }

    /// Reads lines until one is non-empty; blank lines re-prompt.
    fn prompt(&mut self) -> Result<PromptReply, ChatError> {
        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(PromptReply::EndOfInput);
            }

            let text = line.trim();
            if text == EXIT_TOKEN {
                return Ok(PromptReply::Exit);
            }
            if !text.is_empty() {
                return Ok(PromptReply::Message(text.to_string()));
            }
        }
    }
}

fn write_event(output: &mut impl Write, palette: Palette, event: &TurnEvent) -> io::Result<()> {
    match palette.event_line(event) {
        Some(line) => {
            writeln!(output, "{line}")?;
            output.flush()
        }
        None => Ok(()),
    }
}

impl<R, W> std::fmt::Debug for ChatSession<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("orchestrator", &self.orchestrator)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
