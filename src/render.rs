//! Transcript formatting for the interactive session.

use assistant_service::{Message, Role};

use crate::orchestrator::TurnEvent;

pub const PROMPT: &str = "You: ";
pub const BANNER: &str = "Chat with AI Assistant. Type 'exit' to end the chat.";

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

/// Role colouring, disabled when stdout is not a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, text: &str, prefix: &str, suffix: &str) -> String {
        if self.color {
            ansi_wrap(text, prefix, suffix)
        } else {
            text.to_string()
        }
    }

    fn white(&self, text: &str) -> String {
        self.paint(text, "\x1b[37m", "\x1b[39m")
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(text, "\x1b[36m", "\x1b[39m")
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(text, "\x1b[33m", "\x1b[39m")
    }

    fn red(&self, text: &str) -> String {
        self.paint(text, "\x1b[31m", "\x1b[39m")
    }

    fn dim(&self, text: &str) -> String {
        self.paint(text, "\x1b[2m", "\x1b[22m")
    }

    /// One transcript line for a message, or `None` for roles that are never shown.
    #[must_use]
    pub fn message_line(&self, message: &Message) -> Option<String> {
        let label = role_label(message.role)?;
        let text = message.text_segments().collect::<Vec<_>>().join("\n");
        let line = format!("{label} {text}");
        Some(match message.role {
            Role::System => self.white(&line),
            Role::Assistant => self.cyan(&line),
            Role::User => self.yellow(&line),
            Role::Tool => line,
        })
    }

    /// Transcript line for an orchestrator event, if it has one.
    #[must_use]
    pub fn event_line(&self, event: &TurnEvent) -> Option<String> {
        match event {
            TurnEvent::Polling { status, .. } => Some(self.dim(&format!("Polling: {status}"))),
            TurnEvent::CancelRequested { run_id } => {
                Some(self.dim(&format!("Cancelling run {run_id}...")))
            }
            TurnEvent::ToolStarted { command, .. } => Some(self.dim(&format!("$ {command}"))),
            TurnEvent::OutputsSubmitted { .. } => None,
            TurnEvent::Message(message) => self.message_line(message),
            TurnEvent::RunEnded {
                status, last_error, ..
            } => {
                let line = match last_error {
                    Some(error) => format!("Run {status}: {error}"),
                    None => format!("Run {status}."),
                };
                Some(self.red(&line))
            }
        }
    }
}

#[must_use]
pub fn role_label(role: Role) -> Option<&'static str> {
    match role {
        Role::System => Some("System:"),
        Role::Assistant => Some("Assistant:"),
        Role::User => Some("You:"),
        Role::Tool => None,
    }
}

/// Tracks the newest message already shown so each turn prints only what is new.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderCursor {
    last_rendered: Option<String>,
}

impl RenderCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_rendered(&self) -> Option<&str> {
        self.last_rendered.as_deref()
    }

    /// Takes a newest-first page and returns, oldest first, the messages newer than the cursor.
    ///
    /// When the cursor is not on the page the whole page is returned.
    pub fn take_unseen<'a>(&mut self, newest_first: &'a [Message]) -> Vec<&'a Message> {
        let unseen_count = self
            .last_rendered
            .as_deref()
            .and_then(|last| newest_first.iter().position(|message| message.id == last))
            .unwrap_or(newest_first.len());

        let unseen: Vec<&Message> = newest_first[..unseen_count].iter().rev().collect();
        if let Some(newest) = unseen.last() {
            self.last_rendered = Some(newest.id.clone());
        }
        unseen
    }
}
