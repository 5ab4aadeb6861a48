//! Local execution of the assistant's `terminal` tool calls.

use std::io::{self, PipeReader, Read};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use assistant_service::{ToolCall, ToolOutput};
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::config::{ToolPolicy, UnsupportedToolPolicy};

pub const DEFAULT_SHELL: &str = "bash";
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Local failures that prevent a command from producing any output at all.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for shell command: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
}

/// Runs one shell command and returns its combined output.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, command: &str) -> Result<String, ToolError>;
}

/// Executes commands with `<shell> -c`, capturing stdout and stderr interleaved as written.
#[derive(Debug, Clone)]
pub struct ShellToolExecutor {
    shell: PathBuf,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl Default for ShellToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            timeout: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// Starts the command in its own process group with stdout and stderr sharing one pipe.
    fn spawn(&self, command: &str) -> Result<(Child, PipeReader), ToolError> {
        let spawn_error = |source| ToolError::Spawn {
            shell: self.shell.display().to_string(),
            source,
        };
        let (reader, writer) = io::pipe().map_err(spawn_error)?;
        let stderr_writer = writer.try_clone().map_err(spawn_error)?;

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .process_group(0)
            .spawn()
            .map_err(spawn_error)?;
        Ok((child, reader))
    }
}

impl ToolExecutor for ShellToolExecutor {
    fn execute(&self, command: &str) -> Result<String, ToolError> {
        tracing::debug!(command, "running terminal tool call");
        let (mut child, pipe) = self.spawn(command)?;

        // The pipe drains while the child runs so a chatty command cannot block on a full pipe.
        let reader = drain_pipe(pipe);

        let (status, timed_out) = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout) {
                Ok(Some(status)) => (status, false),
                Ok(None) => {
                    kill_process_group(&mut child);
                    let status = child.wait().map_err(|source| ToolError::Wait { source })?;
                    (status, true)
                }
                Err(source) => {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    return Err(ToolError::Wait { source });
                }
            },
            None => (
                child.wait().map_err(|source| ToolError::Wait { source })?,
                false,
            ),
        };

        let mut content = String::from_utf8_lossy(&join_reader(reader)).into_owned();

        let trailer = match (timed_out, self.timeout) {
            (true, Some(timeout)) => Some(format!("[timed out after {}s]", timeout.as_secs())),
            _ => format_exit_status(status),
        };
        if let Some(trailer) = trailer {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&trailer);
        }

        tracing::debug!(
            exit_code = status.code(),
            timed_out,
            bytes = content.len(),
            "terminal tool call finished"
        );
        Ok(truncate_to_byte_limit(content, self.max_output_bytes))
    }
}

/// Turns a required-action batch into the outputs submitted back to the run.
#[derive(Clone)]
pub struct ToolDispatcher {
    executor: Arc<dyn ToolExecutor>,
    policy: ToolPolicy,
}

enum Planned<'a> {
    Execute { call: &'a ToolCall, command: String },
    Ready(ToolOutput),
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(executor: Arc<dyn ToolExecutor>, policy: ToolPolicy) -> Self {
        Self { executor, policy }
    }

    /// Returns one output per answered call, in the order the calls were given.
    ///
    /// `on_start` fires just before each shell command runs. With fan-out it fires for
    /// a whole worker chunk before that chunk starts.
    pub fn dispatch(
        &self,
        calls: &[ToolCall],
        on_start: &mut dyn FnMut(&ToolCall, &str),
    ) -> Result<Vec<ToolOutput>, ToolError> {
        let mut planned = Vec::with_capacity(calls.len());
        for call in calls {
            if !call.is_shell() {
                match self.policy.unsupported {
                    UnsupportedToolPolicy::Report => {
                        tracing::warn!(tool = %call.function.name, "unsupported tool call");
                        planned.push(Planned::Ready(ToolOutput::new(
                            call.id.clone(),
                            format!("unsupported tool: {}", call.function.name),
                        )));
                    }
                    UnsupportedToolPolicy::Skip => {
                        tracing::warn!(tool = %call.function.name, "skipping unsupported tool call");
                    }
                }
                continue;
            }

            match call.shell_command() {
                Ok(command) => planned.push(Planned::Execute { call, command }),
                Err(error) => {
                    tracing::warn!(call_id = %call.id, %error, "malformed terminal arguments");
                    planned.push(Planned::Ready(ToolOutput::new(
                        call.id.clone(),
                        format!("invalid arguments for terminal: {error}"),
                    )));
                }
            }
        }

        let executed = self.execute_all(&planned, on_start)?;
        let mut executed = executed.into_iter();
        let mut outputs = Vec::with_capacity(planned.len());
        for plan in planned {
            match plan {
                Planned::Ready(output) => outputs.push(output),
                Planned::Execute { call, .. } => {
                    if let Some(content) = executed.next() {
                        outputs.push(ToolOutput::new(call.id.clone(), content));
                    }
                }
            }
        }
        Ok(outputs)
    }

    fn execute_all(
        &self,
        planned: &[Planned<'_>],
        on_start: &mut dyn FnMut(&ToolCall, &str),
    ) -> Result<Vec<String>, ToolError> {
        let commands: Vec<(&ToolCall, &str)> = planned
            .iter()
            .filter_map(|plan| match plan {
                Planned::Execute { call, command } => Some((*call, command.as_str())),
                Planned::Ready(_) => None,
            })
            .collect();

        if self.policy.concurrency <= 1 || commands.len() <= 1 {
            let mut results = Vec::with_capacity(commands.len());
            for (call, command) in commands {
                on_start(call, command);
                results.push(self.executor.execute(command)?);
            }
            return Ok(results);
        }

        let mut results = Vec::with_capacity(commands.len());
        for chunk in commands.chunks(self.policy.concurrency) {
            for (call, command) in chunk {
                on_start(call, command);
            }
            let chunk_results = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|(_, command)| {
                        let executor = Arc::clone(&self.executor);
                        scope.spawn(move || executor.execute(command))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| match handle.join() {
                        Ok(result) => result,
                        Err(panic) => std::panic::resume_unwind(panic),
                    })
                    .collect::<Vec<_>>()
            });
            results.extend(chunk_results);
        }
        results.into_iter().collect()
    }
}

fn drain_pipe(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        bytes
    })
}

fn join_reader(reader: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    reader.join().unwrap_or_default()
}

/// Kills the shell and everything it started, so no grandchild keeps the pipe open.
fn kill_process_group(child: &mut Child) {
    let killed = libc::pid_t::try_from(child.id())
        .map(|pgid| unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0)
        .unwrap_or(false);
    if !killed {
        let _ = child.kill();
    }
}

fn truncate_to_byte_limit(content: String, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content;
    }

    let mut cutoff = max_bytes;
    while cutoff > 0 && !content.is_char_boundary(cutoff) {
        cutoff -= 1;
    }

    let mut truncated = content[..cutoff].to_string();
    truncated.push_str("\n[truncated]");
    truncated
}

fn format_exit_status(status: ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }
    Some(match status.code() {
        Some(code) => format!("[exit status: {code}]"),
        None => "[terminated by signal]".to_string(),
    })
}
