//! Environment configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ASSISTANT_ID_ENV: &str = "ASSISTANT_CHAT_ASSISTANT_ID";
pub const BASE_URL_ENV: &str = "ASSISTANT_CHAT_BASE_URL";
pub const STORE_PATH_ENV: &str = "ASSISTANT_CHAT_STORE_PATH";
pub const POLL_INTERVAL_ENV: &str = "ASSISTANT_CHAT_POLL_INTERVAL_MS";
pub const POLL_TIMEOUT_ENV: &str = "ASSISTANT_CHAT_POLL_TIMEOUT_SECS";
pub const TOOL_TIMEOUT_ENV: &str = "ASSISTANT_CHAT_TOOL_TIMEOUT_SECS";
pub const TOOL_CONCURRENCY_ENV: &str = "ASSISTANT_CHAT_TOOL_CONCURRENCY";
pub const UNSUPPORTED_TOOLS_ENV: &str = "ASSISTANT_CHAT_UNSUPPORTED_TOOLS";

pub const DEFAULT_ASSISTANT_ID: &str = "asst_zE0QYAfDkGC9igpaDd0GaSx6";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{API_KEY_ENV} is not set")]
    MissingApiKey,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("cannot resolve the working directory: {0}")]
    WorkingDirectory(String),
}

/// The directory that anchors the default store path.
pub fn working_dir() -> Result<PathBuf, ConfigError> {
    env::current_dir().map_err(|error| ConfigError::WorkingDirectory(error.to_string()))
}

/// What to submit for a tool call naming a function this client cannot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedToolPolicy {
    /// Answer with an explicit "unsupported tool" output.
    Report,
    /// Leave the call out of the submitted batch.
    Skip,
}

/// Busy-run polling cadence and optional deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

/// How tool calls of one required-action batch are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolPolicy {
    pub timeout: Option<Duration>,
    pub concurrency: usize,
    pub unsupported: UnsupportedToolPolicy,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TOOL_TIMEOUT),
            concurrency: 1,
            unsupported: UnsupportedToolPolicy::Report,
        }
    }
}

/// Process configuration, resolved once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub assistant_id: String,
    pub base_url: String,
    pub store_path: PathBuf,
    pub poll: PollPolicy,
    pub tools: ToolPolicy,
    pub debug: bool,
}

impl ChatConfig {
    /// Reads the environment; `cwd` anchors the default store path.
    pub fn from_env(cwd: &Path) -> Result<Self, ConfigError> {
        let api_key = env_string_opt(API_KEY_ENV).ok_or(ConfigError::MissingApiKey)?;

        let poll = PollPolicy {
            interval: env_u64(POLL_INTERVAL_ENV)?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            timeout: env_optional_secs(POLL_TIMEOUT_ENV, DEFAULT_POLL_TIMEOUT)?,
        };

        let concurrency = match env_u64(TOOL_CONCURRENCY_ENV)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: TOOL_CONCURRENCY_ENV,
                    value: "0".to_string(),
                })
            }
            Some(value) => usize::try_from(value).map_err(|_| ConfigError::InvalidValue {
                key: TOOL_CONCURRENCY_ENV,
                value: value.to_string(),
            })?,
            None => 1,
        };

        let unsupported = match env_string_opt(UNSUPPORTED_TOOLS_ENV) {
            None => UnsupportedToolPolicy::Report,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "report" => UnsupportedToolPolicy::Report,
                "skip" => UnsupportedToolPolicy::Skip,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: UNSUPPORTED_TOOLS_ENV,
                        value,
                    })
                }
            },
        };

        Ok(Self {
            api_key,
            assistant_id: env_string_opt(ASSISTANT_ID_ENV)
                .unwrap_or_else(|| DEFAULT_ASSISTANT_ID.to_string()),
            base_url: env_string_opt(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            store_path: env_string_opt(STORE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| session_store::store_path(cwd)),
            poll,
            tools: ToolPolicy {
                timeout: env_optional_secs(TOOL_TIMEOUT_ENV, DEFAULT_TOOL_TIMEOUT)?,
                concurrency,
                unsupported,
            },
            debug: false,
        })
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_store_path(mut self, store_path: impl Into<PathBuf>) -> Self {
        self.store_path = store_path.into();
        self
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().to_string())
        }
    })
}

fn env_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    env_string_opt(key)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

/// `0` disables the limit; unset falls back to `default`.
fn env_optional_secs(key: &'static str, default: Duration) -> Result<Option<Duration>, ConfigError> {
    Ok(match env_u64(key)? {
        None => Some(default),
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
    })
}
