use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_BASE_URL;

/// Default `OpenAI-Beta` header value selecting the assistants protocol revision.
pub const DEFAULT_ASSISTANTS_BETA: &str = "assistants=v2";

/// Transport configuration for assistants API requests.
#[derive(Debug, Clone)]
pub struct AssistantsApiConfig {
    /// Bearer token passed to `Authorization`.
    pub api_key: String,
    /// Base URL for the versioned API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Value of the `OpenAI-Beta` header.
    pub beta: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
    /// Echo every request URL plus request/response bodies to stderr.
    pub trace: bool,
}

impl Default for AssistantsApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            beta: DEFAULT_ASSISTANTS_BETA.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
            trace: false,
        }
    }
}

impl AssistantsApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_beta(mut self, beta: impl Into<String>) -> Self {
        self.beta = beta.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
