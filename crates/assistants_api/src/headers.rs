use std::collections::BTreeMap;

use crate::config::AssistantsApiConfig;
use crate::error::AssistantsApiError;

pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_OPENAI_BETA: &str = "OpenAI-Beta";
pub const HEADER_USER_AGENT: &str = "User-Agent";

/// Build a deterministic header map for assistants API requests.
pub fn build_headers(
    config: &AssistantsApiConfig,
) -> Result<BTreeMap<String, String>, AssistantsApiError> {
    let mut headers = BTreeMap::new();

    if config.api_key.trim().is_empty() {
        return Err(AssistantsApiError::MissingApiKey);
    }

    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {}", config.api_key.trim()),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    if !config.beta.trim().is_empty() {
        headers.insert(HEADER_OPENAI_BETA.to_owned(), config.beta.trim().to_owned());
    }

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

fn default_user_agent() -> String {
    format!(
        "assistant-chat/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
