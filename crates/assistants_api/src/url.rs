/// Default API root for assistants endpoints.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Joins a base URL and a resource path.
///
/// Normalization rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) trailing slashes on the base and leading slashes on the path collapse to one
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = if base_url.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base_url.trim()
    };

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn threads_path() -> String {
    "threads".to_string()
}

pub fn messages_path(thread_id: &str) -> String {
    format!("threads/{thread_id}/messages")
}

pub fn runs_path(thread_id: &str) -> String {
    format!("threads/{thread_id}/runs")
}

pub fn run_path(thread_id: &str, run_id: &str) -> String {
    format!("threads/{thread_id}/runs/{run_id}")
}

pub fn cancel_run_path(thread_id: &str, run_id: &str) -> String {
    format!("threads/{thread_id}/runs/{run_id}/cancel")
}

pub fn submit_tool_outputs_path(thread_id: &str, run_id: &str) -> String {
    format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs")
}
