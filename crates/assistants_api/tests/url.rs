use assistants_api::url::{
    cancel_run_path, messages_path, run_path, submit_tool_outputs_path, DEFAULT_BASE_URL,
};
use assistants_api::endpoint_url;

#[test]
fn endpoint_url_collapses_slashes() {
    assert_eq!(
        endpoint_url("https://api.openai.com/v1/", "/threads"),
        "https://api.openai.com/v1/threads"
    );
    assert_eq!(
        endpoint_url("https://api.openai.com/v1", "threads"),
        "https://api.openai.com/v1/threads"
    );
}

#[test]
fn endpoint_url_defaults_blank_base() {
    assert_eq!(
        endpoint_url("  ", &messages_path("thread_1")),
        format!("{DEFAULT_BASE_URL}/threads/thread_1/messages")
    );
}

#[test]
fn run_paths_nest_under_thread() {
    assert_eq!(run_path("t", "r"), "threads/t/runs/r");
    assert_eq!(cancel_run_path("t", "r"), "threads/t/runs/r/cancel");
    assert_eq!(
        submit_tool_outputs_path("t", "r"),
        "threads/t/runs/r/submit_tool_outputs"
    );
}
