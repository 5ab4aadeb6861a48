use std::sync::Arc;
use std::time::{Duration, Instant};

use assistant_chat::{
    ShellToolExecutor, ToolDispatcher, ToolError, ToolExecutor, ToolPolicy, UnsupportedToolPolicy,
};
use assistant_service::{ToolCall, ToolOutput};

fn shell() -> ShellToolExecutor {
    ShellToolExecutor::new().with_timeout(Some(Duration::from_secs(30)))
}

#[test]
fn echo_returns_stdout_verbatim() {
    let output = shell().execute("echo hi").expect("echo should run");
    assert_eq!(output, "hi\n");
}

#[test]
fn nonzero_exit_is_output_not_error() {
    let output = shell()
        .execute("echo out; echo err 1>&2; exit 3")
        .expect("a failing command still produces output");
    assert_eq!(output, "out\nerr\n[exit status: 3]");
}

#[test]
fn stdout_and_stderr_keep_the_order_they_were_written() {
    let output = shell()
        .execute("echo a; echo b 1>&2; echo c")
        .expect("command should run");
    assert_eq!(output, "a\nb\nc\n");
}

#[test]
fn missing_shell_is_a_spawn_error() {
    let error = ShellToolExecutor::new()
        .with_shell("/nonexistent/definitely-not-a-shell")
        .execute("echo hi")
        .expect_err("spawn must fail");
    assert!(matches!(error, ToolError::Spawn { .. }));
}

#[test]
fn timeout_kills_the_command() {
    let started = Instant::now();
    let output = ShellToolExecutor::new()
        .with_timeout(Some(Duration::from_secs(1)))
        .execute("exec sleep 20")
        .expect("timed out command still returns output");

    assert_eq!(output, "[timed out after 1s]");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn timeout_kills_commands_started_by_the_shell() {
    let started = Instant::now();
    let output = ShellToolExecutor::new()
        .with_timeout(Some(Duration::from_secs(1)))
        .execute("sleep 6; echo done")
        .expect("timed out command still returns output");

    assert_eq!(output, "[timed out after 1s]");
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "grandchild kept the call alive for {:?}",
        started.elapsed()
    );
}

#[test]
fn large_output_is_drained_and_truncated() {
    let output = shell()
        .execute("yes x | head -c 300000")
        .expect("large output");

    assert!(output.ends_with("\n[truncated]"));
    assert!(output.len() <= 100 * 1024 + "\n[truncated]".len());
}

#[test]
fn custom_output_limit_applies() {
    let output = shell()
        .with_max_output_bytes(8)
        .execute("printf 'abcdefghijkl'")
        .expect("command should run");
    assert_eq!(output, "abcdefgh\n[truncated]");
}

#[test]
fn parallel_dispatch_runs_real_commands_in_call_order() {
    let dispatcher = ToolDispatcher::new(
        Arc::new(shell()),
        ToolPolicy {
            timeout: None,
            concurrency: 2,
            unsupported: UnsupportedToolPolicy::Report,
        },
    );
    let calls = vec![
        ToolCall::shell("call_1", "sleep 0.2; echo one"),
        ToolCall::shell("call_2", "echo two"),
        ToolCall::shell("call_3", "echo three"),
    ];

    let outputs = dispatcher
        .dispatch(&calls, &mut |_, _| {})
        .expect("dispatch");

    assert_eq!(
        outputs,
        vec![
            ToolOutput::new("call_1", "one\n"),
            ToolOutput::new("call_2", "two\n"),
            ToolOutput::new("call_3", "three\n"),
        ]
    );
}
