use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use assistant_service::{
    AssistantService, CreateMessage, Pagination, RunStatus, ServiceError, ToolOutput,
};
use assistants_api::{AssistantsApiClient, AssistantsApiConfig, BlockingAssistantsApi};
use serde_json::json;

fn allow_local_integration() -> bool {
    std::env::var("ASSISTANTS_API_ALLOW_LOCAL_INTEGRATION")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
struct RecordedRequest {
    method: String,
    target: String,
    authorization: Option<String>,
    body: Option<serde_json::Value>,
}

struct ScriptedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl ScriptedServer {
    fn new(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("local TCP listener should bind");
        let addr = listener.local_addr().expect("resolved listener address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = thread::spawn({
            let requests = Arc::clone(&requests);
            move || {
                for (status, body) in responses {
                    let Ok((socket, _)) = listener.accept() else {
                        break;
                    };
                    let recorded = serve_one(socket, status, &body);
                    requests.lock().expect("requests lock").push(recorded);
                }
            }
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            requests,
            handle: Some(handle),
        }
    }

    fn finish(mut self) -> Vec<RecordedRequest> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread");
        }
        let requests = self.requests.lock().expect("requests lock");
        requests.clone()
    }
}

fn serve_one(socket: TcpStream, status: u16, body: &str) -> RecordedRequest {
    let mut reader = BufReader::new(socket.try_clone().expect("clone socket"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut request_body = vec![0u8; content_length];
    reader.read_exact(&mut request_body).expect("request body");
    let body_json = if request_body.is_empty() {
        None
    } else {
        serde_json::from_slice(&request_body).ok()
    };

    let mut socket = socket;
    let response = format!(
        "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).expect("write response");
    let _ = socket.flush();

    RecordedRequest {
        method,
        target,
        authorization,
        body: body_json,
    }
}

fn run_json(id: &str, status: &str) -> String {
    json!({
        "id": id,
        "object": "thread.run",
        "thread_id": "thread_1",
        "assistant_id": "asst_1",
        "status": status,
        "created_at": 1700000000
    })
    .to_string()
}

#[test]
fn blocking_api_round_trips_turn_calls() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![
        (200, json!({"id": "thread_1", "object": "thread", "created_at": 1700000000}).to_string()),
        (
            200,
            json!({
                "id": "msg_1", "object": "thread.message", "thread_id": "thread_1",
                "role": "user", "created_at": 1700000001,
                "content": [{"type": "text", "text": {"value": "hello", "annotations": []}}]
            })
            .to_string(),
        ),
        (200, run_json("run_1", "queued")),
        (
            200,
            json!({"object": "list", "data": [serde_json::from_str::<serde_json::Value>(&run_json("run_1", "in_progress")).expect("run")], "first_id": "run_1", "last_id": "run_1", "has_more": false}).to_string(),
        ),
        (200, run_json("run_1", "queued")),
    ]);

    let api = BlockingAssistantsApi::new(
        AssistantsApiConfig::new("sk-local").with_base_url(&server.base_url),
    )
    .expect("blocking api");

    let thread = api.create_thread().expect("create thread");
    assert_eq!(thread.id, "thread_1");
    let message = api
        .create_message("thread_1", &CreateMessage::user("hello"))
        .expect("create message");
    assert_eq!(message.text_segments().collect::<Vec<_>>(), ["hello"]);
    let run = api.create_run("thread_1", "asst_1").expect("create run");
    assert_eq!(run.status, RunStatus::Queued);
    let runs = api
        .list_runs("thread_1", &Pagination::limit(1))
        .expect("list runs");
    assert_eq!(runs.data[0].status, RunStatus::InProgress);
    api.submit_tool_outputs("thread_1", "run_1", &[ToolOutput::new("call_1", "hi\n")])
        .expect("submit outputs");

    let requests = server.finish();
    let summary: Vec<(&str, &str)> = requests
        .iter()
        .map(|request| (request.method.as_str(), request.target.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("POST", "/v1/threads"),
            ("POST", "/v1/threads/thread_1/messages"),
            ("POST", "/v1/threads/thread_1/runs"),
            ("GET", "/v1/threads/thread_1/runs?limit=1"),
            ("POST", "/v1/threads/thread_1/runs/run_1/submit_tool_outputs"),
        ]
    );
    assert!(requests
        .iter()
        .all(|request| request.authorization.as_deref() == Some("Bearer sk-local")));
    assert_eq!(requests[2].body, Some(json!({"assistant_id": "asst_1"})));
    assert_eq!(
        requests[4].body,
        Some(json!({"tool_outputs": [{"tool_call_id": "call_1", "output": "hi\n"}]}))
    );
}

#[test]
fn blocking_api_surfaces_status_errors_without_retry() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![(
        500,
        json!({"error": {"message": "server blew up", "type": "server_error"}}).to_string(),
    )]);
    let api = BlockingAssistantsApi::new(
        AssistantsApiConfig::new("sk-local").with_base_url(&server.base_url),
    )
    .expect("blocking api");

    let error = api.get_run("thread_1", "run_1").expect_err("500 must fail");
    assert_eq!(
        error,
        ServiceError::Status {
            status: 500,
            message: "server blew up (server_error)".to_string(),
        }
    );
    assert_eq!(server.finish().len(), 1);
}

#[tokio::test]
async fn async_client_reports_malformed_json_as_decode_error() {
    if !allow_local_integration() {
        return;
    }

    let server = ScriptedServer::new(vec![(200, "{\"id\": ".to_string())]);
    let client = AssistantsApiClient::new(
        AssistantsApiConfig::new("sk-local").with_base_url(&server.base_url),
    )
    .expect("client");

    let error = client
        .get_run("thread_1", "run_1")
        .await
        .expect_err("truncated body must fail");
    assert!(matches!(
        error,
        assistants_api::AssistantsApiError::Decode { .. }
    ));
    server.finish();
}
