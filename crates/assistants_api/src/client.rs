use assistant_service::{
    CreateMessage, ListPage, Message, Pagination, Run, Thread, ToolOutput,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::AssistantsApiConfig;
use crate::error::{parse_error_message, AssistantsApiError};
use crate::headers::build_headers;
use crate::trace::{trace_request, trace_response};
use crate::url::{
    cancel_run_path, endpoint_url, messages_path, run_path, runs_path, submit_tool_outputs_path,
    threads_path,
};

/// Async HTTP client for the assistants thread/run/message endpoints.
#[derive(Debug)]
pub struct AssistantsApiClient {
    http: Client,
    config: AssistantsApiConfig,
}

#[derive(Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
}

#[derive(Serialize)]
struct SubmitToolOutputsBody<'a> {
    tool_outputs: &'a [ToolOutput],
}

impl AssistantsApiClient {
    pub fn new(config: AssistantsApiConfig) -> Result<Self, AssistantsApiError> {
        if config.api_key.trim().is_empty() {
            return Err(AssistantsApiError::MissingApiKey);
        }
        reqwest::Url::parse(&endpoint_url(&config.base_url, ""))
            .map_err(|error| AssistantsApiError::InvalidBaseUrl(format!("{}: {error}", config.base_url)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AssistantsApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AssistantsApiConfig {
        &self.config
    }

    pub fn build_headers(&self) -> Result<HeaderMap, AssistantsApiError> {
        let headers = build_headers(&self.config)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AssistantsApiError::InvalidHeader(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AssistantsApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Builds an authenticated request for `path` below the configured base URL.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        pagination: Option<&Pagination>,
        body: Option<&serde_json::Value>,
    ) -> Result<RequestBuilder, AssistantsApiError> {
        let headers = self.build_headers()?;
        let mut request = self
            .http
            .request(method, endpoint_url(&self.config.base_url, path))
            .headers(headers);

        if let Some(pagination) = pagination {
            let pairs = pagination.query_pairs();
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request)
    }

    async fn call<T>(
        &self,
        method: Method,
        path: &str,
        pagination: Option<&Pagination>,
        body: Option<serde_json::Value>,
    ) -> Result<T, AssistantsApiError>
    where
        T: DeserializeOwned,
    {
        let request = self
            .build_request(method.clone(), path, pagination, body.as_ref())?
            .build()?;

        if self.config.trace {
            let body = body.as_ref().map(serde_json::to_vec).transpose()?;
            trace_request(&method, request.url().as_str(), body.as_deref());
        }

        let response = self.http.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if self.config.trace {
            trace_response(status.as_u16(), &bytes);
        }

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(AssistantsApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        serde_json::from_slice::<T>(&bytes).map_err(|source| AssistantsApiError::Decode {
            source,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    pub async fn create_thread(&self) -> Result<Thread, AssistantsApiError> {
        self.call(Method::POST, &threads_path(), None, None).await
    }

    pub async fn create_message(
        &self,
        thread_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, AssistantsApiError> {
        let body = serde_json::to_value(message)?;
        self.call(Method::POST, &messages_path(thread_id), None, Some(body))
            .await
    }

    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<Run, AssistantsApiError> {
        let body = serde_json::to_value(CreateRunBody { assistant_id })?;
        self.call(Method::POST, &runs_path(thread_id), None, Some(body))
            .await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantsApiError> {
        self.call(Method::GET, &run_path(thread_id, run_id), None, None)
            .await
    }

    pub async fn cancel_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, AssistantsApiError> {
        self.call(
            Method::POST,
            &cancel_run_path(thread_id, run_id),
            None,
            Some(json!({})),
        )
        .await
    }

    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, AssistantsApiError> {
        let body = serde_json::to_value(SubmitToolOutputsBody {
            tool_outputs: outputs,
        })?;
        self.call(
            Method::POST,
            &submit_tool_outputs_path(thread_id, run_id),
            None,
            Some(body),
        )
        .await
    }

    pub async fn list_runs(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Run>, AssistantsApiError> {
        self.call(Method::GET, &runs_path(thread_id), Some(pagination), None)
            .await
    }

    pub async fn list_messages(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Message>, AssistantsApiError> {
        self.call(Method::GET, &messages_path(thread_id), Some(pagination), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use assistant_service::Pagination;
    use reqwest::Method;
    use serde_json::json;

    use super::AssistantsApiClient;
    use crate::config::AssistantsApiConfig;
    use crate::error::AssistantsApiError;

    fn client() -> AssistantsApiClient {
        AssistantsApiClient::new(
            AssistantsApiConfig::new("sk-test").with_base_url("https://api.example.test/v1/"),
        )
        .expect("client")
    }

    #[test]
    fn new_rejects_blank_api_key() {
        let error = AssistantsApiClient::new(AssistantsApiConfig::new("  "))
            .expect_err("blank key must fail");
        assert!(matches!(error, AssistantsApiError::MissingApiKey));
    }

    #[test]
    fn new_rejects_unparseable_base_url() {
        let error = AssistantsApiClient::new(
            AssistantsApiConfig::new("sk-test").with_base_url("not a url"),
        )
        .expect_err("invalid base url must fail");
        assert!(matches!(error, AssistantsApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn list_request_carries_only_set_pagination_parameters() {
        let request = client()
            .build_request(
                Method::GET,
                "threads/thread_1/messages",
                Some(&Pagination::newest_first(20)),
                None,
            )
            .expect("build")
            .build()
            .expect("request");

        assert_eq!(
            request.url().as_str(),
            "https://api.example.test/v1/threads/thread_1/messages?limit=20&order=desc"
        );
    }

    #[test]
    fn mutating_request_sends_json_body_and_auth_headers() {
        let request = client()
            .build_request(
                Method::POST,
                "threads/thread_1/runs",
                None,
                Some(&json!({"assistant_id": "asst_1"})),
            )
            .expect("build")
            .build()
            .expect("request");

        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.headers()["authorization"].to_str().expect("ascii"),
            "Bearer sk-test"
        );
        assert_eq!(
            request.headers()["openai-beta"].to_str().expect("ascii"),
            "assistants=v2"
        );
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("buffered body");
        let body: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(body, json!({"assistant_id": "asst_1"}));
    }
}
