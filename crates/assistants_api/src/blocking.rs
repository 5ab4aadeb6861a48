use std::future::Future;

use assistant_service::{
    AssistantService, CreateMessage, ListPage, Message, Pagination, Run, ServiceError, Thread,
    ToolOutput,
};

use crate::client::AssistantsApiClient;
use crate::config::AssistantsApiConfig;
use crate::error::AssistantsApiError;

/// Synchronous [`AssistantService`] backed by the async HTTP client.
///
/// Owns a current-thread runtime so each call blocks the caller until the
/// response is decoded; no two requests are ever in flight.
#[derive(Debug)]
pub struct BlockingAssistantsApi {
    client: AssistantsApiClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingAssistantsApi {
    pub fn new(config: AssistantsApiConfig) -> Result<Self, AssistantsApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                AssistantsApiError::Runtime(format!("failed to initialize tokio runtime: {error}"))
            })?;
        let client = AssistantsApiClient::new(config)?;

        Ok(Self { client, runtime })
    }

    pub fn client(&self) -> &AssistantsApiClient {
        &self.client
    }

    fn block_on<T, F>(&self, future: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, AssistantsApiError>>,
    {
        self.runtime.block_on(future).map_err(ServiceError::from)
    }
}

impl AssistantService for BlockingAssistantsApi {
    fn create_thread(&self) -> Result<Thread, ServiceError> {
        self.block_on(self.client.create_thread())
    }

    fn create_message(
        &self,
        thread_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ServiceError> {
        self.block_on(self.client.create_message(thread_id, message))
    }

    fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ServiceError> {
        self.block_on(self.client.create_run(thread_id, assistant_id))
    }

    fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError> {
        self.block_on(self.client.get_run(thread_id, run_id))
    }

    fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServiceError> {
        self.block_on(self.client.cancel_run(thread_id, run_id))
    }

    fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, ServiceError> {
        self.block_on(self.client.submit_tool_outputs(thread_id, run_id, outputs))
    }

    fn list_runs(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Run>, ServiceError> {
        self.block_on(self.client.list_runs(thread_id, pagination))
    }

    fn list_messages(
        &self,
        thread_id: &str,
        pagination: &Pagination,
    ) -> Result<ListPage<Message>, ServiceError> {
        self.block_on(self.client.list_messages(thread_id, pagination))
    }
}
