//! HTTP transport for the assistants thread/run/message endpoints.
//!
//! This crate owns request building, bearer authentication, response decoding
//! and optional request/response tracing. It performs no retries: any non-2xx
//! status or undecodable body is returned as an error for the caller to treat
//! as final.
//!
//! [`BlockingAssistantsApi`] adapts the async client to the synchronous
//! `assistant_service::AssistantService` contract used by the chat client.

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod trace;
pub mod url;

pub use blocking::BlockingAssistantsApi;
pub use client::AssistantsApiClient;
pub use config::AssistantsApiConfig;
pub use error::AssistantsApiError;
pub use url::endpoint_url;
