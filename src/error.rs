use std::io;
use std::time::Duration;

use assistant_service::ServiceError;
use session_store::SessionStoreError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::tools::ToolError;

/// Fatal failures that end the chat session.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("assistant service: {0}")]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("run {run_id} still busy after {:.1}s", waited.as_secs_f64())]
    PollTimeout { run_id: String, waited: Duration },

    #[error("interrupted again while run {run_id} was being cancelled")]
    Interrupted { run_id: String },

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assistant_service::ServiceError;

    use super::ChatError;

    #[test]
    fn display_names_the_failing_layer() {
        let error = ChatError::from(ServiceError::Status {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "assistant service: HTTP 401: Incorrect API key provided"
        );

        let error = ChatError::PollTimeout {
            run_id: "run_1".to_string(),
            waited: Duration::from_secs(600),
        };
        assert_eq!(error.to_string(), "run run_1 still busy after 600.0s");

        let error = ChatError::PollTimeout {
            run_id: "run_1".to_string(),
            waited: Duration::from_millis(1500),
        };
        assert_eq!(error.to_string(), "run run_1 still busy after 1.5s");
    }
}
