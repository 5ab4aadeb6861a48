use assistant_service::Thread;
use serde::{Deserialize, Serialize};

/// On-disk shape: `{ "thread": { "id": ..., "created_at": ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub thread: Thread,
}

impl StoreRecord {
    #[must_use]
    pub fn new(thread: Thread) -> Self {
        Self { thread }
    }
}
