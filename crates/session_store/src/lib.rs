mod error;
mod paths;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use paths::{store_path, STORE_DIR, STORE_FILE};
pub use schema::StoreRecord;
pub use store::{ThreadOrigin, ThreadStore};
