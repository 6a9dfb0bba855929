//! Durable storage for processed focus sessions.

mod sqlite_store;
mod traits;

pub use sqlite_store::SqliteSessionStore;
pub use traits::{SessionFilter, SessionStore, StorageError};
