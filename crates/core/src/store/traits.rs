//! Session storage trait and types.

use thiserror::Error;

use crate::session::{SessionRecord, StoredSession};

/// Error type for session store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing store could not be reached or refused the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Filter for querying stored sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    /// Filter by user.
    pub user_id: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            user_id: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by user.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Whether `record` matches the non-pagination parts of the filter.
    pub fn matches(&self, record: &SessionRecord) -> bool {
        self.user_id
            .as_deref()
            .map_or(true, |user_id| record.user_id == user_id)
    }
}

/// Trait for session storage backends.
///
/// `save` is all-or-nothing: either the complete record, flags included,
/// is stored and an id is returned, or nothing is stored.
pub trait SessionStore: Send + Sync {
    /// Store a processed session and return its store-assigned id.
    fn save(&self, record: &SessionRecord) -> Result<String, StorageError>;

    /// Get a session by store id.
    fn get(&self, id: &str) -> Result<Option<StoredSession>, StorageError>;

    /// List sessions matching the filter, latest start time first.
    fn list(&self, filter: &SessionFilter) -> Result<Vec<StoredSession>, StorageError>;

    /// Count sessions matching the filter, ignoring pagination.
    fn count(&self, filter: &SessionFilter) -> Result<i64, StorageError>;
}
