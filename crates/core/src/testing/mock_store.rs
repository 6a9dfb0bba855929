//! In-memory session store for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::session::{SessionRecord, StoredSession};
use crate::store::{SessionFilter, SessionStore, StorageError};

#[derive(Debug, Default)]
struct MockStoreState {
    sessions: Vec<StoredSession>,
    save_attempts: usize,
    next_error: Option<StorageError>,
    always_error: Option<StorageError>,
    panic_next: bool,
    next_id: u64,
}

/// Mock implementation of the SessionStore trait.
///
/// Keeps sessions in memory in insertion order and allows tests to:
/// - Inspect every stored session and count save attempts
/// - Simulate store failures, once or persistently
/// - Simulate a panicking store
///
/// # Example
///
/// ```rust,ignore
/// use focus_core::testing::MockSessionStore;
///
/// let store = MockSessionStore::new();
/// store.set_next_error(StorageError::Database("connection refused".into()));
///
/// // ... run an intake ...
///
/// assert!(store.stored_sessions().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    state: Arc<Mutex<MockStoreState>>,
}

impl MockSessionStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockStoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All sessions stored so far.
    pub fn stored_sessions(&self) -> Vec<StoredSession> {
        self.state().sessions.clone()
    }

    /// Number of `save` calls, successful or not.
    pub fn save_attempts(&self) -> usize {
        self.state().save_attempts
    }

    /// Configure the next save to fail with the given error.
    pub fn set_next_error(&self, error: StorageError) {
        self.state().next_error = Some(error);
    }

    /// Configure every operation to fail with the given error.
    pub fn set_always_error(&self, error: StorageError) {
        self.state().always_error = Some(error);
    }

    /// Clear any configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.always_error = None;
    }

    /// Make the next save panic.
    pub fn set_panic_next(&self) {
        self.state().panic_next = true;
    }

    fn filtered(state: &MockStoreState, filter: &SessionFilter) -> Vec<StoredSession> {
        let mut matching: Vec<StoredSession> = state
            .sessions
            .iter()
            .filter(|s| filter.matches(&s.session))
            .cloned()
            .collect();
        // Stable sort keeps later inserts first among equal start times
        matching.reverse();
        matching.sort_by(|a, b| b.session.start_time.cmp(&a.session.start_time));
        matching
    }
}

impl SessionStore for MockSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<String, StorageError> {
        let mut state = self.state();
        state.save_attempts += 1;

        if std::mem::take(&mut state.panic_next) {
            drop(state);
            panic!("mock session store panicked");
        }

        if let Some(err) = state.next_error.take().or_else(|| state.always_error.clone()) {
            return Err(err);
        }

        state.next_id += 1;
        let id = format!("mock-{}", state.next_id);
        state.sessions.push(StoredSession {
            id: id.clone(),
            session: record.clone(),
        });
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<StoredSession>, StorageError> {
        let state = self.state();
        if let Some(err) = state.always_error.clone() {
            return Err(err);
        }
        Ok(state.sessions.iter().find(|s| s.id == id).cloned())
    }

    fn list(&self, filter: &SessionFilter) -> Result<Vec<StoredSession>, StorageError> {
        let state = self.state();
        if let Some(err) = state.always_error.clone() {
            return Err(err);
        }
        Ok(Self::filtered(&state, filter)
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    fn count(&self, filter: &SessionFilter) -> Result<i64, StorageError> {
        let state = self.state();
        if let Some(err) = state.always_error.clone() {
            return Err(err);
        }
        Ok(Self::filtered(&state, filter).len() as i64)
    }
}
