//! Mock pipeline stage for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::pipeline::{MediaStage, StageError};
use crate::session::SessionId;

/// A recorded stage run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStageCall {
    /// Session the stage ran for.
    pub session_id: SessionId,
    /// When the run started.
    pub started_at: Instant,
    /// When the run returned.
    pub finished_at: Instant,
    /// Whether the run succeeded.
    pub success: bool,
}

/// Mock implementation of the MediaStage trait.
///
/// Provides controllable behavior for testing:
/// - Track runs (with timing) for ordering assertions
/// - Simulate failure, once or on every run
/// - Simulate latency
/// - Simulate a panicking stage
///
/// # Example
///
/// ```rust,ignore
/// use focus_core::testing::MockStage;
///
/// let compress = MockStage::new("compress");
/// compress.set_next_error(StageError::failed("disk full")).await;
///
/// // ... run the pipeline ...
///
/// assert_eq!(compress.call_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockStage {
    name: String,
    /// Recorded runs.
    calls: Arc<RwLock<Vec<RecordedStageCall>>>,
    /// If set, the next run will fail with this error.
    next_error: Arc<RwLock<Option<StageError>>>,
    /// If set, every run fails with this error.
    always_error: Arc<RwLock<Option<StageError>>>,
    /// Simulated run duration.
    delay: Arc<RwLock<Duration>>,
    /// If set, the next run panics.
    panic_next: Arc<RwLock<bool>>,
}

impl MockStage {
    /// Create a new mock stage that succeeds immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            always_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            panic_next: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded runs.
    pub async fn recorded_calls(&self) -> Vec<RecordedStageCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of runs performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Configure the next run to fail with the given error.
    pub async fn set_next_error(&self, error: StageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure every run to fail with the given error.
    pub async fn set_always_error(&self, error: StageError) {
        *self.always_error.write().await = Some(error);
    }

    /// Clear any configured errors.
    pub async fn clear_errors(&self) {
        *self.next_error.write().await = None;
        *self.always_error.write().await = None;
    }

    /// Set the simulated run duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Make the next run panic.
    pub async fn set_panic_next(&self) {
        *self.panic_next.write().await = true;
    }

    async fn take_error(&self) -> Option<StageError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        self.always_error.read().await.clone()
    }
}

#[async_trait]
impl MediaStage for MockStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, session_id: &SessionId) -> Result<(), StageError> {
        let started_at = Instant::now();

        if std::mem::take(&mut *self.panic_next.write().await) {
            panic!("mock stage {} panicked", self.name);
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match self.take_error().await {
            Some(err) => Err(err),
            None => Ok(()),
        };

        self.calls.write().await.push(RecordedStageCall {
            session_id: session_id.clone(),
            started_at,
            finished_at: Instant::now(),
            success: result.is_ok(),
        });

        result
    }
}
