//! Error types for the processing pipeline.

use thiserror::Error;

use crate::session::{MediaStatus, StageKind};

/// Failure reported by a single stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The stage ran and reported failure.
    #[error("{reason}")]
    Failed { reason: String },

    /// The stage did not finish within the configured timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl StageError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// The pipeline stopped at a failing stage.
///
/// `status` holds the flags of every stage that completed before the
/// failure. Nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Processing failed at stage {stage}: {cause}")]
pub struct ProcessingError {
    pub stage: StageKind,
    pub cause: StageError,
    pub status: MediaStatus,
}
