//! Intake outcomes and errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::pipeline::ProcessingError;
use crate::session::{SessionId, SessionRecord, StageKind, ValidationError};
use crate::store::StorageError;

/// States of a single intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeState {
    Received,
    Validated,
    Processing,
    /// Terminal success.
    Persisted,
    /// Terminal: input failed validation.
    Rejected,
    /// Terminal: a stage failed.
    ProcessingFailed,
    /// Terminal: pipeline succeeded, store write failed.
    PersistenceFailed,
    /// Terminal: unexpected fault.
    InternalFailure,
}

impl IntakeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeState::Received => "received",
            IntakeState::Validated => "validated",
            IntakeState::Processing => "processing",
            IntakeState::Persisted => "persisted",
            IntakeState::Rejected => "rejected",
            IntakeState::ProcessingFailed => "processing_failed",
            IntakeState::PersistenceFailed => "persistence_failed",
            IntakeState::InternalFailure => "internal_failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            IntakeState::Received | IntakeState::Validated | IntakeState::Processing
        )
    }
}

impl fmt::Display for IntakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session that was validated, fully processed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeSuccess {
    /// Process-local correlation id.
    pub session_id: SessionId,
    /// Id assigned by the session store.
    pub stored_id: String,
    /// The record as stored.
    pub record: SessionRecord,
}

/// Terminal failure of an intake.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The input failed validation. Nothing was processed or stored.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// A stage failed. `record` holds the flags of the stages that did
    /// complete and was not stored.
    #[error("{failure} (session {session_id})")]
    ProcessingFailed {
        session_id: SessionId,
        record: SessionRecord,
        failure: ProcessingError,
    },

    /// All stages completed but the store rejected the record.
    #[error("Failed to persist session {session_id}: {cause}")]
    PersistenceFailed {
        session_id: SessionId,
        record: SessionRecord,
        cause: StorageError,
    },

    /// Unexpected fault. `cause` is for operators and must not reach callers.
    #[error("Internal error")]
    Internal {
        session_id: Option<SessionId>,
        cause: String,
    },
}

impl IntakeError {
    /// Terminal state this error represents.
    pub fn state(&self) -> IntakeState {
        match self {
            IntakeError::Rejected(_) => IntakeState::Rejected,
            IntakeError::ProcessingFailed { .. } => IntakeState::ProcessingFailed,
            IntakeError::PersistenceFailed { .. } => IntakeState::PersistenceFailed,
            IntakeError::Internal { .. } => IntakeState::InternalFailure,
        }
    }

    /// Correlation id, if one had been assigned.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            IntakeError::Rejected(_) => None,
            IntakeError::ProcessingFailed { session_id, .. }
            | IntakeError::PersistenceFailed { session_id, .. } => Some(session_id),
            IntakeError::Internal { session_id, .. } => session_id.as_ref(),
        }
    }

    /// The unsaved record, for processing and persistence failures.
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            IntakeError::ProcessingFailed { record, .. }
            | IntakeError::PersistenceFailed { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The stage that failed, for processing failures.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            IntakeError::ProcessingFailed { failure, .. } => Some(failure.stage),
            _ => None,
        }
    }
}
