//! Intake orchestration: validate, process, persist.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::types::{IntakeError, IntakeState, IntakeSuccess};
use crate::metrics::{INTAKE_DURATION, INTAKE_OUTCOMES, STORE_WRITES};
use crate::pipeline::ProcessingPipeline;
use crate::session::{validate_session, RawSessionInput, SessionId, SessionRecord};
use crate::store::SessionStore;

/// Runs a session submission through validation, processing and storage.
///
/// Holds no per-request state, so one orchestrator serves any number of
/// concurrent submissions.
pub struct IntakeOrchestrator {
    pipeline: ProcessingPipeline,
    store: Arc<dyn SessionStore>,
}

impl IntakeOrchestrator {
    pub fn new(pipeline: ProcessingPipeline, store: Arc<dyn SessionStore>) -> Self {
        Self { pipeline, store }
    }

    /// The store processed sessions are written to.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &ProcessingPipeline {
        &self.pipeline
    }

    /// Submits one session.
    ///
    /// Panics raised anywhere during the intake are caught and reported as
    /// [`IntakeError::Internal`].
    pub async fn submit(&self, input: RawSessionInput) -> Result<IntakeSuccess, IntakeError> {
        let started = Instant::now();
        let assigned_id = OnceLock::new();

        let result = AssertUnwindSafe(self.run(input, &assigned_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(IntakeError::Internal {
                    session_id: assigned_id.get().cloned(),
                    cause: panic_message(payload.as_ref()),
                })
            });

        let state = match &result {
            Ok(_) => IntakeState::Persisted,
            Err(e) => e.state(),
        };
        INTAKE_OUTCOMES.with_label_values(&[state.as_str()]).inc();
        INTAKE_DURATION
            .with_label_values(&[state.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(success) => info!(
                session_id = %success.session_id,
                stored_id = %success.stored_id,
                user_id = %success.record.user_id,
                "Session persisted"
            ),
            Err(IntakeError::Rejected(reason)) => {
                info!(reason = reason.code(), "Session rejected: {}", reason)
            }
            Err(IntakeError::ProcessingFailed {
                session_id,
                failure,
                ..
            }) => warn!(
                session_id = %session_id,
                stage = %failure.stage,
                error = %failure.cause,
                "Session processing failed"
            ),
            Err(IntakeError::PersistenceFailed {
                session_id, cause, ..
            }) => error!(session_id = %session_id, error = %cause, "Failed to persist session"),
            Err(IntakeError::Internal { session_id, cause }) => error!(
                session_id = session_id.as_ref().map(|id| id.as_str()),
                cause = %cause,
                "Internal failure during intake"
            ),
        }

        result
    }

    async fn run(
        &self,
        input: RawSessionInput,
        assigned_id: &OnceLock<SessionId>,
    ) -> Result<IntakeSuccess, IntakeError> {
        // Received -> Validated
        let validated = validate_session(&input)?;

        // Validated -> Processing
        let session_id = assigned_id.get_or_init(SessionId::generate).clone();
        let record = SessionRecord::new(session_id.clone(), validated);
        debug!(
            session_id = %session_id,
            user_id = %record.user_id,
            duration_ms = (record.end_time - record.start_time).num_milliseconds(),
            "Session accepted, processing"
        );

        let record = match self.pipeline.run(&session_id, record.media).await {
            Ok(media) => record.with_media(media),
            Err(failure) => {
                return Err(IntakeError::ProcessingFailed {
                    record: record.with_media(failure.status),
                    session_id,
                    failure,
                })
            }
        };

        // Processing -> Persisted
        match self.store.save(&record) {
            Ok(stored_id) => {
                STORE_WRITES.with_label_values(&["success"]).inc();
                Ok(IntakeSuccess {
                    session_id,
                    stored_id,
                    record,
                })
            }
            Err(cause) => {
                STORE_WRITES.with_label_values(&["failed"]).inc();
                Err(IntakeError::PersistenceFailed {
                    session_id,
                    record,
                    cause,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageError;
    use crate::session::{RawField, StageKind, ValidationError};
    use crate::store::StorageError;
    use crate::testing::{fixtures, MockSessionStore, MockStage};
    use chrono::Duration;

    struct Harness {
        orchestrator: IntakeOrchestrator,
        compress: MockStage,
        extract: MockStage,
        store: MockSessionStore,
    }

    fn harness() -> Harness {
        let compress = MockStage::new("compress");
        let extract = MockStage::new("extract");
        let store = MockSessionStore::new();
        let pipeline =
            ProcessingPipeline::new(Arc::new(compress.clone()), Arc::new(extract.clone()));
        Harness {
            orchestrator: IntakeOrchestrator::new(pipeline, Arc::new(store.clone())),
            compress,
            extract,
            store,
        }
    }

    #[tokio::test]
    async fn test_valid_session_is_persisted_fully_processed() {
        let h = harness();

        let success = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap();

        assert!(success.record.media.compressed);
        assert!(success.record.media.audio_extracted);
        assert_eq!(success.record.session_id, success.session_id);

        let stored = h.store.stored_sessions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, success.stored_id);
        assert_eq!(stored[0].session, success.record);
    }

    #[tokio::test]
    async fn test_rejected_input_runs_nothing() {
        let h = harness();

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("  ", Duration::hours(1)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IntakeError::Rejected(ValidationError::InvalidUserId)
        ));
        assert_eq!(h.compress.call_count().await, 0);
        assert_eq!(h.extract.call_count().await, 0);
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_rejected() {
        let h = harness();
        let input = RawSessionInput::new("alice", RawField::Missing, "2024-01-01T12:00:00Z");

        let err = h.orchestrator.submit(input).await.unwrap_err();

        assert_eq!(err.state(), IntakeState::Rejected);
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_compress_failure_not_persisted() {
        let h = harness();
        h.compress
            .set_next_error(StageError::failed("encoder crashed"))
            .await;

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap_err();

        assert_eq!(err.state(), IntakeState::ProcessingFailed);
        assert_eq!(err.failed_stage(), Some(StageKind::Compress));
        let record = err.record().unwrap();
        assert!(!record.media.compressed);
        assert!(!record.media.audio_extracted);
        assert_eq!(h.extract.call_count().await, 0);
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_extract_failure_reports_partial_record() {
        let h = harness();
        h.extract
            .set_next_error(StageError::failed("no audio stream"))
            .await;

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(StageKind::ExtractAudio));
        let record = err.record().unwrap();
        assert!(record.media.compressed);
        assert!(!record.media.audio_extracted);
        assert_eq!(err.session_id(), Some(&record.session_id));
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_reports_processed_record() {
        let h = harness();
        h.store
            .set_next_error(StorageError::Database("disk I/O error".to_string()));

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap_err();

        assert_eq!(err.state(), IntakeState::PersistenceFailed);
        let record = err.record().unwrap();
        assert!(record.media.is_fully_processed());
        assert!(h.store.stored_sessions().is_empty());
        assert_eq!(h.store.save_attempts(), 1);
    }

    #[tokio::test]
    async fn test_panicking_stage_is_internal_failure() {
        let h = harness();
        h.extract.set_panic_next().await;

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap_err();

        assert_eq!(err.state(), IntakeState::InternalFailure);
        assert!(err.session_id().is_some());
        assert!(err.record().is_none());
        match err {
            IntakeError::Internal { cause, .. } => assert!(cause.contains("panicked")),
            other => panic!("expected internal failure, got {:?}", other),
        }
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_panicking_store_is_internal_failure() {
        let h = harness();
        h.store.set_panic_next();

        let err = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(2)))
            .await
            .unwrap_err();

        assert_eq!(err.state(), IntakeState::InternalFailure);
        assert!(h.store.stored_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_orchestrator_keeps_serving_after_failures() {
        let h = harness();
        h.compress.set_panic_next().await;

        let first = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(1)))
            .await;
        let second = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(1)))
            .await;

        assert!(first.is_err());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_each_intake_gets_its_own_session_id() {
        let h = harness();

        let a = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(1)))
            .await
            .unwrap();
        let b = h
            .orchestrator
            .submit(fixtures::raw_input("alice", Duration::hours(1)))
            .await
            .unwrap();

        assert_ne!(a.session_id, b.session_id);
        assert_ne!(a.stored_id, b.stored_id);
    }
}
