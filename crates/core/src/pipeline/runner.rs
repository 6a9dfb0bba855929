//! Sequential stage runner.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::config::ProcessingConfig;
use super::error::{ProcessingError, StageError};
use super::simulated::SimulatedStage;
use super::traits::MediaStage;
use crate::metrics::{STAGE_DURATION, STAGE_RUNS};
use crate::session::{MediaStatus, SessionId, StageKind};

/// A stage bound to the status flag it completes.
struct StageSlot {
    kind: StageKind,
    stage: Arc<dyn MediaStage>,
}

/// Runs the fixed `compress` → `extractAudio` sequence for a session.
///
/// The run is a fold over the stage slots: each step takes the current
/// [`MediaStatus`] snapshot and, if the stage succeeds, yields the next one
/// with exactly that stage's flag set. The first failing stage ends the
/// fold and its error carries the last good snapshot.
pub struct ProcessingPipeline {
    slots: Vec<StageSlot>,
    stage_timeout: Option<Duration>,
    permits: Option<Arc<Semaphore>>,
}

impl ProcessingPipeline {
    /// Creates a pipeline from its two stages.
    pub fn new(compress: Arc<dyn MediaStage>, extract_audio: Arc<dyn MediaStage>) -> Self {
        Self {
            slots: vec![
                StageSlot {
                    kind: StageKind::Compress,
                    stage: compress,
                },
                StageSlot {
                    kind: StageKind::ExtractAudio,
                    stage: extract_audio,
                },
            ],
            stage_timeout: None,
            permits: None,
        }
    }

    /// Creates a pipeline of simulated stages configured from `config`.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        let pipeline = Self::new(
            Arc::new(SimulatedStage::compressor(config.compress_delay())),
            Arc::new(SimulatedStage::audio_extractor(config.extract_audio_delay())),
        );
        pipeline.with_limits(config)
    }

    /// Applies the optional timeout and concurrency cap from `config`.
    pub fn with_limits(mut self, config: &ProcessingConfig) -> Self {
        if let Some(timeout) = config.stage_timeout() {
            self = self.with_stage_timeout(timeout);
        }
        if let Some(max) = config.max_concurrent_pipelines {
            self = self.with_max_concurrent(max);
        }
        self
    }

    /// Fails any stage that runs longer than `timeout`.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Lets at most `max` runs execute at once; others wait for a slot.
    ///
    /// `max` is capped at [`Semaphore::MAX_PERMITS`].
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(max.min(Semaphore::MAX_PERMITS))));
        self
    }

    /// Stage kinds paired with their implementation names, in run order.
    pub fn stages(&self) -> Vec<(StageKind, String)> {
        self.slots
            .iter()
            .map(|slot| (slot.kind, slot.stage.name().to_string()))
            .collect()
    }

    /// Runs every stage in order starting from `status`.
    pub async fn run(
        &self,
        session_id: &SessionId,
        status: MediaStatus,
    ) -> Result<MediaStatus, ProcessingError> {
        // The semaphore is never closed, so acquire only waits
        let _permit = match &self.permits {
            Some(permits) => permits.acquire().await.ok(),
            None => None,
        };

        let mut status = status;
        for slot in &self.slots {
            match self.run_stage(session_id, slot).await {
                Ok(()) => {
                    status = status.completed(slot.kind);
                }
                Err(cause) => {
                    return Err(ProcessingError {
                        stage: slot.kind,
                        cause,
                        status,
                    });
                }
            }
        }

        Ok(status)
    }

    async fn run_stage(&self, session_id: &SessionId, slot: &StageSlot) -> Result<(), StageError> {
        let stage = slot.kind.as_str();
        debug!(session_id = %session_id, stage, implementation = slot.stage.name(), "Stage started");

        let started = Instant::now();
        let result = match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, slot.stage.run(session_id))
                .await
                .unwrap_or_else(|_| {
                    Err(StageError::Timeout {
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }),
            None => slot.stage.run(session_id).await,
        };
        let elapsed = started.elapsed();

        STAGE_DURATION
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(()) => {
                STAGE_RUNS.with_label_values(&[stage, "success"]).inc();
                info!(
                    session_id = %session_id,
                    stage,
                    duration_ms = elapsed.as_millis() as u64,
                    "Stage completed"
                );
            }
            Err(e) => {
                let label = match e {
                    StageError::Timeout { .. } => "timeout",
                    _ => "failed",
                };
                STAGE_RUNS.with_label_values(&[stage, label]).inc();
                warn!(session_id = %session_id, stage, error = %e, "Stage failed");
            }
        }

        result
    }
}
