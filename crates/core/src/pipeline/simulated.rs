//! Placeholder stages that stand in for real transcoding.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::error::StageError;
use super::traits::MediaStage;
use crate::session::SessionId;

/// A stage that only waits for a fixed delay and then succeeds.
///
/// A real compressor or audio extractor (ffmpeg or similar) implements
/// [`MediaStage`] the same way and replaces this without any change to
/// pipeline control flow.
#[derive(Debug, Clone)]
pub struct SimulatedStage {
    name: &'static str,
    delay: Duration,
}

impl SimulatedStage {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self { name, delay }
    }

    /// Simulated video compression.
    pub fn compressor(delay: Duration) -> Self {
        Self::new("simulated-compress", delay)
    }

    /// Simulated audio extraction.
    pub fn audio_extractor(delay: Duration) -> Self {
        Self::new("simulated-extract-audio", delay)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl MediaStage for SimulatedStage {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, session_id: &SessionId) -> Result<(), StageError> {
        debug!(
            session_id = %session_id,
            stage = self.name,
            delay_ms = self.delay.as_millis() as u64,
            "Simulating media work"
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
