//! Configuration for the processing pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the processing pipeline and its simulated stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Simulated latency of the compression stage in milliseconds.
    #[serde(default = "default_stage_delay")]
    pub compress_delay_ms: u64,

    /// Simulated latency of the audio extraction stage in milliseconds.
    #[serde(default = "default_stage_delay")]
    pub extract_audio_delay_ms: u64,

    /// Per-stage timeout in seconds. Unset means a stage may run forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,

    /// Maximum pipelines running at once. Unset means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_pipelines: Option<usize>,
}

fn default_stage_delay() -> u64 {
    1000
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            compress_delay_ms: default_stage_delay(),
            extract_audio_delay_ms: default_stage_delay(),
            stage_timeout_secs: None,
            max_concurrent_pipelines: None,
        }
    }
}

impl ProcessingConfig {
    /// Sets both simulated stage delays.
    pub fn with_stage_delays(mut self, compress: Duration, extract_audio: Duration) -> Self {
        self.compress_delay_ms = compress.as_millis() as u64;
        self.extract_audio_delay_ms = extract_audio.as_millis() as u64;
        self
    }

    /// Sets the per-stage timeout.
    pub fn with_stage_timeout(mut self, timeout_secs: u64) -> Self {
        self.stage_timeout_secs = Some(timeout_secs);
        self
    }

    /// Caps the number of concurrently running pipelines.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_pipelines = Some(max);
        self
    }

    pub fn compress_delay(&self) -> Duration {
        Duration::from_millis(self.compress_delay_ms)
    }

    pub fn extract_audio_delay(&self) -> Duration {
        Duration::from_millis(self.extract_audio_delay_ms)
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}
