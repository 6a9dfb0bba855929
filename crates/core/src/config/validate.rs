use tokio::sync::Semaphore;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Stage timeout, when set, is not 0
/// - Pipeline concurrency cap, when set, is between 1 and `Semaphore::MAX_PERMITS`
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Processing validation
    if config.processing.stage_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "processing.stage_timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.processing.max_concurrent_pipelines == Some(0) {
        return Err(ConfigError::ValidationError(
            "processing.max_concurrent_pipelines cannot be 0".to_string(),
        ));
    }

    if let Some(max) = config.processing.max_concurrent_pipelines {
        if max > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ValidationError(format!(
                "processing.max_concurrent_pipelines cannot exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
    }

    Ok(())
}
