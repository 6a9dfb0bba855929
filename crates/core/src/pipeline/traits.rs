//! Trait definitions for pipeline stages.

use async_trait::async_trait;

use super::error::StageError;
use crate::session::SessionId;

/// A unit of media work run by the pipeline.
///
/// Stages know nothing about status flags or their position in the
/// pipeline; the pipeline records completion when `run` returns `Ok`.
#[async_trait]
pub trait MediaStage: Send + Sync {
    /// Returns the name of this stage implementation.
    fn name(&self) -> &str;

    /// Performs the work for one session.
    async fn run(&self, session_id: &SessionId) -> Result<(), StageError>;
}
