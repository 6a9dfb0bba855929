use std::sync::Arc;

use focus_core::{Config, IntakeOrchestrator, SessionStore};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<IntakeOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<IntakeOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &IntakeOrchestrator {
        self.orchestrator.as_ref()
    }

    /// The store the orchestrator persists into, for read endpoints.
    pub fn session_store(&self) -> &dyn SessionStore {
        self.orchestrator.store().as_ref()
    }
}
