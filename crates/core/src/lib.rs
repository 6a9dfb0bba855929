pub mod config;
pub mod intake;
pub mod metrics;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    ServerConfig,
};
pub use intake::{IntakeError, IntakeOrchestrator, IntakeState, IntakeSuccess};
pub use pipeline::{
    MediaStage, ProcessingConfig, ProcessingError, ProcessingPipeline, SimulatedStage, StageError,
};
pub use session::{
    validate_session, DecodeError, MediaStatus, RawField, RawSessionInput, SessionId,
    SessionRecord, StageKind, StoredSession, ValidatedSession, ValidationError,
    MAX_SESSION_DURATION_MS,
};
pub use store::{SessionFilter, SessionStore, SqliteSessionStore, StorageError};
