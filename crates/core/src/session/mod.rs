//! Focus session data model and input validation.

mod types;
mod validate;

pub use types::{
    MediaStatus, SessionId, SessionRecord, StageKind, StoredSession, ValidatedSession,
    MAX_SESSION_DURATION_MS,
};
pub use validate::{
    parse_time, validate_session, DecodeError, RawField, RawSessionInput, ValidationError,
};
