//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the pipeline stage and
//! session store traits, so intake behavior can be tested without timing
//! delays or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use focus_core::testing::{MockSessionStore, MockStage};
//!
//! let compress = MockStage::new("compress");
//! let extract = MockStage::new("extract");
//! let store = MockSessionStore::new();
//!
//! // Configure failures
//! extract.set_next_error(StageError::failed("no audio track")).await;
//!
//! // Build an orchestrator from them...
//! ```

mod mock_stage;
mod mock_store;

pub use mock_stage::{MockStage, RecordedStageCall};
pub use mock_store::MockSessionStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};

    use crate::session::{
        MediaStatus, RawSessionInput, SessionId, SessionRecord, StageKind, ValidatedSession,
    };

    /// Start of the reference session: 2024-01-01 10:00 UTC.
    pub fn session_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// JSON body for a session of the given length starting at [`session_start`].
    pub fn session_body(user_id: &str, duration: Duration) -> Value {
        let start = session_start();
        json!({
            "userId": user_id,
            "startTime": start.to_rfc3339(),
            "endTime": (start + duration).to_rfc3339(),
        })
    }

    /// Raw input for a session of the given length.
    pub fn raw_input(user_id: &str, duration: Duration) -> RawSessionInput {
        let start = session_start();
        RawSessionInput::new(
            user_id,
            start.to_rfc3339().as_str(),
            (start + duration).to_rfc3339().as_str(),
        )
    }

    /// A two hour session for `user_id` with both stages completed.
    pub fn processed_record(user_id: &str) -> SessionRecord {
        let start = session_start();
        SessionRecord::new(
            SessionId::generate(),
            ValidatedSession {
                user_id: user_id.to_string(),
                start_time: start,
                end_time: start + Duration::hours(2),
            },
        )
        .with_media(
            MediaStatus::default()
                .completed(StageKind::Compress)
                .completed(StageKind::ExtractAudio),
        )
    }
}
