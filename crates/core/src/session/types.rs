//! Session record and processing status types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest focus session accepted, in milliseconds (8 hours).
pub const MAX_SESSION_DURATION_MS: i64 = 8 * 60 * 60 * 1000;

/// Process-local correlation identifier for one intake.
///
/// Only used to tie log lines and error payloads together. It is not the
/// primary key of a stored session (the store assigns its own id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

impl SessionId {
    /// Generates a new id from the current time and an in-process sequence.
    pub fn generate() -> Self {
        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("session_{}_{}", Utc::now().timestamp_millis(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named processing stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageKind {
    /// Video compression.
    Compress,
    /// Audio track extraction.
    ExtractAudio,
}

impl StageKind {
    /// Fixed execution order of the pipeline.
    pub const ORDER: [StageKind; 2] = [StageKind::Compress, StageKind::ExtractAudio];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Compress => "compress",
            StageKind::ExtractAudio => "extractAudio",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status flags of a session.
///
/// Snapshots are immutable values: completing a stage yields a new snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    pub compressed: bool,
    pub audio_extracted: bool,
}

impl MediaStatus {
    /// Returns a snapshot with the flag of `stage` set.
    pub fn completed(self, stage: StageKind) -> Self {
        match stage {
            StageKind::Compress => Self {
                compressed: true,
                ..self
            },
            StageKind::ExtractAudio => Self {
                audio_extracted: true,
                ..self
            },
        }
    }

    /// Whether the flag of `stage` is set.
    pub fn is_completed(&self, stage: StageKind) -> bool {
        match stage {
            StageKind::Compress => self.compressed,
            StageKind::ExtractAudio => self.audio_extracted,
        }
    }

    /// Whether every stage has completed.
    pub fn is_fully_processed(&self) -> bool {
        StageKind::ORDER.iter().all(|stage| self.is_completed(*stage))
    }
}

/// A session that passed validation, before any processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    /// Trimmed user id.
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ValidatedSession {
    /// Length of the session in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }
}

/// The canonical focus session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub media: MediaStatus,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Builds a fresh record with no processing done yet.
    pub fn new(session_id: SessionId, validated: ValidatedSession) -> Self {
        Self {
            session_id,
            user_id: validated.user_id,
            start_time: validated.start_time,
            end_time: validated.end_time,
            media: MediaStatus::default(),
            created_at: Utc::now(),
        }
    }

    /// Returns the record carrying the given status snapshot.
    pub fn with_media(self, media: MediaStatus) -> Self {
        Self { media, ..self }
    }
}

/// A session as held by a store, keyed by the store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub session: SessionRecord,
}
