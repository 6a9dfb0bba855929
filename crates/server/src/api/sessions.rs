//! Focus session API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use focus_core::{
    DecodeError, IntakeError, RawSessionInput, SessionFilter, SessionId, SessionRecord,
    StageKind, StoredSession,
};

use crate::state::AppState;

/// Maximum allowed limit for session queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for session queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing sessions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsParams {
    /// Filter by user
    pub user_id: Option<String>,
    /// Maximum number of sessions to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for a recorded session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub message: String,
    pub session_id: SessionId,
    /// Store-assigned id
    pub id: String,
    pub session: SessionRecord,
}

/// Response for listing sessions
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<StoredSession>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response.
///
/// `kind` is one of `validation`, `processing`, `persistence`, `internal`
/// or `not_found`. The remaining fields are present only where they apply.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,
}

impl SessionErrorResponse {
    fn new(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind,
            reason: None,
            session_id: None,
            session: None,
            stage: None,
        }
    }

    fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

fn decode_error_response(err: DecodeError) -> Response {
    SessionErrorResponse {
        reason: Some("invalid_body"),
        ..SessionErrorResponse::new("validation", err.to_string())
    }
    .with_status(StatusCode::BAD_REQUEST)
}

fn storage_error_response(err: impl ToString) -> Response {
    SessionErrorResponse::new("persistence", err.to_string())
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<IntakeError> for SessionErrorResponse {
    fn from(err: IntakeError) -> Self {
        let message = err.to_string();
        match err {
            IntakeError::Rejected(reason) => Self {
                reason: Some(reason.code()),
                ..Self::new("validation", message)
            },
            IntakeError::ProcessingFailed {
                session_id,
                record,
                failure,
            } => Self {
                session_id: Some(session_id),
                session: Some(record),
                stage: Some(failure.stage),
                ..Self::new("processing", message)
            },
            IntakeError::PersistenceFailed {
                session_id, record, ..
            } => Self {
                session_id: Some(session_id),
                session: Some(record),
                ..Self::new("persistence", message)
            },
            // The cause was logged by the orchestrator and stays server side
            IntakeError::Internal { .. } => Self::new("internal", "Internal server error"),
        }
    }
}

fn intake_error_status(err: &IntakeError) -> StatusCode {
    match err {
        IntakeError::Rejected(_) => StatusCode::BAD_REQUEST,
        IntakeError::ProcessingFailed { .. } | IntakeError::PersistenceFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
        IntakeError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Record a focus session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), Response> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Undecodable session body");
        decode_error_response(DecodeError::Malformed(rejection.body_text()))
    })?;

    let input = RawSessionInput::from_json(body).map_err(decode_error_response)?;

    match state.orchestrator().submit(input).await {
        Ok(success) => Ok((
            StatusCode::CREATED,
            Json(CreateSessionResponse {
                message: "Focus session recorded".to_string(),
                session_id: success.session_id,
                id: success.stored_id,
                session: success.record,
            }),
        )),
        Err(e) => {
            let status = intake_error_status(&e);
            Err(SessionErrorResponse::from(e).with_status(status))
        }
    }
}

/// Get a stored session by ID
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StoredSession>, Response> {
    match state.session_store().get(&id) {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(
            SessionErrorResponse::new("not_found", format!("Session not found: {}", id))
                .with_status(StatusCode::NOT_FOUND),
        ),
        Err(e) => Err(storage_error_response(e)),
    }
}

/// List stored sessions with optional filters
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<ListSessionsResponse>, Response> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = SessionFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref user_id) = params.user_id {
        filter = filter.with_user_id(user_id);
    }

    let sessions = state
        .session_store()
        .list(&filter)
        .map_err(storage_error_response)?;

    // Total ignores pagination
    let total = state
        .session_store()
        .count(&filter)
        .map_err(storage_error_response)?;

    Ok(Json(ListSessionsResponse {
        sessions,
        total,
        limit,
        offset,
    }))
}
