//! Decoding and validation of incoming session payloads.
//!
//! Decoding only establishes the shape of the payload (which fields are
//! present and whether they are text). All business rules live in
//! [`validate_session`], which is pure and reports the first violated rule.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::types::{ValidatedSession, MAX_SESSION_DURATION_MS};

/// A single loosely-typed input field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    /// Absent or `null`.
    Missing,
    /// A JSON string.
    Text(String),
    /// Any other JSON value.
    Other(Value),
}

impl RawField {
    fn from_json(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawField::Missing,
            Some(Value::String(s)) => RawField::Text(s),
            Some(other) => RawField::Other(other),
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self, RawField::Missing)
    }

    /// Missing, or text with nothing but whitespace.
    fn is_blank(&self) -> bool {
        match self {
            RawField::Missing => true,
            RawField::Text(s) => s.trim().is_empty(),
            RawField::Other(_) => false,
        }
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_string())
    }
}

/// Request-scoped session input, prior to validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSessionInput {
    pub user_id: RawField,
    pub start_time: RawField,
    pub end_time: RawField,
}

impl RawSessionInput {
    pub fn new(
        user_id: impl Into<RawField>,
        start_time: impl Into<RawField>,
        end_time: impl Into<RawField>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Decodes a parsed JSON body. Unknown fields are ignored.
    pub fn from_json(body: Value) -> Result<Self, DecodeError> {
        let mut fields = match body {
            Value::Object(map) => map,
            other => {
                return Err(DecodeError::NotAnObject {
                    found: json_type_name(&other),
                })
            }
        };

        Ok(Self {
            user_id: RawField::from_json(fields.remove("userId")),
            start_time: RawField::from_json(fields.remove("startTime")),
            end_time: RawField::from_json(fields.remove("endTime")),
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The request body could not be read as a session payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Request body must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("Request body is not valid JSON: {0}")]
    Malformed(String),
}

/// Violated validation rule. Rules are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("userId, startTime, and endTime are required")]
    MissingFields,

    #[error("userId must be a non-empty string")]
    InvalidUserId,

    #[error("Invalid startTime")]
    InvalidStartTime,

    #[error("Invalid endTime")]
    InvalidEndTime,

    #[error("endTime must be after startTime")]
    EndNotAfterStart,

    #[error("Session duration cannot exceed 8 hours")]
    DurationTooLong,
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFields => "missing_fields",
            ValidationError::InvalidUserId => "invalid_user_id",
            ValidationError::InvalidStartTime => "invalid_start_time",
            ValidationError::InvalidEndTime => "invalid_end_time",
            ValidationError::EndNotAfterStart => "end_not_after_start",
            ValidationError::DurationTooLong => "duration_too_long",
        }
    }
}

/// Validates a raw input, returning the normalized session.
pub fn validate_session(input: &RawSessionInput) -> Result<ValidatedSession, ValidationError> {
    // An empty userId is left to the user id rule
    if input.user_id.is_missing() || input.start_time.is_blank() || input.end_time.is_blank() {
        return Err(ValidationError::MissingFields);
    }

    let user_id = match &input.user_id {
        RawField::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(ValidationError::InvalidUserId),
    };

    let start_time = parse_time(&input.start_time).ok_or(ValidationError::InvalidStartTime)?;
    let end_time = parse_time(&input.end_time).ok_or(ValidationError::InvalidEndTime)?;

    if end_time <= start_time {
        return Err(ValidationError::EndNotAfterStart);
    }

    if (end_time - start_time).num_milliseconds() > MAX_SESSION_DURATION_MS {
        return Err(ValidationError::DurationTooLong);
    }

    Ok(ValidatedSession {
        user_id,
        start_time,
        end_time,
    })
}

/// Parses a date-like field into a UTC instant.
///
/// Accepts RFC 3339, naive date-times and bare dates (both read as UTC),
/// and integer epoch milliseconds. Instants outside years 0000-9999 are
/// rejected since they have no four-digit RFC 3339 form.
pub fn parse_time(field: &RawField) -> Option<DateTime<Utc>> {
    let parsed = match field {
        RawField::Text(s) => parse_time_text(s.trim()),
        RawField::Other(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.filter(|dt| (0..=9999).contains(&dt.year()))
}

fn parse_time_text(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    const START: &str = "2024-01-01T10:00:00Z";

    fn input(user_id: &str, start: &str, end: &str) -> RawSessionInput {
        RawSessionInput::new(user_id, start, end)
    }

    fn end_after(start: &str, duration: Duration) -> String {
        let start = DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc);
        (start + duration).to_rfc3339()
    }

    #[test]
    fn test_valid_session() {
        let session = validate_session(&input("alice", START, "2024-01-01T12:00:00Z")).unwrap();

        assert_eq!(session.user_id, "alice");
        assert_eq!(
            session.start_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(session.duration_ms(), 2 * 60 * 60 * 1000);
    }

    #[test]
    fn test_user_id_is_trimmed() {
        let session = validate_session(&input("  bob \t", START, "2024-01-01T11:00:00Z")).unwrap();
        assert_eq!(session.user_id, "bob");
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            RawSessionInput::new(RawField::Missing, START, "2024-01-01T11:00:00Z"),
            RawSessionInput::new("alice", RawField::Missing, "2024-01-01T11:00:00Z"),
            RawSessionInput::new("alice", START, RawField::Missing),
            RawSessionInput::new(RawField::Missing, RawField::Missing, RawField::Missing),
        ];

        for case in cases {
            assert_eq!(
                validate_session(&case),
                Err(ValidationError::MissingFields),
                "case: {:?}",
                case
            );
        }
    }

    #[test]
    fn test_missing_fields_wins_over_later_rules() {
        // Bad user id and bad start time, but end time absent: rule 1 first.
        let case = RawSessionInput::new("", "nonsense", RawField::Missing);
        assert_eq!(validate_session(&case), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_empty_user_id() {
        let result = validate_session(&input("", START, "2024-01-01T12:00:00Z"));
        assert_eq!(result, Err(ValidationError::InvalidUserId));
        assert_eq!(
            result.unwrap_err().to_string(),
            "userId must be a non-empty string"
        );
    }

    #[test]
    fn test_whitespace_user_id() {
        let result = validate_session(&input("   ", START, "2024-01-01T12:00:00Z"));
        assert_eq!(result, Err(ValidationError::InvalidUserId));
    }

    #[test]
    fn test_non_text_user_id() {
        let raw = RawSessionInput::from_json(json!({
            "userId": 42,
            "startTime": START,
            "endTime": "2024-01-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(validate_session(&raw), Err(ValidationError::InvalidUserId));
    }

    #[test]
    fn test_invalid_start_time() {
        let result = validate_session(&input("alice", "yesterday", "2024-01-01T12:00:00Z"));
        assert_eq!(result, Err(ValidationError::InvalidStartTime));
    }

    #[test]
    fn test_invalid_end_time() {
        let result = validate_session(&input("alice", START, "2024-13-45T99:00:00Z"));
        assert_eq!(result, Err(ValidationError::InvalidEndTime));
    }

    #[test]
    fn test_invalid_start_checked_before_end() {
        let result = validate_session(&input("alice", "bad", "also bad"));
        assert_eq!(result, Err(ValidationError::InvalidStartTime));
    }

    #[test]
    fn test_empty_time_counts_as_missing() {
        let cases = [
            input("alice", "", "2024-01-01T12:00:00Z"),
            input("alice", START, ""),
            input("alice", "   ", "2024-01-01T12:00:00Z"),
            input("", "", ""),
        ];

        for case in cases {
            assert_eq!(
                validate_session(&case),
                Err(ValidationError::MissingFields),
                "case: {:?}",
                case
            );
        }
    }

    #[test]
    fn test_time_beyond_year_9999_rejected() {
        // 10000-01-01T00:00:00Z
        let raw = RawSessionInput::from_json(json!({
            "userId": "alice",
            "startTime": 253_402_300_800_000_i64,
            "endTime": 253_402_304_400_000_i64
        }))
        .unwrap();
        assert_eq!(validate_session(&raw), Err(ValidationError::InvalidStartTime));

        let raw = RawSessionInput::from_json(json!({
            "userId": "alice",
            "startTime": START,
            "endTime": 253_402_300_800_000_i64
        }))
        .unwrap();
        assert_eq!(validate_session(&raw), Err(ValidationError::InvalidEndTime));
    }

    #[test]
    fn test_parse_time_year_range() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        let last_ms = RawField::Other(json!(last.timestamp_millis()));
        assert_eq!(parse_time(&last_ms), Some(last));
        assert_eq!(parse_time(&RawField::Other(json!(-62_167_219_200_001_i64))), None);
        assert_eq!(parse_time(&"+10000-01-01T00:00:00Z".into()), None);
    }

    #[test]
    fn test_end_before_start() {
        let result = validate_session(&input("alice", START, "2024-01-01T09:00:00Z"));
        assert_eq!(result, Err(ValidationError::EndNotAfterStart));
        assert_eq!(
            result.unwrap_err().to_string(),
            "endTime must be after startTime"
        );
    }

    #[test]
    fn test_end_equal_to_start() {
        let result = validate_session(&input("alice", START, START));
        assert_eq!(result, Err(ValidationError::EndNotAfterStart));
    }

    #[test]
    fn test_duration_exactly_eight_hours_is_accepted() {
        let end = end_after(START, Duration::hours(8));
        let session = validate_session(&input("alice", START, &end)).unwrap();
        assert_eq!(session.duration_ms(), MAX_SESSION_DURATION_MS);
    }

    #[test]
    fn test_duration_one_ms_over_eight_hours_is_rejected() {
        let end = end_after(START, Duration::hours(8) + Duration::milliseconds(1));
        let result = validate_session(&input("alice", START, &end));
        assert_eq!(result, Err(ValidationError::DurationTooLong));
    }

    #[test]
    fn test_nine_hour_session_is_rejected() {
        let result = validate_session(&input("alice", START, "2024-01-01T19:00:00Z"));
        assert_eq!(result, Err(ValidationError::DurationTooLong));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Session duration cannot exceed 8 hours"
        );
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let session = validate_session(&input(
            "alice",
            "2024-01-01T12:00:00+02:00",
            "2024-01-01T11:30:00Z",
        ))
        .unwrap();
        assert_eq!(
            session.start_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(session.duration_ms(), 90 * 60 * 1000);
    }

    #[test]
    fn test_parse_time_accepted_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_time(&"2024-01-01T10:00:00Z".into()), Some(expected));
        assert_eq!(parse_time(&"2024-01-01T10:00:00".into()), Some(expected));
        assert_eq!(parse_time(&"2024-01-01 10:00:00.000".into()), Some(expected));
        assert_eq!(parse_time(&" 2024-01-01T10:00:00Z ".into()), Some(expected));
        assert_eq!(
            parse_time(&RawField::Other(json!(expected.timestamp_millis()))),
            Some(expected)
        );
        assert_eq!(
            parse_time(&"2024-01-01".into()),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_time_rejected_forms() {
        assert_eq!(parse_time(&"".into()), None);
        assert_eq!(parse_time(&"not a date".into()), None);
        assert_eq!(parse_time(&RawField::Other(json!(true))), None);
        assert_eq!(parse_time(&RawField::Other(json!(1.5))), None);
        assert_eq!(parse_time(&RawField::Missing), None);
    }

    #[test]
    fn test_decode_null_counts_as_missing() {
        let raw = RawSessionInput::from_json(json!({
            "userId": null,
            "startTime": START,
            "endTime": "2024-01-01T12:00:00Z",
            "extra": "ignored"
        }))
        .unwrap();
        assert_eq!(raw.user_id, RawField::Missing);
        assert_eq!(validate_session(&raw), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let result = RawSessionInput::from_json(json!(["alice"]));
        assert_eq!(result, Err(DecodeError::NotAnObject { found: "array" }));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ValidationError::MissingFields,
            ValidationError::InvalidUserId,
            ValidationError::InvalidStartTime,
            ValidationError::InvalidEndTime,
            ValidationError::EndNotAfterStart,
            ValidationError::DurationTooLong,
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
