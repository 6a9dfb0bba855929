//! SQLite-backed session store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection};

use super::{SessionFilter, SessionStore, StorageError};
use crate::session::{MediaStatus, SessionId, SessionRecord, StoredSession};

const SELECT_COLUMNS: &str = "SELECT id, session_id, user_id, start_time, end_time, compressed, audio_extracted, created_at FROM sessions";

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Create a new SQLite session store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite session store (useful for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                compressed INTEGER NOT NULL DEFAULT 0,
                audio_extracted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time DESC);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &SessionFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params.push(Box::new(user_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<StoredSession> {
        let id: String = row.get(0)?;
        let session_id: String = row.get(1)?;
        let user_id: String = row.get(2)?;
        let start_time = parse_timestamp(3, row.get(3)?)?;
        let end_time = parse_timestamp(4, row.get(4)?)?;
        let compressed: bool = row.get(5)?;
        let audio_extracted: bool = row.get(6)?;
        let created_at = parse_timestamp(7, row.get(7)?)?;

        Ok(StoredSession {
            id,
            session: SessionRecord {
                session_id: SessionId::from(session_id),
                user_id,
                start_time,
                end_time,
                media: MediaStatus {
                    compressed,
                    audio_extracted,
                },
                created_at,
            },
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(column: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl SessionStore for SqliteSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<String, StorageError> {
        let conn = self.conn()?;
        let id = uuid::Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO sessions (id, session_id, user_id, start_time, end_time, compressed, audio_extracted, created_at, stored_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                record.session_id.as_str(),
                record.user_id,
                format_timestamp(&record.start_time),
                format_timestamp(&record.end_time),
                record.media.compressed,
                record.media.audio_extracted,
                format_timestamp(&record.created_at),
                format_timestamp(&Utc::now()),
            ],
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(id)
    }

    fn get(&self, id: &str) -> Result<Option<StoredSession>, StorageError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_session,
        );

        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &SessionFilter) -> Result<Vec<StoredSession>, StorageError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "{} {} ORDER BY start_time DESC, stored_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_session)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut sessions = Vec::new();
        for row_result in rows {
            let session = row_result.map_err(|e| StorageError::Database(e.to_string()))?;
            sessions.push(session);
        }

        Ok(sessions)
    }

    fn count(&self, filter: &SessionFilter) -> Result<i64, StorageError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM sessions {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count)
    }
}
