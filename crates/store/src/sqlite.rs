//! SQLite session store.
//!
//! Uses a single SQLite database file with two tables:
//! - `sessions` — the full session document (JSON) plus indexed summary columns
//! - `responses` — append-only log of scored responses
//!
//! The JSON document is authoritative on load; the summary columns exist so
//! listings never deserialize every session.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use caliper_core::error::StoreError;
use caliper_core::response::Response;
use caliper_core::session::{
    CompletionReason, Session, SessionId, SessionState, SessionSummary,
};
use caliper_core::store::SessionStore;

/// A production SQLite session store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables/indexes are created automatically.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite session store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL,
                domain              TEXT,
                theta               REAL NOT NULL,
                standard_error      REAL NOT NULL,
                items_administered  INTEGER NOT NULL,
                state               TEXT NOT NULL,
                completion          TEXT,
                started_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                document            TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                seq              INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id       TEXT NOT NULL,
                item_id          TEXT NOT NULL,
                correct          INTEGER NOT NULL,
                response_time_ms INTEGER NOT NULL,
                timestamp        TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("responses table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_responses_session ON responses(session_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("responses index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("updated_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `SessionSummary` from the indexed summary columns.
    fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSummary, StoreError> {
        let col = |e: sqlx::Error, name: &str| StoreError::Storage(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| col(e, "id"))?;
        let user_id: String = row.try_get("user_id").map_err(|e| col(e, "user_id"))?;
        let domain: Option<String> = row.try_get("domain").map_err(|e| col(e, "domain"))?;
        let theta: f64 = row.try_get("theta").map_err(|e| col(e, "theta"))?;
        let standard_error: f64 = row
            .try_get("standard_error")
            .map_err(|e| col(e, "standard_error"))?;
        let items_administered: i64 = row
            .try_get("items_administered")
            .map_err(|e| col(e, "items_administered"))?;
        let state_str: String = row.try_get("state").map_err(|e| col(e, "state"))?;
        let completion_str: Option<String> =
            row.try_get("completion").map_err(|e| col(e, "completion"))?;
        let started_at_str: String = row.try_get("started_at").map_err(|e| col(e, "started_at"))?;
        let updated_at_str: String = row.try_get("updated_at").map_err(|e| col(e, "updated_at"))?;

        // States and reasons are stored as their serde snake_case names.
        let state: SessionState = serde_json::from_value(serde_json::Value::String(state_str))
            .map_err(|e| StoreError::Serialization(format!("state decode: {e}")))?;
        let completion: Option<CompletionReason> = match completion_str {
            Some(s) => Some(
                serde_json::from_value(serde_json::Value::String(s))
                    .map_err(|e| StoreError::Serialization(format!("completion decode: {e}")))?,
            ),
            None => None,
        };

        let parse_ts = |s: &str| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| StoreError::Serialization(format!("timestamp decode: {e}")))
        };

        Ok(SessionSummary {
            id: SessionId(id),
            user_id,
            domain,
            theta,
            standard_error,
            items_administered: items_administered as usize,
            state,
            completion,
            started_at: parse_ts(&started_at_str)?,
            updated_at: parse_ts(&updated_at_str)?,
        })
    }

    fn enum_name<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(s)) => Ok(s),
            Ok(other) => Err(StoreError::Serialization(format!(
                "expected string-encoded enum, got {other}"
            ))),
            Err(e) => Err(StoreError::Serialization(e.to_string())),
        }
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let document = serde_json::to_string(session)
            .map_err(|e| StoreError::Serialization(format!("Session encode: {e}")))?;
        let state = Self::enum_name(&session.state)?;
        let completion = session
            .completion
            .as_ref()
            .map(Self::enum_name)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, user_id, domain, theta, standard_error, items_administered,
                 state, completion, started_at, updated_at, document)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                theta = excluded.theta,
                standard_error = excluded.standard_error,
                items_administered = excluded.items_administered,
                state = excluded.state,
                completion = excluded.completion,
                updated_at = excluded.updated_at,
                document = excluded.document
            "#,
        )
        .bind(session.id.to_string())
        .bind(&session.user_id)
        .bind(&session.domain)
        .bind(session.theta)
        .bind(session.standard_error)
        .bind(session.administered.len() as i64)
        .bind(&state)
        .bind(&completion)
        .bind(session.started_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .bind(&document)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Session upsert failed: {e}")))?;

        debug!(session_id = %session.id, "Saved session");
        Ok(())
    }

    async fn append_response(
        &self,
        session_id: &str,
        response: &Response,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO responses (session_id, item_id, correct, response_time_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(session_id)
        .bind(&response.item_id)
        .bind(response.correct)
        .bind(response.response_time_ms as i64)
        .bind(response.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Response insert failed: {e}")))?;

        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query("SELECT document FROM sessions WHERE id = ?1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Session load failed: {e}")))?;

        match row {
            Some(row) => {
                let document: String = row
                    .try_get("document")
                    .map_err(|e| StoreError::Storage(format!("document column: {e}")))?;
                let session = serde_json::from_str(&document)
                    .map_err(|e| StoreError::Serialization(format!("Session decode: {e}")))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, domain, theta, standard_error, items_administered,
                   state, completion, started_at, updated_at
            FROM sessions
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Session list failed: {e}")))?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        sqlx::query("DELETE FROM responses WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Response delete failed: {e}")))?;

        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Session delete failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
