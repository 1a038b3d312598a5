//! Session store trait — persistence for sessions and their responses.
//!
//! Responses are immutable and append-only; the session document itself is
//! rewritten on save. No transactional requirement beyond that: a saved and
//! reloaded completed session must reproduce identical θ / SE / responses.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::response::Response;
use crate::session::{Session, SessionSummary};

/// The session persistence contract.
///
/// Implementations: SQLite, JSONL file, in-memory (for testing), none (no-op).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "file", "memory", "none").
    fn name(&self) -> &str;

    /// Persist the full session document (upsert by id).
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Append one immutable response record for a session.
    async fn append_response(&self, session_id: &str, response: &Response)
    -> Result<(), StoreError>;

    /// Load a session by id.
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Summaries of all stored sessions, most recently updated first.
    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError>;

    /// Delete a session and its responses. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, StoreError>;
}
