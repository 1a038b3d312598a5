//! File-based store — session documents plus an append-only response log.
//!
//! Two JSONL files under the store directory:
//! - `sessions.jsonl` — one line per session document, rewritten on save
//! - `responses.jsonl` — one line per scored response, append-only
//!
//! Simple, portable, human-inspectable, and requires no external database.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use caliper_core::error::StoreError;
use caliper_core::response::Response;
use caliper_core::session::{Session, SessionSummary};
use caliper_core::store::SessionStore;

/// One line in `responses.jsonl`.
#[derive(Debug, Serialize, Deserialize)]
struct ResponseRecord {
    session_id: String,
    #[serde(flatten)]
    response: Response,
}

/// A file-backed session store using JSONL.
///
/// Sessions are loaded into memory on creation and the session file is
/// rewritten on every save. The response log is append-only and never read
/// back by the engine; it exists for audit and offline recalibration.
pub struct FileStore {
    dir: PathBuf,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl FileStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn new(dir: PathBuf) -> Self {
        let sessions = Self::load_from_disk(&dir);
        debug!(dir = %dir.display(), count = sessions.len(), "File session store loaded");
        Self {
            dir,
            sessions: Arc::new(RwLock::new(sessions)),
        }
    }

    fn sessions_path(&self) -> PathBuf {
        self.dir.join("sessions.jsonl")
    }

    fn responses_path(&self) -> PathBuf {
        self.dir.join("responses.jsonl")
    }

    fn load_from_disk(dir: &PathBuf) -> HashMap<String, Session> {
        let content = match std::fs::read_to_string(dir.join("sessions.jsonl")) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Session>(line) {
                Ok(session) => Some((session.id.to_string(), session)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted session record");
                    None
                }
            })
            .collect()
    }

    /// Rewrite the whole session file from the in-memory map.
    async fn flush(&self) -> Result<(), StoreError> {
        let sessions = self.sessions.read().await;

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Storage(format!("Failed to create store directory: {e}")))?;

        let mut content = String::new();
        for session in sessions.values() {
            let line = serde_json::to_string(session)
                .map_err(|e| StoreError::Serialization(format!("Session encode: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(self.sessions_path(), &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write session file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.to_string(), session.clone());
        self.flush().await
    }

    async fn append_response(
        &self,
        session_id: &str,
        response: &Response,
    ) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Storage(format!("Failed to create store directory: {e}")))?;

        let record = ResponseRecord {
            session_id: session_id.to_string(),
            response: response.clone(),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(format!("Response encode: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.responses_path())
            .map_err(|e| StoreError::Storage(format!("Failed to open response log: {e}")))?;
        writeln!(file, "{line}")
            .map_err(|e| StoreError::Storage(format!("Failed to append response: {e}")))?;

        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(Session::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }
}
