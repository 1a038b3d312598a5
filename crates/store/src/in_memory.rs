//! In-memory store — useful for testing and ephemeral deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use caliper_core::error::StoreError;
use caliper_core::response::Response;
use caliper_core::session::{Session, SessionSummary};
use caliper_core::store::SessionStore;

/// A session store backed by a HashMap. Nothing survives a restart.
pub struct InMemoryStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.to_string(), session.clone());
        Ok(())
    }

    async fn append_response(
        &self,
        _session_id: &str,
        _response: &Response,
    ) -> Result<(), StoreError> {
        // The session document saved on every transition already carries the
        // full response history; no separate log needed in memory.
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
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_core::session::{AssessmentSettings, CompletionReason};

    fn session(user: &str) -> Session {
        Session::new(user, None, AssessmentSettings::default())
    }

    #[tokio::test]
    async fn save_and_load() {
        let store = InMemoryStore::new();
        let mut s = session("user-1");
        s.theta = 0.7;
        store.save(&s).await.unwrap();

        let loaded = store.load(&s.id.to_string()).await.unwrap().unwrap();
        assert_eq!(loaded.theta, 0.7);
        assert_eq!(loaded.user_id, "user-1");
    }

    #[tokio::test]
    async fn save_overwrites() {
        let store = InMemoryStore::new();
        let mut s = session("user-1");
        store.save(&s).await.unwrap();

        s.theta = 1.2;
        s.complete(CompletionReason::PrecisionReached);
        store.save(&s).await.unwrap();

        let loaded = store.load(&s.id.to_string()).await.unwrap().unwrap();
        assert_eq!(loaded.theta, 1.2);
        assert!(loaded.is_completed());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = InMemoryStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_session() {
        let store = InMemoryStore::new();
        let s = session("user-1");
        store.save(&s).await.unwrap();

        assert!(store.delete(&s.id.to_string()).await.unwrap());
        assert!(!store.delete(&s.id.to_string()).await.unwrap());
        assert!(store.load(&s.id.to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_newest_first() {
        let store = InMemoryStore::new();
        let a = session("user-a");
        store.save(&a).await.unwrap();
        let mut b = session("user-b");
        b.updated_at = b.updated_at + chrono::Duration::seconds(5);
        store.save(&b).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user_id, "user-b");
    }
}
