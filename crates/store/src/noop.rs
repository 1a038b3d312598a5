//! No-op store — disables session persistence entirely.
//!
//! Sessions live only in the orchestrator's memory and vanish on restart.

use async_trait::async_trait;

use caliper_core::error::StoreError;
use caliper_core::response::Response;
use caliper_core::session::{Session, SessionSummary};
use caliper_core::store::SessionStore;

/// A session store that persists nothing.
pub struct NoopStore;

#[async_trait]
impl SessionStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn save(&self, _session: &Session) -> Result<(), StoreError> {
        Ok(())
    }

    async fn append_response(
        &self,
        _session_id: &str,
        _response: &Response,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load(&self, _session_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _session_id: &str) -> Result<bool, StoreError> {
        Ok(false)
    }
}
