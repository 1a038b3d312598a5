//! The scored response value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// A single scored response. Immutable once created; sessions append
/// responses and never mutate or delete them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The item this response answers.
    pub item_id: ItemId,

    /// Whether the answer matched the item's key.
    pub correct: bool,

    /// Client-reported response latency.
    pub response_time_ms: u64,

    /// When the response was scored (server clock).
    pub timestamp: DateTime<Utc>,
}

impl Response {
    pub fn new(item_id: impl Into<ItemId>, correct: bool, response_time_ms: u64) -> Self {
        Self {
            item_id: item_id.into(),
            correct,
            response_time_ms,
            timestamp: Utc::now(),
        }
    }
}
