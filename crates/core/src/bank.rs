//! Item bank trait — the calibrated item inventory.
//!
//! Read-mostly: calibration parameters never change after load. The single
//! mutation is the exposure counter, bumped once per administration, and
//! implementations must make that increment atomic so concurrent sessions
//! never lose updates.

use async_trait::async_trait;

use crate::error::BankError;
use crate::item::{Item, ItemId};

/// Filter for candidate selection.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    /// Items already administered in this session — never re-served.
    pub exclude: Vec<ItemId>,

    /// Restrict to a content category (the session's domain), if set.
    pub content_category: Option<String>,
}

impl CandidateFilter {
    pub fn excluding(exclude: &[ItemId]) -> Self {
        Self {
            exclude: exclude.to_vec(),
            content_category: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.content_category = category;
        self
    }
}

/// The item bank contract.
///
/// Implementations: in-memory bank loaded from a JSON file (production),
/// hand-built banks in tests.
#[async_trait]
pub trait ItemBank: Send + Sync {
    /// The bank name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Fetch an item by id. `None` callers should map to `BankError::ItemNotFound`.
    async fn get(&self, id: &str) -> Option<Item>;

    /// All items satisfying the filter, with current exposure counts.
    /// Returns `BankError::Empty` when nothing is eligible.
    async fn candidates(&self, filter: &CandidateFilter) -> Result<Vec<Item>, BankError>;

    /// Atomically bump the exposure counter after an administration.
    async fn record_administration(&self, id: &str) -> Result<(), BankError>;

    /// Total item count.
    async fn len(&self) -> usize;

    /// Distinct content categories present in the bank.
    async fn categories(&self) -> Vec<String>;
}
