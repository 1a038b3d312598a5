//! In-memory item bank.
//!
//! Calibration data is immutable after construction, so items live in a
//! plain `Vec` with an id index. Exposure counters are the one piece of
//! cross-session mutable state; they are `AtomicU64` so concurrent
//! sessions never lose an increment.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use caliper_core::bank::{CandidateFilter, ItemBank};
use caliper_core::error::BankError;
use caliper_core::item::Item;

/// The production item bank: loaded once at startup, shared by handle.
#[derive(Debug)]
pub struct InMemoryBank {
    items: Vec<Item>,
    index: HashMap<String, usize>,
    exposure: Vec<AtomicU64>,
}

impl InMemoryBank {
    /// Build a bank from calibrated items.
    ///
    /// Rejects duplicate ids, non-positive discrimination, and guessing
    /// parameters outside `[0, 1)`.
    pub fn new(items: Vec<Item>) -> Result<Self, BankError> {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if item.a <= 0.0 {
                return Err(BankError::InvalidItem {
                    id: item.id.clone(),
                    reason: format!("discrimination must be positive, got {}", item.a),
                });
            }
            if let Some(c) = item.c {
                if !(0.0..1.0).contains(&c) {
                    return Err(BankError::InvalidItem {
                        id: item.id.clone(),
                        reason: format!("guessing parameter must be in [0, 1), got {c}"),
                    });
                }
            }
            if index.insert(item.id.clone(), i).is_some() {
                return Err(BankError::InvalidItem {
                    id: item.id.clone(),
                    reason: "duplicate item id".into(),
                });
            }
        }
        let exposure = items
            .iter()
            .map(|i| AtomicU64::new(i.exposure_count))
            .collect();
        Ok(Self {
            items,
            index,
            exposure,
        })
    }

    fn item_at(&self, idx: usize) -> Item {
        let mut item = self.items[idx].clone();
        item.exposure_count = self.exposure[idx].load(Ordering::Relaxed);
        item
    }
}

#[async_trait]
impl ItemBank for InMemoryBank {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, id: &str) -> Option<Item> {
        self.index.get(id).map(|&idx| self.item_at(idx))
    }

    async fn candidates(&self, filter: &CandidateFilter) -> Result<Vec<Item>, BankError> {
        let eligible: Vec<Item> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !filter.exclude.contains(&item.id))
            .filter(|(_, item)| {
                filter
                    .content_category
                    .as_ref()
                    .is_none_or(|cat| &item.content_category == cat)
            })
            .map(|(idx, _)| self.item_at(idx))
            .collect();

        if eligible.is_empty() {
            return Err(BankError::Empty);
        }
        Ok(eligible)
    }

    async fn record_administration(&self, id: &str) -> Result<(), BankError> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| BankError::ItemNotFound(id.to_string()))?;
        self.exposure[idx].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.items.len()
    }

    async fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self
            .items
            .iter()
            .map(|i| i.content_category.clone())
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }
}
