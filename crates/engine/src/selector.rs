//! Maximum-information CAT item selection.
//!
//! Picks the eligible item with the highest Fisher information at the
//! current ability estimate. Ties (identical information, as with duplicate
//! calibrations) break by lowest exposure count — a standard exposure-
//! control heuristic that spreads item usage — then by lowest id so
//! selection is fully deterministic.

use std::sync::Arc;

use caliper_core::bank::{CandidateFilter, ItemBank};
use caliper_core::error::BankError;
use caliper_core::item::{Item, ItemId};

use crate::irt;

/// A successful pick.
#[derive(Debug, Clone)]
pub struct Selection {
    pub item: Item,
    /// Fisher information of the picked item at the θ used for selection.
    pub information: f64,
}

/// Select the next item, or `None` when the bank is exhausted for this
/// session. Exhaustion is a forced stop for the caller, not an error.
///
/// On a successful pick the administration is recorded with the bank
/// (atomic exposure increment) before returning.
pub async fn select_next(
    bank: &Arc<dyn ItemBank>,
    theta: f64,
    exclude: &[ItemId],
    content_category: Option<String>,
) -> Result<Option<Selection>, BankError> {
    let filter = CandidateFilter::excluding(exclude).with_category(content_category);
    let candidates = match bank.candidates(&filter).await {
        Ok(items) => items,
        Err(BankError::Empty) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut best: Option<(f64, Item)> = None;
    for item in candidates {
        let info = irt::information(theta, &item);
        let better = match &best {
            None => true,
            Some((best_info, best_item)) => {
                if info != *best_info {
                    info > *best_info
                } else if item.exposure_count != best_item.exposure_count {
                    item.exposure_count < best_item.exposure_count
                } else {
                    item.id < best_item.id
                }
            }
        };
        if better {
            best = Some((info, item));
        }
    }

    match best {
        Some((information, item)) => {
            bank.record_administration(&item.id).await?;
            Ok(Some(Selection { item, information }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_bank::InMemoryBank;

    fn item(id: &str, a: f64, b: f64) -> Item {
        Item {
            id: id.into(),
            a,
            b,
            c: None,
            concept_tag: "t".into(),
            content_category: "math".into(),
            prompt: id.into(),
            answer_key: "1".into(),
            exposure_count: 0,
        }
    }

    fn bank(items: Vec<Item>) -> Arc<dyn ItemBank> {
        Arc::new(InMemoryBank::new(items).unwrap())
    }

    #[tokio::test]
    async fn picks_the_most_informative_item() {
        // At θ = 0, the item with b closest to 0 and highest a wins.
        let bank = bank(vec![
            item("far", 1.0, 2.5),
            item("near", 1.0, 0.1),
            item("weak", 0.4, 0.0),
        ]);
        let sel = select_next(&bank, 0.0, &[], None).await.unwrap().unwrap();
        assert_eq!(sel.item.id, "near");
        assert!(sel.information > 0.0);
    }

    #[tokio::test]
    async fn tie_breaks_by_lower_exposure() {
        let b = InMemoryBank::new(vec![item("x", 1.0, 0.0), item("y", 1.0, 0.0)]).unwrap();
        // Give x a head start so y is the fresher item.
        b.record_administration("x").await.unwrap();
        let bank: Arc<dyn ItemBank> = Arc::new(b);

        let sel = select_next(&bank, 0.0, &[], None).await.unwrap().unwrap();
        assert_eq!(sel.item.id, "y");
    }

    #[tokio::test]
    async fn equal_exposure_tie_breaks_by_lower_id() {
        let bank = bank(vec![item("bbb", 1.0, 0.0), item("aaa", 1.0, 0.0)]);
        let sel = select_next(&bank, 0.0, &[], None).await.unwrap().unwrap();
        assert_eq!(sel.item.id, "aaa");
    }

    #[tokio::test]
    async fn excluded_items_are_skipped() {
        let bank = bank(vec![item("a", 1.5, 0.0), item("b", 0.8, 0.0)]);
        let sel = select_next(&bank, 0.0, &["a".to_string()], None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sel.item.id, "b");
    }

    #[tokio::test]
    async fn exhausted_bank_returns_none() {
        let bank = bank(vec![item("a", 1.5, 0.0)]);
        let sel = select_next(&bank, 0.0, &["a".to_string()], None).await.unwrap();
        assert!(sel.is_none());
    }

    #[tokio::test]
    async fn category_filter_applies() {
        let mut geo = item("geo-1", 2.0, 0.0);
        geo.content_category = "geometry".into();
        let bank = bank(vec![item("alg-1", 1.0, 0.0), geo]);

        let sel = select_next(&bank, 0.0, &[], Some("geometry".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sel.item.id, "geo-1");
    }

    #[tokio::test]
    async fn successful_pick_bumps_exposure() {
        let bank = bank(vec![item("a", 1.0, 0.0)]);
        select_next(&bank, 0.0, &[], None).await.unwrap().unwrap();
        assert_eq!(bank.get("a").await.unwrap().exposure_count, 1);
    }
}
