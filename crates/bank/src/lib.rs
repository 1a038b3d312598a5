//! Item bank implementations for Caliper.

pub mod in_memory;
pub mod loader;

pub use in_memory::InMemoryBank;
pub use loader::load_bank;

use caliper_core::item::Item;

/// A small built-in bank used by tests, `simulate`, and first-run demos.
///
/// Difficulties span the θ range so a CAT run has somewhere to go at every
/// ability level; discriminations vary so selection order is non-trivial.
pub fn demo_bank() -> InMemoryBank {
    let mut items = Vec::new();
    let params: &[(f64, f64)] = &[
        (0.8, -3.0),
        (1.0, -2.5),
        (1.4, -2.0),
        (0.9, -1.5),
        (1.6, -1.0),
        (1.1, -0.5),
        (1.8, 0.0),
        (1.2, 0.0),
        (1.5, 0.5),
        (0.9, 1.0),
        (1.7, 1.5),
        (1.0, 2.0),
        (1.3, 2.5),
        (0.8, 3.0),
    ];
    for (i, (a, b)) in params.iter().enumerate() {
        items.push(Item {
            id: format!("demo-{:03}", i + 1),
            a: *a,
            b: *b,
            c: None,
            concept_tag: "arithmetic".into(),
            content_category: "demo".into(),
            prompt: format!("Demo item #{} (difficulty {b})", i + 1),
            answer_key: "42".into(),
            exposure_count: 0,
        });
    }
    InMemoryBank::new(items).expect("demo bank is valid by construction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use caliper_core::bank::{CandidateFilter, ItemBank};

    #[tokio::test]
    async fn demo_bank_is_usable() {
        let bank = demo_bank();
        assert!(bank.len().await >= 10);
        let all = bank.candidates(&CandidateFilter::default()).await.unwrap();
        assert!(all.iter().all(|i| i.a > 0.0));
        assert_eq!(bank.categories().await, vec!["demo".to_string()]);
    }
}
