//! Bank file loading.
//!
//! A bank file is a JSON array of item records:
//!
//! ```json
//! [
//!   {"id": "alg-001", "a": 1.2, "b": -0.5, "concept_tag": "linear-equations",
//!    "content_category": "algebra", "prompt": "Solve 2x + 3 = 11",
//!    "answer_key": "x=4"}
//! ]
//! ```
//!
//! Validation (duplicate ids, parameter ranges) happens in
//! `InMemoryBank::new` so hand-built and file-loaded banks are held to the
//! same rules.

use std::path::Path;
use tracing::info;

use caliper_core::error::BankError;
use caliper_core::item::Item;

use crate::in_memory::InMemoryBank;

/// Load and validate an item bank from a JSON file.
pub fn load_bank(path: &Path) -> Result<InMemoryBank, BankError> {
    let content = std::fs::read_to_string(path).map_err(|e| BankError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let items: Vec<Item> = serde_json::from_str(&content).map_err(|e| BankError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if items.is_empty() {
        return Err(BankError::Load {
            path: path.display().to_string(),
            reason: "bank file contains no items".into(),
        });
    }

    let bank = InMemoryBank::new(items)?;
    info!(path = %path.display(), "Item bank loaded");
    Ok(bank)
}
