//! Calibrated item types.
//!
//! An item's calibration parameters (`a`, `b`, `c`) are fixed once the bank
//! is loaded. The only runtime mutation is the exposure counter, owned by
//! the bank itself so increments can be made atomic across sessions.

use serde::{Deserialize, Serialize};

/// Unique identifier for a calibrated item.
pub type ItemId = String;

/// A calibrated assessment item.
///
/// Parameters follow the standard IRT notation: `a` is discrimination,
/// `b` is difficulty, and `c` is the lower asymptote (guessing) used by
/// the 3PL model. Items without a guessing parameter behave as 2PL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique item ID
    pub id: ItemId,

    /// Discrimination parameter (a). Must be positive.
    pub a: f64,

    /// Difficulty parameter (b).
    pub b: f64,

    /// Guessing parameter (c) for 3PL items. `None` means 2PL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,

    /// The concept this item probes (e.g. "linear-equations").
    pub concept_tag: String,

    /// Broad content category used for content balancing.
    pub content_category: String,

    /// The item prompt shown to the respondent.
    pub prompt: String,

    /// The correct answer. Never leaves the server.
    pub answer_key: String,

    /// How many times this item has been administered across all sessions.
    /// Mutated only by the bank; serialized for bank inspection tooling.
    #[serde(default)]
    pub exposure_count: u64,
}

impl Item {
    /// The effective guessing parameter (0.0 for 2PL items).
    pub fn guessing(&self) -> f64 {
        self.c.unwrap_or(0.0)
    }

    /// Grade a raw answer against this item's key.
    ///
    /// Comparison is trimmed and case-insensitive so "  X=4 " matches "x=4".
    pub fn grade(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(self.answer_key.trim())
    }

    /// The client-facing view of this item (no calibration, no key).
    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id.clone(),
            concept_tag: self.concept_tag.clone(),
            content_category: self.content_category.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

/// What a respondent is allowed to see about an item.
///
/// Calibration parameters and the answer key stay server-side: leaking
/// difficulty would bias responses, leaking the key would end the test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub concept_tag: String,
    pub content_category: String,
    pub prompt: String,
}
