//! Stopping-rule evaluation.
//!
//! Rules are checked in a fixed precedence order so the item cap is a hard
//! ceiling no matter what the precision target says:
//!
//! 1. `responses.len() >= max_items`  → stop (`ItemCapReached`)
//! 2. `responses.len() <  min_items`  → never stop
//! 3. `se <= target_se`               → stop (`PrecisionReached`)
//! 4. wall-clock budget exceeded      → stop (`TimeBudgetExceeded`)
//!
//! Bank exhaustion is not a rule here; the orchestrator forces completion
//! directly when selection returns nothing.

use chrono::{DateTime, Utc};

use caliper_core::session::{CompletionReason, Session};

/// Decide whether `session` should terminate now.
pub fn evaluate_stopping(session: &Session, now: DateTime<Utc>) -> Option<CompletionReason> {
    let n = session.responses.len();
    let s = &session.settings;

    if n >= s.max_items {
        return Some(CompletionReason::ItemCapReached);
    }
    if n < s.min_items {
        return None;
    }
    if session.standard_error <= s.target_se {
        return Some(CompletionReason::PrecisionReached);
    }
    if let Some(budget) = s.max_seconds {
        if session.elapsed_secs(now) >= budget as i64 {
            return Some(CompletionReason::TimeBudgetExceeded);
        }
    }
    None
}
