//! Telemetry report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completed-session counts broken down by termination reason.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionCounts {
    pub item_cap_reached: u64,
    pub precision_reached: u64,
    pub time_budget_exceeded: u64,
    pub bank_exhausted: u64,
    pub abandoned: u64,
}

impl CompletionCounts {
    pub fn total(&self) -> u64 {
        self.item_cap_reached
            + self.precision_reached
            + self.time_budget_exceeded
            + self.bank_exhausted
            + self.abandoned
    }
}

/// A point-in-time usage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// When the engine started collecting.
    pub since: DateTime<Utc>,

    /// Sessions started.
    pub sessions_started: u64,

    /// Completed sessions by reason.
    pub completions: CompletionCounts,

    /// Items administered across all sessions.
    pub items_administered: u64,

    /// Responses scored.
    pub responses_scored: u64,

    /// Of those, how many were correct.
    pub correct_responses: u64,

    /// Times Newton-Raphson hit the iteration cap and fell back.
    pub estimation_fallbacks: u64,

    /// Mean administered items per completed session (0.0 when none).
    pub mean_items_per_completed_session: f64,
}
