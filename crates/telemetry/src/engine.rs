//! Thread-safe telemetry engine — collects per-session and per-response
//! counters and serves usage reports.

use chrono::{DateTime, Utc};
use std::sync::RwLock;

use caliper_core::session::CompletionReason;

use crate::model::{CompletionCounts, UsageSnapshot};

/// The core telemetry engine.
///
/// Thread-safe via `RwLock`. All counters are process-lifetime running
/// totals; there is nothing to persist.
pub struct TelemetryEngine {
    since: DateTime<Utc>,
    totals: RwLock<RunningTotals>,
}

#[derive(Debug, Default)]
struct RunningTotals {
    sessions_started: u64,
    completions: CompletionCounts,
    items_administered: u64,
    responses_scored: u64,
    correct_responses: u64,
    estimation_fallbacks: u64,
    /// Sum of administered-item counts over completed sessions, for the mean.
    completed_item_sum: u64,
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self {
            since: Utc::now(),
            totals: RwLock::new(RunningTotals::default()),
        }
    }

    pub fn record_session_started(&self) {
        self.totals.write().unwrap().sessions_started += 1;
    }

    pub fn record_item_administered(&self) {
        self.totals.write().unwrap().items_administered += 1;
    }

    pub fn record_response(&self, correct: bool) {
        let mut t = self.totals.write().unwrap();
        t.responses_scored += 1;
        if correct {
            t.correct_responses += 1;
        }
    }

    pub fn record_fallback(&self) {
        self.totals.write().unwrap().estimation_fallbacks += 1;
    }

    pub fn record_completion(&self, reason: CompletionReason, items_administered: usize) {
        let mut t = self.totals.write().unwrap();
        match reason {
            CompletionReason::ItemCapReached => t.completions.item_cap_reached += 1,
            CompletionReason::PrecisionReached => t.completions.precision_reached += 1,
            CompletionReason::TimeBudgetExceeded => t.completions.time_budget_exceeded += 1,
            CompletionReason::BankExhausted => t.completions.bank_exhausted += 1,
            CompletionReason::Abandoned => t.completions.abandoned += 1,
        }
        t.completed_item_sum += items_administered as u64;
    }

    /// Current usage report.
    pub fn usage_snapshot(&self) -> UsageSnapshot {
        let t = self.totals.read().unwrap();
        let completed = t.completions.total();
        UsageSnapshot {
            since: self.since,
            sessions_started: t.sessions_started,
            completions: t.completions,
            items_administered: t.items_administered,
            responses_scored: t.responses_scored,
            correct_responses: t.correct_responses,
            estimation_fallbacks: t.estimation_fallbacks,
            mean_items_per_completed_session: if completed > 0 {
                t.completed_item_sum as f64 / completed as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new()
    }
}
