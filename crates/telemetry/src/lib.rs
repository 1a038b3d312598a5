//! Usage telemetry for Caliper — running totals over sessions, items, and
//! estimator behavior, served as a snapshot at `/v1/usage`.

pub mod engine;
pub mod model;

pub use engine::TelemetryEngine;
pub use model::{CompletionCounts, UsageSnapshot};
