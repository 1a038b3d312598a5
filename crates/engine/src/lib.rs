//! The Caliper assessment engine — IRT numerics and session orchestration.
//!
//! Module map:
//! - [`irt`] — the 2PL/3PL response model and Fisher information
//! - [`estimator`] — Newton-Raphson maximum-likelihood ability estimation
//! - [`selector`] — maximum-information CAT item selection with exposure control
//! - [`stopping`] — ordered stopping-rule evaluation
//! - [`orchestrator`] — the session state machine and sole writer of session state
//! - [`simulate`] — simulated respondents for testing and the `simulate` command

pub mod estimator;
pub mod irt;
pub mod orchestrator;
pub mod selector;
pub mod simulate;
pub mod stopping;

pub use estimator::{Estimate, estimate_ability};
pub use orchestrator::{
    CompletionReport, Next, Orchestrator, RespondOutcome, SettingsOverrides, StartOutcome,
};
pub use selector::{Selection, select_next};
pub use simulate::{SimulatedRespondent, SimulationResult, run_simulated_session};
pub use stopping::evaluate_stopping;
