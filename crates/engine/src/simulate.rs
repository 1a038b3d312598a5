//! Simulated respondents — drive a full session against a real orchestrator
//! with answers drawn from the 2PL model at a known true ability.
//!
//! Used by the `caliper simulate` command and by calibration checks: with a
//! wide bank the final estimate should land near the true θ.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use caliper_core::error::Result;
use caliper_core::item::Item;
use caliper_core::session::CompletionReason;

use crate::irt;
use crate::orchestrator::{Next, Orchestrator, SettingsOverrides};

/// A model-driven respondent with a fixed true ability.
pub struct SimulatedRespondent {
    true_theta: f64,
    rng: StdRng,
}

impl SimulatedRespondent {
    pub fn new(true_theta: f64, seed: u64) -> Self {
        Self {
            true_theta,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn true_theta(&self) -> f64 {
        self.true_theta
    }

    /// Whether this respondent answers `item` correctly, sampled from the
    /// item's response model at the true ability.
    pub fn answers_correctly(&mut self, item: &Item) -> bool {
        self.rng.random::<f64>() < irt::probability(self.true_theta, item)
    }
}

/// One administered item in a simulated run.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryPoint {
    pub item_id: String,
    pub correct: bool,
    pub theta: f64,
    pub standard_error: f64,
}

/// Outcome of a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub session_id: String,
    pub true_theta: f64,
    pub final_theta: f64,
    pub final_standard_error: f64,
    pub reason: CompletionReason,
    pub items_administered: usize,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Run one full session with a simulated respondent at `true_theta`.
///
/// Deterministic for a given seed and bank.
pub async fn run_simulated_session(
    orchestrator: &Orchestrator,
    true_theta: f64,
    seed: u64,
    overrides: SettingsOverrides,
) -> Result<SimulationResult> {
    let bank = orchestrator.bank();
    let mut respondent = SimulatedRespondent::new(true_theta, seed);

    let start = orchestrator
        .start(format!("sim-{seed}"), None, overrides)
        .await?;
    let session_id = start.session.id.to_string();
    let mut trajectory = Vec::new();
    let mut next = start.next;

    let report = loop {
        match next {
            Next::Item(view) => {
                // The respondent "knows" the answer with model probability.
                let item = bank
                    .get(&view.id)
                    .await
                    .ok_or_else(|| caliper_core::error::BankError::ItemNotFound(view.id.clone()))?;
                let correct = respondent.answers_correctly(&item);
                let answer = if correct {
                    item.answer_key.clone()
                } else {
                    "(simulated incorrect)".to_string()
                };

                let out = orchestrator
                    .respond(&session_id, &view.id, &answer, 1_000)
                    .await?;
                debug!(
                    item_id = %view.id,
                    correct = out.correct,
                    theta = out.theta,
                    se = out.standard_error,
                    "Simulated response"
                );
                trajectory.push(TrajectoryPoint {
                    item_id: view.id,
                    correct: out.correct,
                    theta: out.theta,
                    standard_error: out.standard_error,
                });
                next = out.next;
            }
            Next::Report(report) => break report,
        }
    };

    Ok(SimulationResult {
        session_id,
        true_theta,
        final_theta: report.theta,
        final_standard_error: report.standard_error,
        reason: report.reason,
        items_administered: report.items_administered,
        trajectory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use caliper_bank::InMemoryBank;
    use caliper_config::EstimatorConfig;
    use caliper_core::bank::ItemBank;
    use caliper_core::event::EventBus;
    use caliper_core::item::Item;
    use caliper_core::session::AssessmentSettings;
    use caliper_store::InMemoryStore;

    fn wide_bank() -> Arc<dyn ItemBank> {
        let items = (0..60)
            .map(|i| Item {
                id: format!("w{i:03}"),
                a: 1.2 + (i % 4) as f64 * 0.2,
                b: -3.0 + i as f64 * 0.1,
                c: None,
                concept_tag: "sim".into(),
                content_category: "sim".into(),
                prompt: format!("w{i:03}"),
                answer_key: "k".into(),
                exposure_count: 0,
            })
            .collect();
        Arc::new(InMemoryBank::new(items).unwrap())
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            wide_bank(),
            Arc::new(InMemoryStore::new()),
            Arc::new(EventBus::default()),
            AssessmentSettings {
                min_items: 5,
                max_items: 40,
                target_se: 0.35,
                ..AssessmentSettings::default()
            },
            EstimatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn simulation_is_deterministic_for_a_seed() {
        let a = run_simulated_session(&orchestrator(), 0.5, 7, SettingsOverrides::default())
            .await
            .unwrap();
        let b = run_simulated_session(&orchestrator(), 0.5, 7, SettingsOverrides::default())
            .await
            .unwrap();
        assert_eq!(a.items_administered, b.items_administered);
        assert_eq!(a.final_theta, b.final_theta);
        let correctness: Vec<bool> = a.trajectory.iter().map(|t| t.correct).collect();
        let correctness_b: Vec<bool> = b.trajectory.iter().map(|t| t.correct).collect();
        assert_eq!(correctness, correctness_b);
    }

    #[tokio::test]
    async fn estimate_lands_near_true_ability() {
        let result = run_simulated_session(&orchestrator(), 1.0, 11, SettingsOverrides::default())
            .await
            .unwrap();
        assert!(
            (result.final_theta - 1.0).abs() < 1.0,
            "final theta {} too far from true 1.0",
            result.final_theta
        );
        assert!(result.items_administered >= 5);
    }

    #[tokio::test]
    async fn trajectory_matches_item_count() {
        let result = run_simulated_session(&orchestrator(), -0.5, 3, SettingsOverrides::default())
            .await
            .unwrap();
        assert_eq!(result.trajectory.len(), result.items_administered);
        let last = result.trajectory.last().unwrap();
        assert_eq!(last.theta, result.final_theta);
        assert_eq!(last.standard_error, result.final_standard_error);
    }
}
