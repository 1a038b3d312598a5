//! Maximum-likelihood ability estimation.
//!
//! Newton-Raphson (Fisher scoring: the expected information replaces the
//! observed second derivative, which keeps every step well-defined) on the
//! response log-likelihood. Convergence is judged on actual movement of θ
//! *after* clamping to the configured range, so an all-correct or
//! all-incorrect history settles at the range bound instead of being
//! reported as divergent.

use caliper_config::EstimatorConfig;
use caliper_core::item::Item;
use caliper_core::response::Response;
use caliper_core::session::AssessmentSettings;

use crate::irt;

/// Result of one ability estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Ability estimate (θ), clamped to the configured range.
    pub theta: f64,
    /// Standard error from the test information function.
    pub se: f64,
    /// False when Newton-Raphson hit the iteration cap; the caller keeps
    /// going with the fallback θ baked into this estimate.
    pub converged: bool,
}

/// Largest single Newton step; oversized early steps otherwise overshoot
/// badly on short response histories.
const MAX_STEP: f64 = 1.0;

/// Estimate ability from the full response history.
///
/// `current_theta` is the session's running estimate: it seeds the search
/// and is the fallback when the search does not converge. With fewer than
/// two responses the MLE does not exist, so the configured prior is
/// returned directly.
pub fn estimate_ability(
    history: &[(Response, Item)],
    current_theta: f64,
    settings: &AssessmentSettings,
    cfg: &EstimatorConfig,
) -> Estimate {
    if history.len() <= 1 {
        return Estimate {
            theta: settings.prior_theta,
            se: settings.prior_se,
            converged: true,
        };
    }

    let clamp = |t: f64| t.clamp(settings.theta_min, settings.theta_max);
    let mut theta = clamp(current_theta);
    let mut converged = false;

    for _ in 0..cfg.max_iterations {
        let score: f64 = history
            .iter()
            .map(|(r, item)| irt::score(theta, item, if r.correct { 1.0 } else { 0.0 }))
            .sum();
        let info: f64 = history.iter().map(|(_, item)| irt::information(theta, item)).sum();

        if info <= f64::EPSILON {
            break;
        }

        let step = (score / info).clamp(-MAX_STEP, MAX_STEP);
        let next = clamp(theta + step);
        let moved = (next - theta).abs();
        theta = next;

        if moved < cfg.convergence_tol {
            converged = true;
            break;
        }
    }

    if !converged {
        theta = clamp(current_theta);
    }

    let info: f64 = history.iter().map(|(_, item)| irt::information(theta, item)).sum();
    let se = if info > 0.0 {
        1.0 / info.sqrt()
    } else {
        settings.prior_se
    };

    Estimate { theta, se, converged }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, a: f64, b: f64) -> Item {
        Item {
            id: id.into(),
            a,
            b,
            c: None,
            concept_tag: "t".into(),
            content_category: "t".into(),
            prompt: "t".into(),
            answer_key: "t".into(),
            exposure_count: 0,
        }
    }

    fn history(pattern: &[(f64, bool)]) -> Vec<(Response, Item)> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, (b, correct))| {
                let it = item(&format!("i{i}"), 1.0, *b);
                (Response::new(it.id.clone(), *correct, 1_000), it)
            })
            .collect()
    }

    fn defaults() -> (AssessmentSettings, EstimatorConfig) {
        (AssessmentSettings::default(), EstimatorConfig::default())
    }

    #[test]
    fn empty_history_returns_prior() {
        let (settings, cfg) = defaults();
        let est = estimate_ability(&[], 0.7, &settings, &cfg);
        assert_eq!(est.theta, settings.prior_theta);
        assert_eq!(est.se, settings.prior_se);
        assert!(est.converged);
    }

    #[test]
    fn single_response_returns_prior() {
        let (settings, cfg) = defaults();
        let est = estimate_ability(&history(&[(0.0, true)]), 0.7, &settings, &cfg);
        assert_eq!(est.theta, settings.prior_theta);
        assert_eq!(est.se, settings.prior_se);
    }

    #[test]
    fn mixed_history_converges_between_difficulties() {
        let (settings, cfg) = defaults();
        // Correct on easy items, incorrect on hard ones: θ lands in between.
        let est = estimate_ability(
            &history(&[(-1.0, true), (-0.5, true), (0.5, false), (1.0, false)]),
            0.0,
            &settings,
            &cfg,
        );
        assert!(est.converged);
        assert!(est.theta > -1.0 && est.theta < 1.0);
        assert!(est.se > 0.0 && est.se.is_finite());
    }

    #[test]
    fn all_correct_clamps_at_upper_bound() {
        let (settings, cfg) = defaults();
        let est = estimate_ability(
            &history(&[(-1.0, true), (0.0, true), (1.0, true), (2.0, true)]),
            0.0,
            &settings,
            &cfg,
        );
        assert!(est.converged);
        assert_eq!(est.theta, settings.theta_max);
        assert!(est.se.is_finite() && est.se > 0.0);
    }

    #[test]
    fn all_incorrect_clamps_at_lower_bound() {
        let (settings, cfg) = defaults();
        let est = estimate_ability(
            &history(&[(-2.0, false), (-1.0, false), (0.0, false), (1.0, false)]),
            0.0,
            &settings,
            &cfg,
        );
        assert!(est.converged);
        assert_eq!(est.theta, settings.theta_min);
    }

    #[test]
    fn more_responses_tighten_the_standard_error() {
        let (settings, cfg) = defaults();
        let short = estimate_ability(
            &history(&[(-0.5, true), (0.5, false)]),
            0.0,
            &settings,
            &cfg,
        );
        let long = estimate_ability(
            &history(&[
                (-0.5, true),
                (0.5, false),
                (-0.3, true),
                (0.3, false),
                (-0.1, true),
                (0.1, false),
            ]),
            0.0,
            &settings,
            &cfg,
        );
        assert!(long.se < short.se);
    }

    #[test]
    fn estimate_recovers_a_known_ability() {
        let (settings, cfg) = defaults();
        // Deterministic response pattern of a respondent near θ = 1:
        // correct below their ability, incorrect above it.
        let pattern: Vec<(f64, bool)> = (-8..=12)
            .map(|i| {
                let b = i as f64 * 0.25;
                (b, b < 1.0)
            })
            .collect();
        let est = estimate_ability(&history(&pattern), 0.0, &settings, &cfg);
        assert!(est.converged);
        assert!((est.theta - 1.0).abs() < 0.5, "theta = {}", est.theta);
    }

    #[test]
    fn iteration_cap_falls_back_to_current_theta() {
        let settings = AssessmentSettings::default();
        let cfg = EstimatorConfig {
            convergence_tol: 1e-12,
            max_iterations: 1,
        };
        let est = estimate_ability(
            &history(&[(-1.0, true), (1.0, false), (0.0, true), (0.5, false)]),
            0.25,
            &settings,
            &cfg,
        );
        assert!(!est.converged);
        assert_eq!(est.theta, 0.25);
    }
}
