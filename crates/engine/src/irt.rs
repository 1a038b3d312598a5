//! The item response model.
//!
//! Probability of a correct response under the 3PL model:
//!
//! ```text
//! P(θ) = c + (1 - c) / (1 + exp(-a(θ - b)))
//! ```
//!
//! Items without a guessing parameter (c = 0) reduce to the standard 2PL.
//! Fisher information for 3PL uses the Birnbaum form
//! `a² · (q/p) · ((p - c)/(1 - c))²`, which collapses to `a² p q` at c = 0.

use caliper_core::item::Item;

/// Probability of a correct response to `item` at ability `theta`.
pub fn probability(theta: f64, item: &Item) -> f64 {
    let c = item.guessing();
    let logistic = 1.0 / (1.0 + (-item.a * (theta - item.b)).exp());
    c + (1.0 - c) * logistic
}

/// Fisher information contributed by `item` at ability `theta`.
pub fn information(theta: f64, item: &Item) -> f64 {
    let c = item.guessing();
    let p = probability(theta, item);
    let q = 1.0 - p;
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    let ratio = (p - c) / (1.0 - c);
    item.a * item.a * (q / p) * ratio * ratio
}

/// Score contribution (∂ log L / ∂θ) of one response.
///
/// `u` is 1.0 for a correct response, 0.0 for incorrect.
pub fn score(theta: f64, item: &Item, u: f64) -> f64 {
    let c = item.guessing();
    let p = probability(theta, item);
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    item.a * (u - p) * (p - c) / (p * (1.0 - c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(a: f64, b: f64, c: Option<f64>) -> Item {
        Item {
            id: "t".into(),
            a,
            b,
            c,
            concept_tag: "t".into(),
            content_category: "t".into(),
            prompt: "t".into(),
            answer_key: "t".into(),
            exposure_count: 0,
        }
    }

    #[test]
    fn probability_is_half_at_difficulty() {
        // 2PL: P(b) = 0.5 regardless of discrimination
        assert!((probability(0.7, &item(1.3, 0.7, None)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn probability_is_monotonic_in_theta() {
        let it = item(1.5, 0.0, None);
        let mut last = 0.0;
        for i in -40..=40 {
            let p = probability(i as f64 / 10.0, &it);
            assert!(p > last);
            last = p;
        }
    }

    #[test]
    fn guessing_raises_the_floor() {
        let it = item(1.0, 0.0, Some(0.25));
        let p = probability(-10.0, &it);
        assert!((p - 0.25).abs() < 1e-3);
    }

    #[test]
    fn information_peaks_at_difficulty_for_2pl() {
        let it = item(1.2, 0.5, None);
        let at_b = information(0.5, &it);
        assert!(at_b > information(-1.0, &it));
        assert!(at_b > information(2.0, &it));
        // Peak value for 2PL is a²/4
        assert!((at_b - 1.2 * 1.2 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn three_pl_information_matches_2pl_at_zero_guessing() {
        let two = item(1.4, -0.3, None);
        let three = item(1.4, -0.3, Some(0.0));
        for theta in [-2.0, 0.0, 1.5] {
            assert!((information(theta, &two) - information(theta, &three)).abs() < 1e-12);
        }
    }

    #[test]
    fn score_sign_follows_response() {
        let it = item(1.0, 0.0, None);
        assert!(score(0.0, &it, 1.0) > 0.0);
        assert!(score(0.0, &it, 0.0) < 0.0);
    }
}
