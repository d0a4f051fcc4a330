//! Directional hit-rate test.
//!
//! A pair is a hit when the sign of the net exposure change agrees with the
//! sign of the forward return. Pairs with a zero on either side are neither
//! hits nor misses, so `n_obs` can be smaller than `n_pairs`. The hit rate is
//! tested against 0.5 with an exact two-sided binomial test.

use super::FlowSample;
use inst_flow_core::{FlowError, FlowResult, HitRateValidation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalAnalysis {
    /// All pairs handed to the test
    pub n_pairs: usize,
    /// Pairs with a non-zero sign on both sides
    pub n_obs: usize,
    pub hits: usize,
    pub misses: usize,
    /// hits / n_obs
    pub hit_rate: f64,
    /// Exact two-sided binomial p-value (H0: hit rate = 0.5)
    pub p_value: f64,
    /// Wilson 95% interval for the hit rate
    pub wilson_ci_lower: f64,
    pub wilson_ci_upper: f64,
    pub is_significant_05: bool,
    pub is_significant_10: bool,
}

impl DirectionalAnalysis {
    /// True if the whole 95% interval lies above a coin flip.
    #[must_use]
    pub fn has_positive_edge(&self) -> bool {
        self.wilson_ci_lower > 0.5
    }
}

/// Counts hits and misses and runs the binomial test.
///
/// # Errors
/// `InsufficientSample` when no pair has a non-zero sign on both sides.
pub fn test_directional_accuracy(sample: &FlowSample) -> FlowResult<DirectionalAnalysis> {
    let n_pairs = sample.len();

    let (hits, misses) = sample
        .exposure
        .iter()
        .zip(&sample.returns)
        .filter(|(x, y)| **x != 0.0 && **y != 0.0)
        .fold((0usize, 0usize), |(hits, misses), (x, y)| {
            if (*x > 0.0) == (*y > 0.0) {
                (hits + 1, misses)
            } else {
                (hits, misses + 1)
            }
        });
    let n_obs = hits + misses;

    let validation = HitRateValidation::from_counts(hits, n_obs).ok_or(FlowError::InsufficientSample {
        test: "directional",
        required: 1,
        actual: 0,
    })?;

    tracing::debug!(
        "Directional test: {}/{} hits over {} pairs, p={:.4}",
        hits,
        n_obs,
        n_pairs,
        validation.p_value
    );

    Ok(DirectionalAnalysis {
        n_pairs,
        n_obs,
        hits,
        misses,
        hit_rate: validation.hit_rate,
        p_value: validation.p_value,
        wilson_ci_lower: validation.wilson_ci_lower,
        wilson_ci_upper: validation.wilson_ci_upper,
        is_significant_05: validation.p_value < 0.05,
        is_significant_10: validation.p_value < 0.10,
    })
}
