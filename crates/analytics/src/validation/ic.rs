//! Rank correlation (Spearman) between exposure change and forward return.
//!
//! Measures whether larger buying ranks with larger subsequent returns,
//! independent of the magnitudes. Robust to a single dominant manager and
//! to outlier quarters.

use super::correlation::MIN_CORRELATION_SAMPLES;
use super::FlowSample;
use inst_flow_core::validation::{
    correlation_t_stat, pearson_correlation, t_two_sided_p_value, unbounded,
};
use inst_flow_core::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// Result of rank (information coefficient) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ICAnalysis {
    /// Spearman rank correlation
    pub ic: f64,
    /// T-statistic for the IC
    #[serde(with = "unbounded")]
    pub ic_t_stat: f64,
    /// P-value for the IC (two-tailed)
    pub ic_p_value: f64,
    /// Number of samples used
    pub sample_size: usize,
}

impl ICAnalysis {
    /// Returns true if the IC is statistically significant at alpha = 0.05.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.ic_p_value < 0.05
    }

    /// Returns true if buying ranks with positive forward returns.
    #[must_use]
    pub fn has_predictive_power(&self) -> bool {
        self.ic > 0.0 && self.is_significant()
    }
}

/// Calculates ranks for a slice of values, handling ties with average rank.
///
/// # Returns
/// Vector of ranks (1-based, with ties averaged)
pub fn calculate_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }

        // positions start..end hold ranks start+1..=end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }

        start = end;
    }

    ranks
}

/// Computes the Spearman rank correlation and its significance.
///
/// # Errors
/// `InsufficientSample` below three pairs, `DegenerateSample` when either
/// series is constant.
pub fn calculate_ic(sample: &FlowSample) -> FlowResult<ICAnalysis> {
    let n = sample.len();
    if n < MIN_CORRELATION_SAMPLES {
        return Err(FlowError::InsufficientSample {
            test: "spearman",
            required: MIN_CORRELATION_SAMPLES,
            actual: n,
        });
    }

    let ranks_x = calculate_ranks(&sample.exposure[..n]);
    let ranks_y = calculate_ranks(&sample.returns[..n]);

    let ic = pearson_correlation(&ranks_x, &ranks_y).ok_or_else(|| FlowError::DegenerateSample {
        test: "spearman",
        reason: "exposure or return series has a single distinct value".to_string(),
    })?;

    let ic_t_stat = correlation_t_stat(ic, n);
    let ic_p_value = t_two_sided_p_value(ic_t_stat, n as f64 - 2.0);

    Ok(ICAnalysis {
        ic,
        ic_t_stat,
        ic_p_value,
        sample_size: n,
    })
}
