//! Pearson correlation between net exposure change and forward return.

use super::FlowSample;
use inst_flow_core::validation::{
    correlation_t_stat, pearson_correlation, t_two_sided_p_value, unbounded,
};
use inst_flow_core::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// Smallest sample for which correlation and regression are defined.
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// Result of correlation analysis between exposure change and forward returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    /// Pearson correlation coefficient [-1, 1]
    pub correlation: f64,
    /// t = r * sqrt(n-2) / sqrt(1 - r^2), infinite when |r| = 1
    #[serde(with = "unbounded")]
    pub t_stat: f64,
    /// P-value for the correlation (two-tailed, Student t with n-2 df)
    pub p_value: f64,
    /// Number of samples used
    pub sample_size: usize,
}

impl CorrelationAnalysis {
    /// Returns true if the correlation is statistically significant at alpha = 0.05.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < 0.05
    }

    /// Returns true if the correlation is marginally significant at alpha = 0.10.
    #[must_use]
    pub fn is_marginally_significant(&self) -> bool {
        self.p_value < 0.10
    }
}

/// Analyzes the linear correlation between exposure change and forward return.
///
/// # Errors
/// `InsufficientSample` below three pairs, `DegenerateSample` when either
/// series is constant.
pub fn analyze_correlation(sample: &FlowSample) -> FlowResult<CorrelationAnalysis> {
    let n = sample.len();
    if n < MIN_CORRELATION_SAMPLES {
        return Err(FlowError::InsufficientSample {
            test: "pearson",
            required: MIN_CORRELATION_SAMPLES,
            actual: n,
        });
    }

    let correlation = pearson_correlation(&sample.exposure[..n], &sample.returns[..n]).ok_or_else(|| {
        FlowError::DegenerateSample {
            test: "pearson",
            reason: "exposure or return series has zero variance".to_string(),
        }
    })?;

    let t_stat = correlation_t_stat(correlation, n);
    let p_value = t_two_sided_p_value(t_stat, n as f64 - 2.0);

    Ok(CorrelationAnalysis {
        correlation,
        t_stat,
        p_value,
        sample_size: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_positive_correlation() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.01 * v - 0.02).collect();

        let result = analyze_correlation(&FlowSample::new(x, y)).unwrap();

        assert!((result.correlation - 1.0).abs() < 1e-9, "r was {}", result.correlation);
        assert!(result.p_value < 1e-6, "p was {}", result.p_value);
        assert!(result.is_significant());
    }

    #[test]
    fn perfect_negative_correlation() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| -2.0 * v).collect();

        let result = analyze_correlation(&FlowSample::new(x, y)).unwrap();

        assert!((result.correlation + 1.0).abs() < 1e-9);
        assert!(result.t_stat < 0.0);
    }

    #[test]
    fn known_value_small_sample() {
        // r = 0.8 at n = 5: t = 0.8*sqrt(3)/0.6 = 2.3094, p ~= 0.104
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 1.0, 4.0, 3.0, 5.0];

        let result = analyze_correlation(&FlowSample::new(x, y)).unwrap();

        assert!((result.correlation - 0.8).abs() < 1e-9);
        assert!((result.t_stat - 2.309_401).abs() < 1e-5);
        assert!((result.p_value - 0.1041).abs() < 1e-3, "p was {}", result.p_value);
        assert!(!result.is_significant());
    }

    #[test]
    fn insufficient_sample_is_not_a_number() {
        let err = analyze_correlation(&FlowSample::new(vec![1.0, 2.0], vec![0.1, 0.2])).unwrap_err();
        assert!(matches!(
            err,
            FlowError::InsufficientSample {
                required: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn zero_variance_is_degenerate() {
        let err = analyze_correlation(&FlowSample::new(vec![5.0, 5.0, 5.0, 5.0], vec![0.1, 0.2, -0.1, 0.0]))
            .unwrap_err();
        assert!(matches!(err, FlowError::DegenerateSample { test: "pearson", .. }));
    }
}
