//! Simple linear regression of forward return on net exposure change.
//!
//! forward_return = alpha + beta * net_exposure_change + e, fit by OLS.

use super::correlation::MIN_CORRELATION_SAMPLES;
use super::FlowSample;
use inst_flow_core::validation::{pearson_correlation, t_two_sided_p_value, unbounded};
use inst_flow_core::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionAnalysis {
    /// Intercept
    pub alpha: f64,
    /// Slope on net exposure change
    pub beta: f64,
    /// Standard error of beta
    pub beta_std_error: f64,
    /// beta / se(beta)
    #[serde(with = "unbounded")]
    pub t_stat: f64,
    /// Two-sided p-value for H0: beta = 0 (Student t, n-2 df)
    pub p_value: f64,
    pub r_squared: f64,
    pub n_obs: usize,
}

impl RegressionAnalysis {
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < 0.05
    }
}

/// Fits the regression.
///
/// # Errors
/// Fails exactly where Pearson correlation does: fewer than three pairs, or
/// a constant series.
pub fn fit_regression(sample: &FlowSample) -> FlowResult<RegressionAnalysis> {
    let n = sample.len();
    if n < MIN_CORRELATION_SAMPLES {
        return Err(FlowError::InsufficientSample {
            test: "regression",
            required: MIN_CORRELATION_SAMPLES,
            actual: n,
        });
    }

    let x = &sample.exposure[..n];
    let y = &sample.returns[..n];

    let r = pearson_correlation(x, y).ok_or_else(|| FlowError::DegenerateSample {
        test: "regression",
        reason: "exposure or return series has zero variance".to_string(),
    })?;

    let count = n as f64;
    let mean_x = x.iter().sum::<f64>() / count;
    let mean_y = y.iter().sum::<f64>() / count;

    let (sxx, sxy) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxx, sxy), (xi, yi)| {
            let dx = xi - mean_x;
            (sxx + dx * dx, sxy + dx * (yi - mean_y))
        });

    let beta = sxy / sxx;
    let alpha = mean_y - beta * mean_x;

    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - alpha - beta * xi).powi(2))
        .sum();

    let df = count - 2.0;
    let beta_std_error = (sse / df / sxx).sqrt();

    // A perfect fit leaves no residual variance; beta is then exact.
    let t_stat = if beta_std_error > 0.0 {
        beta / beta_std_error
    } else if beta >= 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    };
    let p_value = t_two_sided_p_value(t_stat, df);

    Ok(RegressionAnalysis {
        alpha,
        beta,
        beta_std_error,
        t_stat,
        p_value,
        r_squared: r * r,
        n_obs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let x: Vec<f64> = (0..20).map(|i| f64::from(i) * 100.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.02 + 0.0001 * v).collect();

        let result = fit_regression(&FlowSample::new(x, y)).unwrap();

        assert!((result.beta - 0.0001).abs() < 1e-12, "beta was {}", result.beta);
        assert!((result.alpha - 0.02).abs() < 1e-9, "alpha was {}", result.alpha);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
        assert!(result.p_value < 1e-6);
        assert_eq!(result.n_obs, 20);
    }

    #[test]
    fn known_small_regression() {
        // x = 1..5, y = [2,1,4,3,5]: beta = 0.8, alpha = 0.6, r^2 = 0.64
        // sse = 3.6, se = sqrt(3.6/3/10) = 0.34641, t = 2.3094
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 1.0, 4.0, 3.0, 5.0];

        let result = fit_regression(&FlowSample::new(x, y)).unwrap();

        assert!((result.beta - 0.8).abs() < 1e-12);
        assert!((result.alpha - 0.6).abs() < 1e-12);
        assert!((result.r_squared - 0.64).abs() < 1e-12);
        assert!((result.beta_std_error - 0.346_410_16).abs() < 1e-6);
        assert!((result.t_stat - 2.309_401).abs() < 1e-5);
        assert!(!result.is_significant());
    }

    #[test]
    fn regression_and_correlation_share_significance() {
        let x = vec![3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.0, -6.0];
        let y = vec![0.02, 0.01, -0.03, 0.05, -0.02, 0.04, 0.00, -0.01];
        let sample = FlowSample::new(x, y);

        let regression = fit_regression(&sample).unwrap();
        let correlation = super::super::analyze_correlation(&sample).unwrap();

        assert!((regression.t_stat - correlation.t_stat).abs() < 1e-9);
        assert!((regression.p_value - correlation.p_value).abs() < 1e-9);
    }

    #[test]
    fn degenerate_input_matches_pearson() {
        let err = fit_regression(&FlowSample::new(vec![1.0, 1.0, 1.0], vec![0.1, 0.2, 0.3])).unwrap_err();
        assert!(matches!(err, FlowError::DegenerateSample { test: "regression", .. }));

        let err = fit_regression(&FlowSample::new(vec![1.0, 2.0], vec![0.1, 0.2])).unwrap_err();
        assert!(matches!(err, FlowError::InsufficientSample { actual: 2, .. }));
    }
}
