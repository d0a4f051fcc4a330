//! Statistical primitives for flow-versus-return validation.
//!
//! Provides exact hypothesis tests, confidence intervals, and the
//! distribution functions the analytics crate builds its test suite on.

use serde::{Deserialize, Serialize};

/// Hit-rate summary for a directional prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRateValidation {
    /// Proportion of correct directional calls
    pub hit_rate: f64,
    /// Wilson score confidence interval (lower bound)
    pub wilson_ci_lower: f64,
    /// Wilson score confidence interval (upper bound)
    pub wilson_ci_upper: f64,
    /// Exact two-sided binomial p-value (H0: p = 0.5)
    pub p_value: f64,
    /// Number of directional calls
    pub sample_size: usize,
    /// Whether the result is statistically significant at alpha = 0.05
    pub is_significant: bool,
}

impl HitRateValidation {
    /// Builds the summary from hit/total counts.
    ///
    /// Returns `None` when `total` is zero: a hit rate over no calls is undefined.
    #[must_use]
    pub fn from_counts(hits: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }

        let hit_rate = hits as f64 / total as f64;
        let (wilson_ci_lower, wilson_ci_upper) = wilson_ci(hits, total, 1.96);
        let p_value = binomial_test(hits, total, 0.5);

        Some(Self {
            hit_rate,
            wilson_ci_lower,
            wilson_ci_upper,
            p_value,
            sample_size: total,
            is_significant: p_value < 0.05,
        })
    }
}

/// Calculates the Wilson score confidence interval for a proportion.
///
/// The Wilson score interval is preferred over the normal approximation
/// because it has better coverage properties, especially for proportions
/// near 0 or 1, and for small sample sizes.
///
/// # Formula
/// ```text
/// CI = (p + z^2/(2n) +/- z * sqrt(p(1-p)/n + z^2/(4n^2))) / (1 + z^2/n)
/// ```
///
/// # Examples
/// ```
/// use inst_flow_core::validation::wilson_ci;
///
/// let (lower, upper) = wilson_ci(50, 100, 1.96);
/// assert!(lower > 0.39 && lower < 0.41);
/// assert!(upper > 0.59 && upper < 0.61);
/// ```
#[must_use]
pub fn wilson_ci(wins: usize, n: usize, z: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }

    let n_f = n as f64;
    let p = wins as f64 / n_f;
    let z_sq = z * z;

    let denominator = 1.0 + z_sq / n_f;
    let center = p + z_sq / (2.0 * n_f);

    let variance_term = p * (1.0 - p) / n_f;
    let correction_term = z_sq / (4.0 * n_f * n_f);
    let spread = z * (variance_term + correction_term).sqrt();

    let lower = (center - spread) / denominator;
    let upper = (center + spread) / denominator;

    (lower.max(0.0), upper.min(1.0))
}

/// Exact two-sided binomial test of H0: P(success) = `p0`.
///
/// The p-value is the total probability of every outcome that is no more
/// likely than the observed one under H0.
///
/// # Examples
/// ```
/// use inst_flow_core::validation::binomial_test;
///
/// // 55 out of 100 is not significantly different from 50%
/// assert!(binomial_test(55, 100, 0.5) > 0.05);
///
/// // 10 out of 10 is: p = 2 / 1024
/// assert!((binomial_test(10, 10, 0.5) - 2.0 / 1024.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn binomial_test(successes: usize, n: usize, p0: f64) -> f64 {
    if n == 0 || successes > n {
        return 1.0;
    }
    if p0 <= 0.0 {
        return if successes == 0 { 1.0 } else { 0.0 };
    }
    if p0 >= 1.0 {
        return if successes == n { 1.0 } else { 0.0 };
    }

    // Relative tolerance so that mathematically equal tail masses compare equal.
    let threshold = binomial_pmf(successes, n, p0) * (1.0 + 1e-7);

    let p_value: f64 = (0..=n)
        .map(|k| binomial_pmf(k, n, p0))
        .filter(|&pk| pk <= threshold)
        .sum();

    p_value.min(1.0)
}

/// Probability of exactly `k` successes in `n` Bernoulli(`p`) trials.
#[must_use]
pub fn binomial_pmf(k: usize, n: usize, p: f64) -> f64 {
    if k > n {
        return 0.0;
    }
    let (k_f, n_f) = (k as f64, n as f64);
    let ln_choose = ln_gamma(n_f + 1.0) - ln_gamma(k_f + 1.0) - ln_gamma(n_f - k_f + 1.0);
    let ln_success = if k == 0 { 0.0 } else { k_f * p.ln() };
    let ln_failure = if k == n { 0.0 } else { (n_f - k_f) * (1.0 - p).ln() };
    (ln_choose + ln_success + ln_failure).exp()
}

/// Pearson correlation of two equally long series.
///
/// Returns `None` for mismatched lengths, fewer than two points, or a
/// series with zero variance.
#[must_use]
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some((covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// t-statistic of a correlation coefficient with `n - 2` degrees of freedom.
///
/// A perfect correlation yields an infinite statistic of the same sign.
#[must_use]
pub fn correlation_t_stat(r: f64, n: usize) -> f64 {
    let df = n as f64 - 2.0;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return if r >= 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    r * (df / denom).sqrt()
}

/// Serde adapter for statistics that can be non-finite, such as the
/// t-statistic of a perfect fit.
///
/// JSON has no infinities, so they are written as the strings `"inf"` and
/// `"-inf"` (and NaN as `"nan"`). Finite values stay plain numbers.
///
/// # Examples
/// ```
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Fit {
///     #[serde(with = "inst_flow_core::validation::unbounded")]
///     t_stat: f64,
/// }
///
/// let json = serde_json::to_string(&Fit { t_stat: f64::INFINITY }).unwrap();
/// assert_eq!(json, r#"{"t_stat":"inf"}"#);
/// let back: Fit = serde_json::from_str(&json).unwrap();
/// assert_eq!(back.t_stat, f64::INFINITY);
/// ```
pub mod unbounded {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("invalid statistic: {other}"))),
            },
        }
    }
}

/// Two-sided p-value of a t-statistic under Student's t with `df` degrees of freedom.
///
/// # Examples
/// ```
/// use inst_flow_core::validation::t_two_sided_p_value;
///
/// // t = 2.228 is the 97.5% quantile at 10 df
/// let p = t_two_sided_p_value(2.228, 10.0);
/// assert!((p - 0.05).abs() < 1e-3);
/// ```
#[must_use]
pub fn t_two_sided_p_value(t: f64, df: f64) -> f64 {
    if t.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    (2.0 * (1.0 - t_cdf(t.abs(), df))).clamp(0.0, 1.0)
}

/// Student's t-distribution CDF: P(T <= t) for `df` degrees of freedom.
#[must_use]
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    if t == 0.0 {
        return 0.5;
    }

    let x = df / (df + t * t);
    let ib = regularized_incomplete_beta(df / 2.0, 0.5, x);

    if t > 0.0 {
        1.0 - 0.5 * ib
    } else {
        0.5 * ib
    }
}

/// Lanczos approximation for ln(Gamma(x)), g=7, n=9.
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Gamma(x) * Gamma(1-x) = pi / sin(pi*x)
        let sin_val = (std::f64::consts::PI * x).sin();
        if sin_val.abs() < 1e-300 {
            return f64::INFINITY;
        }
        return std::f64::consts::PI.ln() - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }

    let t = x + G + 0.5;
    let log_sqrt_2pi = (2.0 * std::f64::consts::PI).sqrt().ln();

    log_sqrt_2pi + (t.ln() * (x + 0.5)) - t + sum.ln()
}

/// Regularized incomplete beta function I_x(a, b), modified Lentz continued fraction.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    if x == 1.0 {
        return 1.0;
    }

    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let ln_prefix =
        a * x.ln() + b * (1.0 - x).ln() - ln_gamma(a) - ln_gamma(b) + ln_gamma(a + b) - a.ln();
    let prefix = ln_prefix.exp();

    const MAX_ITER: usize = 300;
    const EPSILON: f64 = 1e-14;
    const TINY: f64 = 1e-30;

    let mut c = 1.0_f64;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut f = d;

    for m in 1..=MAX_ITER {
        let m_f64 = m as f64;

        let numerator_even =
            m_f64 * (b - m_f64) * x / ((a + 2.0 * m_f64 - 1.0) * (a + 2.0 * m_f64));
        d = 1.0 + numerator_even * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator_even / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        f *= c * d;

        let numerator_odd = -((a + m_f64) * (a + b + m_f64) * x)
            / ((a + 2.0 * m_f64) * (a + 2.0 * m_f64 + 1.0));
        d = 1.0 + numerator_odd * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + numerator_odd / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    prefix * f
}
