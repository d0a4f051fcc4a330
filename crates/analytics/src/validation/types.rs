//! Core types for the flow/return statistical test suite.

use inst_flow_core::{FlowError, FlowResult};
use inst_flow_data::ExposureReturnPair;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of a single statistical test.
///
/// Tests never fabricate a number for an undersized or degenerate sample;
/// they report why the statistic could not be computed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome<T> {
    Computed(T),
    NotComputable { reason: String },
}

impl<T> TestOutcome<T> {
    /// Returns the computed result, if any.
    #[must_use]
    pub const fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::NotComputable { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

impl<T> From<FlowResult<T>> for TestOutcome<T> {
    fn from(result: FlowResult<T>) -> Self {
        match result {
            Ok(value) => Self::Computed(value),
            Err(err) => {
                if !err.is_sample_error() {
                    tracing::warn!("Statistical test failed on input: {}", err);
                }
                Self::NotComputable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// The four independent tests of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticalTest {
    /// Linear correlation
    Pearson,
    /// Rank correlation
    Spearman,
    /// OLS of forward return on exposure change
    Regression,
    /// Exact binomial test of the sign hit rate against 0.5
    Directional,
}

impl StatisticalTest {
    pub const ALL: [Self; 4] = [
        Self::Pearson,
        Self::Spearman,
        Self::Regression,
        Self::Directional,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Regression => "regression",
            Self::Directional => "directional",
        }
    }
}

impl fmt::Display for StatisticalTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticalTest {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pearson" | "correlation" => Ok(Self::Pearson),
            "spearman" | "rank" | "ic" => Ok(Self::Spearman),
            "regression" | "ols" => Ok(Self::Regression),
            "directional" | "hit_rate" | "hit-rate" | "binomial" => Ok(Self::Directional),
            other => Err(FlowError::InvalidRecord {
                reason: format!("unknown statistical test '{other}'"),
            }),
        }
    }
}

/// Recommendation based on the test results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Flow predicts returns (p < 0.05)
    Approved,
    /// Weak evidence, keep watching (0.05 <= p < 0.10)
    ConditionalApproval,
    /// Too few aligned pairs for a reliable conclusion
    NeedsMoreData,
    /// No significant relationship detected
    Rejected,
}

impl Recommendation {
    /// Returns a human-readable description of the recommendation.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Approved => "Flow signal is significant (p < 0.05)",
            Self::ConditionalApproval => "Flow signal is marginal - monitor closely (p < 0.10)",
            Self::NeedsMoreData => "Insufficient data - collect more quarters",
            Self::Rejected => "Rejected - no significant flow/return relationship",
        }
    }

    /// Returns true if the flow signal can be used (Approved or ConditionalApproval).
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Approved | Self::ConditionalApproval)
    }
}

/// Paired exposure/return series in `f64`, ready for the tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSample {
    pub exposure: Vec<f64>,
    pub returns: Vec<f64>,
}

impl FlowSample {
    /// Builds a sample from aligned pairs, skipping any value `f64` cannot hold.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a ExposureReturnPair>) -> Self {
        let mut sample = Self::default();
        for pair in pairs {
            if let (Some(x), Some(y)) = (
                pair.net_exposure_change.to_f64(),
                pair.forward_return.to_f64(),
            ) {
                sample.exposure.push(x);
                sample.returns.push(y);
            }
        }
        sample
    }

    #[must_use]
    pub fn new(exposure: Vec<f64>, returns: Vec<f64>) -> Self {
        Self { exposure, returns }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exposure.len().min(self.returns.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inst_flow_data::SignalClass;
    use rust_decimal_macros::dec;

    #[test]
    fn recommendation_description_returns_text() {
        assert!(!Recommendation::Approved.description().is_empty());
        assert!(!Recommendation::ConditionalApproval.description().is_empty());
        assert!(!Recommendation::NeedsMoreData.description().is_empty());
        assert!(!Recommendation::Rejected.description().is_empty());
    }

    #[test]
    fn recommendation_is_usable_correct() {
        assert!(Recommendation::Approved.is_usable());
        assert!(Recommendation::ConditionalApproval.is_usable());
        assert!(!Recommendation::NeedsMoreData.is_usable());
        assert!(!Recommendation::Rejected.is_usable());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Stat {
            value: f64,
        }

        let computed: TestOutcome<Stat> = TestOutcome::Computed(Stat { value: 0.5 });
        let json = serde_json::to_string(&computed).unwrap();
        assert_eq!(json, r#"{"status":"computed","value":0.5}"#);

        let missing: TestOutcome<Stat> = Err(FlowError::InsufficientSample {
            test: "pearson",
            required: 3,
            actual: 2,
        })
        .into();
        let json = serde_json::to_string(&missing).unwrap();
        assert!(json.contains(r#""status":"not_computable""#));
        assert!(json.contains("at least 3"));
        assert!(missing.computed().is_none());
    }

    #[test]
    fn statistical_test_parses_aliases() {
        assert_eq!("pearson".parse::<StatisticalTest>().unwrap(), StatisticalTest::Pearson);
        assert_eq!("IC".parse::<StatisticalTest>().unwrap(), StatisticalTest::Spearman);
        assert_eq!("ols".parse::<StatisticalTest>().unwrap(), StatisticalTest::Regression);
        assert_eq!(
            "hit-rate".parse::<StatisticalTest>().unwrap(),
            StatisticalTest::Directional
        );
        assert!("anova".parse::<StatisticalTest>().is_err());
    }

    #[test]
    fn flow_sample_from_pairs_converts_decimals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let pair = ExposureReturnPair {
            security_id: "T".to_string(),
            period: date,
            next_period: next,
            net_exposure_change: dec!(500),
            start_price: dec!(10),
            end_price: dec!(11),
            forward_return: dec!(0.1),
            signal: SignalClass::Match,
        };

        let sample = FlowSample::from_pairs([&pair]);

        assert_eq!(sample.len(), 1);
        assert!((sample.exposure[0] - 500.0).abs() < 1e-12);
        assert!((sample.returns[0] - 0.1).abs() < 1e-12);
    }
}
