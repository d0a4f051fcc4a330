//! Statistics report generation.
//!
//! Runs the selected tests over one scope (all pairs pooled, or a single
//! security) and combines them into a report with a recommendation.

use super::{
    analyze_correlation, calculate_ic, fit_regression, test_directional_accuracy,
    CorrelationAnalysis, DirectionalAnalysis, FlowSample, ICAnalysis, Recommendation,
    RegressionAnalysis, StatisticalTest, TestOutcome,
};
use anyhow::Result;
use inst_flow_data::ExposureReturnPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

/// Which pairs a report covers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportScope {
    Pooled,
    Security(String),
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pooled => f.write_str("POOLED"),
            Self::Security(ticker) => f.write_str(ticker),
        }
    }
}

/// Test results for one scope. Tests that were not selected are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub scope: ReportScope,
    /// Aligned exposure/return pairs in scope
    pub n_pairs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pearson: Option<TestOutcome<CorrelationAnalysis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spearman: Option<TestOutcome<ICAnalysis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression: Option<TestOutcome<RegressionAnalysis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directional: Option<TestOutcome<DirectionalAnalysis>>,
    pub recommendation: Recommendation,
}

impl StatisticsReport {
    /// Runs `tests` over `pairs`.
    ///
    /// # Arguments
    /// * `scope` - Label for the pairs
    /// * `pairs` - Aligned exposure/return pairs
    /// * `tests` - Subset of the suite to run
    /// * `min_samples` - Pairs required before a verdict other than "needs more data"
    pub fn generate<'a>(
        scope: ReportScope,
        pairs: impl IntoIterator<Item = &'a ExposureReturnPair>,
        tests: &[StatisticalTest],
        min_samples: usize,
    ) -> Self {
        let sample = FlowSample::from_pairs(pairs);
        let selected = |test: StatisticalTest| tests.contains(&test);

        let pearson: Option<TestOutcome<CorrelationAnalysis>> =
            selected(StatisticalTest::Pearson).then(|| analyze_correlation(&sample).into());
        let spearman: Option<TestOutcome<ICAnalysis>> =
            selected(StatisticalTest::Spearman).then(|| calculate_ic(&sample).into());
        let regression: Option<TestOutcome<RegressionAnalysis>> =
            selected(StatisticalTest::Regression).then(|| fit_regression(&sample).into());
        let directional: Option<TestOutcome<DirectionalAnalysis>> =
            selected(StatisticalTest::Directional).then(|| test_directional_accuracy(&sample).into());

        let recommendation = determine_recommendation(
            sample.len(),
            min_samples,
            regression
                .as_ref()
                .and_then(TestOutcome::computed)
                .map(|r| r.p_value),
            directional
                .as_ref()
                .and_then(TestOutcome::computed)
                .map(|d| d.p_value),
        );

        Self {
            scope,
            n_pairs: sample.len(),
            pearson,
            spearman,
            regression,
            directional,
            recommendation,
        }
    }

    /// Converts the report to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "=== Flow vs Next-Quarter Return: {} ===", self.scope);
        let _ = writeln!(output, "Pairs: {}\n", self.n_pairs);

        if let Some(outcome) = &self.pearson {
            output.push_str("--- Correlation (Pearson) ---\n");
            match outcome {
                TestOutcome::Computed(c) => {
                    let _ = writeln!(output, "r: {:.4}", c.correlation);
                    let _ = writeln!(output, "P-value: {:.4}", c.p_value);
                    let _ = writeln!(output, "Significant (p<0.05): {}", yes_no(c.is_significant()));
                    let _ = writeln!(
                        output,
                        "Marginal (p<0.10): {}",
                        yes_no(c.is_marginally_significant())
                    );
                }
                TestOutcome::NotComputable { reason } => {
                    let _ = writeln!(output, "Not computable: {reason}");
                }
            }
            output.push('\n');
        }

        if let Some(outcome) = &self.spearman {
            output.push_str("--- Rank Correlation (Spearman) ---\n");
            match outcome {
                TestOutcome::Computed(ic) => {
                    let _ = writeln!(output, "rho: {:.4}", ic.ic);
                    let _ = writeln!(output, "P-value: {:.4}", ic.ic_p_value);
                    let _ = writeln!(output, "Significant (p<0.05): {}", yes_no(ic.is_significant()));
                    let _ = writeln!(
                        output,
                        "Buying leads returns: {}",
                        yes_no(ic.has_predictive_power())
                    );
                }
                TestOutcome::NotComputable { reason } => {
                    let _ = writeln!(output, "Not computable: {reason}");
                }
            }
            output.push('\n');
        }

        if let Some(outcome) = &self.regression {
            output.push_str("--- OLS: return = alpha + beta * exposure ---\n");
            match outcome {
                TestOutcome::Computed(r) => {
                    let _ = writeln!(output, "alpha: {:.6}", r.alpha);
                    let _ = writeln!(output, "beta: {:.6e} (se {:.6e})", r.beta, r.beta_std_error);
                    let _ = writeln!(output, "t-stat: {:.4}", r.t_stat);
                    let _ = writeln!(output, "P-value: {:.4}", r.p_value);
                    let _ = writeln!(output, "R^2: {:.4}", r.r_squared);
                    let _ = writeln!(output, "N: {}", r.n_obs);
                }
                TestOutcome::NotComputable { reason } => {
                    let _ = writeln!(output, "Not computable: {reason}");
                }
            }
            output.push('\n');
        }

        if let Some(outcome) = &self.directional {
            output.push_str("--- Directional Hit Rate (Exact Binomial) ---\n");
            match outcome {
                TestOutcome::Computed(d) => {
                    let _ = writeln!(
                        output,
                        "Hits: {}/{} ({} pairs with a zero sign excluded)",
                        d.hits,
                        d.n_obs,
                        d.n_pairs - d.n_obs
                    );
                    let _ = writeln!(output, "Hit Rate: {:.1}%", d.hit_rate * 100.0);
                    let _ = writeln!(
                        output,
                        "95% CI: [{:.1}%, {:.1}%]",
                        d.wilson_ci_lower * 100.0,
                        d.wilson_ci_upper * 100.0
                    );
                    let _ = writeln!(output, "P-value: {:.4}", d.p_value);
                    let _ = writeln!(output, "Significant (p<0.05): {}", yes_no(d.is_significant_05));
                    let _ = writeln!(output, "Edge (CI above 50%): {}", yes_no(d.has_positive_edge()));
                }
                TestOutcome::NotComputable { reason } => {
                    let _ = writeln!(output, "Not computable: {reason}");
                }
            }
            output.push('\n');
        }

        output.push_str("=== RECOMMENDATION ===\n");
        let _ = writeln!(
            output,
            "{:?}: {}",
            self.recommendation,
            self.recommendation.description()
        );

        output
    }

    /// Converts the report to JSON format.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Builds the pooled report followed by one report per security, in ticker order.
pub fn statistics_by_security(
    pairs: &[ExposureReturnPair],
    tests: &[StatisticalTest],
    min_samples: usize,
) -> Vec<StatisticsReport> {
    let mut by_security: BTreeMap<&str, Vec<&ExposureReturnPair>> = BTreeMap::new();
    for pair in pairs {
        by_security.entry(pair.security_id.as_str()).or_default().push(pair);
    }

    let mut reports = Vec::with_capacity(by_security.len() + 1);
    reports.push(StatisticsReport::generate(
        ReportScope::Pooled,
        pairs,
        tests,
        min_samples,
    ));
    for (security_id, group) in by_security {
        reports.push(StatisticsReport::generate(
            ReportScope::Security(security_id.to_string()),
            group,
            tests,
            min_samples,
        ));
    }

    reports
}

/// Determines the recommendation from the regression and hit-rate p-values.
///
/// Tests that were skipped or not computable contribute nothing; with neither
/// available there is nothing to judge.
#[must_use]
pub fn determine_recommendation(
    sample_size: usize,
    min_samples: usize,
    regression_p_value: Option<f64>,
    directional_p_value: Option<f64>,
) -> Recommendation {
    if sample_size < min_samples {
        return Recommendation::NeedsMoreData;
    }

    let p_values: Vec<f64> = [regression_p_value, directional_p_value]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_nan())
        .collect();
    if p_values.is_empty() {
        return Recommendation::NeedsMoreData;
    }

    if p_values.iter().any(|p| *p < 0.05) {
        Recommendation::Approved
    } else if p_values.iter().any(|p| *p < 0.10) {
        Recommendation::ConditionalApproval
    } else {
        Recommendation::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inst_flow_data::SignalClass;
    use rust_decimal::Decimal;

    fn pair(ticker: &str, quarter: u32, exposure: i64, ret_bps: i64) -> ExposureReturnPair {
        let period = NaiveDate::from_ymd_opt(2020 + (quarter / 4) as i32, 3 * (quarter % 4) + 3, 1).unwrap();
        let net_exposure_change = Decimal::from(exposure);
        let forward_return = Decimal::new(ret_bps, 4);
        ExposureReturnPair {
            security_id: ticker.to_string(),
            period,
            next_period: period + chrono::Duration::days(91),
            net_exposure_change,
            start_price: Decimal::ONE_HUNDRED,
            end_price: Decimal::ONE_HUNDRED * (Decimal::ONE + forward_return),
            forward_return,
            signal: SignalClass::classify(net_exposure_change, forward_return),
        }
    }

    fn trending_pairs(ticker: &str, n: u32) -> Vec<ExposureReturnPair> {
        (0..n)
            .map(|q| {
                let x = i64::from(q) - i64::from(n) / 2;
                pair(ticker, q, x * 1000 + 7, x * 25 + 3)
            })
            .collect()
    }

    fn noisy_pairs(ticker: &str, n: u32) -> Vec<ExposureReturnPair> {
        (0..n)
            .map(|q| {
                let x = i64::from(q) - i64::from(n) / 2;
                let wobble = i64::from((q * 37) % 11) - 5;
                pair(ticker, q, x * 1000 + 7, x * 25 + wobble * 20)
            })
            .collect()
    }

    // ============================================
    // Recommendation
    // ============================================

    #[test]
    fn recommendation_needs_more_data_below_min_samples() {
        assert_eq!(
            determine_recommendation(5, 8, Some(0.001), Some(0.001)),
            Recommendation::NeedsMoreData
        );
    }

    #[test]
    fn recommendation_tiers() {
        assert_eq!(
            determine_recommendation(30, 8, Some(0.01), Some(0.5)),
            Recommendation::Approved
        );
        assert_eq!(
            determine_recommendation(30, 8, Some(0.5), Some(0.07)),
            Recommendation::ConditionalApproval
        );
        assert_eq!(
            determine_recommendation(30, 8, Some(0.5), Some(0.5)),
            Recommendation::Rejected
        );
    }

    #[test]
    fn recommendation_without_any_p_value() {
        assert_eq!(
            determine_recommendation(30, 8, None, None),
            Recommendation::NeedsMoreData
        );
        assert_eq!(
            determine_recommendation(30, 8, None, Some(0.02)),
            Recommendation::Approved
        );
    }

    // ============================================
    // Report generation
    // ============================================

    #[test]
    fn generate_runs_all_selected_tests() {
        let pairs = trending_pairs("ORCL", 12);

        let report = StatisticsReport::generate(
            ReportScope::Security("ORCL".to_string()),
            &pairs,
            &StatisticalTest::ALL,
            8,
        );

        assert_eq!(report.n_pairs, 12);
        assert!(report.pearson.as_ref().unwrap().is_computed());
        assert!(report.spearman.as_ref().unwrap().is_computed());
        assert!(report.regression.as_ref().unwrap().is_computed());
        assert!(report.directional.as_ref().unwrap().is_computed());
        assert_eq!(report.recommendation, Recommendation::Approved);
    }

    #[test]
    fn text_report_flags_strong_relationship() {
        let pairs = trending_pairs("ORCL", 12);

        let text = StatisticsReport::generate(
            ReportScope::Security("ORCL".to_string()),
            &pairs,
            &StatisticalTest::ALL,
            8,
        )
        .to_text();

        assert!(text.contains("=== Flow vs Next-Quarter Return: ORCL ==="));
        assert!(text.contains("Marginal (p<0.10): Yes"), "{text}");
        assert!(text.contains("Buying leads returns: Yes"), "{text}");
        assert!(text.contains("Hits: 12/12"), "{text}");
        assert!(text.contains("Edge (CI above 50%): Yes"), "{text}");
    }

    #[test]
    fn generate_skips_unselected_tests() {
        let pairs = trending_pairs("UNH", 6);

        let report = StatisticsReport::generate(
            ReportScope::Pooled,
            &pairs,
            &[StatisticalTest::Directional],
            1,
        );

        assert!(report.pearson.is_none());
        assert!(report.spearman.is_none());
        assert!(report.regression.is_none());
        assert!(report.directional.is_some());

        let json = report.to_json().unwrap();
        assert!(!json.contains("pearson"));
        assert!(json.contains("directional"));
    }

    #[test]
    fn small_sample_reports_not_computable() {
        let pairs = trending_pairs("FDS", 2);

        let report =
            StatisticsReport::generate(ReportScope::Pooled, &pairs, &StatisticalTest::ALL, 8);

        assert!(matches!(
            report.pearson,
            Some(TestOutcome::NotComputable { .. })
        ));
        assert!(matches!(
            report.regression,
            Some(TestOutcome::NotComputable { .. })
        ));
        assert!(report.directional.as_ref().unwrap().is_computed());
        assert_eq!(report.recommendation, Recommendation::NeedsMoreData);

        let text = report.to_text();
        assert!(text.contains("Not computable"));
        assert!(text.contains("RECOMMENDATION"));
    }

    #[test]
    fn statistics_by_security_pooled_first_then_sorted() {
        let mut pairs = trending_pairs("UNH", 5);
        pairs.extend(trending_pairs("FDS", 4));

        let reports = statistics_by_security(&pairs, &StatisticalTest::ALL, 8);

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].scope, ReportScope::Pooled);
        assert_eq!(reports[0].n_pairs, 9);
        assert_eq!(reports[1].scope, ReportScope::Security("FDS".to_string()));
        assert_eq!(reports[1].n_pairs, 4);
        assert_eq!(reports[2].scope, ReportScope::Security("UNH".to_string()));
    }

    #[test]
    fn report_json_round_trips() {
        let pairs = noisy_pairs("ORCL", 10);
        let report =
            StatisticsReport::generate(ReportScope::Pooled, &pairs, &StatisticalTest::ALL, 8);

        let json = report.to_json().unwrap();
        assert!(json.contains(r#""status": "computed""#));

        let parsed: StatisticsReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.scope, ReportScope::Pooled);
        assert_eq!(parsed.recommendation, report.recommendation);
    }
}
