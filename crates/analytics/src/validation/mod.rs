//! Statistical test suite for exposure-change versus forward-return pairs.
//!
//! Four independent, pure tests: linear correlation, rank correlation,
//! simple linear regression, and a directional hit-rate test. Each returns
//! an explicit "not computable" outcome on undersized or degenerate input.

mod correlation;
mod hypothesis;
mod ic;
mod regression;
mod report;
mod types;

pub use correlation::{analyze_correlation, CorrelationAnalysis, MIN_CORRELATION_SAMPLES};
pub use hypothesis::{test_directional_accuracy, DirectionalAnalysis};
pub use ic::{calculate_ic, calculate_ranks, ICAnalysis};
pub use regression::{fit_regression, RegressionAnalysis};
pub use report::{determine_recommendation, statistics_by_security, ReportScope, StatisticsReport};
pub use types::{FlowSample, Recommendation, StatisticalTest, TestOutcome};
