//! Institutional flow analytics.
//!
//! Turns quarterly holdings disclosures into inferred manager trades,
//! aggregates them into per-security exposure changes, aligns those with
//! next-period price returns, and tests whether flow predicts returns.

pub mod alignment;
pub mod exposure;
pub mod inference;
pub mod pipeline;
pub mod proxy;
pub mod sink;
pub mod summary;
pub mod validation;

pub use alignment::{align_returns, reference_date, Alignment, AlignmentStats};
pub use exposure::aggregate_exposure;
pub use inference::{infer_pair_trades, infer_trades, FlaggedGroup, TradeInference};
pub use pipeline::{run_pipeline, run_pipeline_with_tests, select_observations, AnalysisOutput};
pub use proxy::{resolve_proxy, ProxiedObservation};
pub use sink::{FileSink, ResultSink};
pub use summary::{render_exposure_summary, render_statistics, render_trades_by_manager};

// Re-export the statistical test suite
pub use validation::{
    analyze_correlation, calculate_ic, calculate_ranks, determine_recommendation,
    fit_regression, statistics_by_security, test_directional_accuracy, CorrelationAnalysis,
    DirectionalAnalysis, FlowSample, ICAnalysis, Recommendation, RegressionAnalysis,
    ReportScope, StatisticalTest, StatisticsReport, TestOutcome,
};
