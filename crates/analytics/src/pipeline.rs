//! End-to-end batch run: selection, inference, aggregation, alignment, tests.
//!
//! Pure computation over in-memory inputs. The same observations, prices and
//! configuration always produce the same output.

use crate::alignment::{align_returns, AlignmentStats};
use crate::exposure::aggregate_exposure;
use crate::inference::{infer_trades, FlaggedGroup};
use crate::validation::{statistics_by_security, StatisticalTest, StatisticsReport};
use chrono::{Duration, NaiveDate};
use inst_flow_core::{AnalysisConfig, AppConfig, UniverseConfig};
use inst_flow_data::{
    DisclosureObservation, ExposureChange, ExposureReturnPair, InferredTrade, PriceLookup,
};
use serde::{Deserialize, Serialize};

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Ordered by (security_id, manager_id, period)
    pub trades: Vec<InferredTrade>,
    /// Manager/security groups rejected during inference
    pub flagged_groups: Vec<FlaggedGroup>,
    /// Ordered by (security_id, period)
    pub exposures: Vec<ExposureChange>,
    /// Ordered by (security_id, period)
    pub pairs: Vec<ExposureReturnPair>,
    /// Pooled first, then one per security
    pub statistics: Vec<StatisticsReport>,
    pub alignment: AlignmentStats,
}

/// Restricts observations to the ticker universe and the lookback window.
///
/// The window ends at `as_of`, or at the latest period in the universe when
/// unset, so the selection never depends on the wall clock.
pub fn select_observations(
    observations: &[DisclosureObservation],
    universe: &UniverseConfig,
    analysis: &AnalysisConfig,
) -> Vec<DisclosureObservation> {
    let in_universe: Vec<&DisclosureObservation> = observations
        .iter()
        .filter(|o| universe.contains(&o.security_id))
        .collect();

    let Some(as_of) = analysis
        .as_of
        .or_else(|| in_universe.iter().map(|o| o.period).max())
    else {
        return Vec::new();
    };

    // A window reaching past the calendar's range is unbounded.
    let cutoff: Option<NaiveDate> = analysis
        .lookback_days
        .and_then(Duration::try_days)
        .and_then(|window| as_of.checked_sub_signed(window));

    let selected: Vec<DisclosureObservation> = in_universe
        .into_iter()
        .filter(|o| o.period <= as_of && cutoff.map_or(true, |c| o.period >= c))
        .cloned()
        .collect();

    tracing::info!(
        "Selected {} of {} observations (as of {}, lookback {})",
        selected.len(),
        observations.len(),
        as_of,
        analysis
            .lookback_days
            .map_or_else(|| "unbounded".to_string(), |d| format!("{d} days"))
    );

    selected
}

/// Runs the full pipeline with every statistical test.
pub fn run_pipeline<P>(
    observations: &[DisclosureObservation],
    prices: &P,
    config: &AppConfig,
) -> AnalysisOutput
where
    P: PriceLookup + ?Sized,
{
    run_pipeline_with_tests(observations, prices, config, &StatisticalTest::ALL)
}

/// Runs the full pipeline with a subset of the statistical tests.
pub fn run_pipeline_with_tests<P>(
    observations: &[DisclosureObservation],
    prices: &P,
    config: &AppConfig,
    tests: &[StatisticalTest],
) -> AnalysisOutput
where
    P: PriceLookup + ?Sized,
{
    let selected = select_observations(observations, &config.universe, &config.analysis);

    let inference = infer_trades(&selected);
    let exposures = aggregate_exposure(&inference.trades);
    let alignment = align_returns(&exposures, prices, config.analysis.gap_policy);

    for err in &alignment.unresolved {
        tracing::warn!("{}", err);
    }

    let statistics = statistics_by_security(&alignment.pairs, tests, config.analysis.min_samples);
    if let Some(pooled) = statistics.first() {
        tracing::info!(
            "Pooled statistics over {} pairs: {:?}",
            pooled.n_pairs,
            pooled.recommendation
        );
    }

    AnalysisOutput {
        trades: inference.trades,
        flagged_groups: inference.flagged,
        exposures,
        pairs: alignment.pairs,
        statistics,
        alignment: alignment.stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn q(year: i32, quarter: u32) -> NaiveDate {
        inst_flow_core::quarter::last_day_of_month(year, quarter * 3).unwrap()
    }

    fn obs(manager: &str, ticker: &str, period: NaiveDate) -> DisclosureObservation {
        DisclosureObservation::new(
            format!("{manager}-{period}"),
            manager,
            ticker,
            period,
            None,
            dec!(100),
        )
    }

    fn sample() -> Vec<DisclosureObservation> {
        vec![
            obs("M1", "ORCL", q(2022, 4)),
            obs("M1", "ORCL", q(2023, 4)),
            obs("M1", "ORCL", q(2024, 2)),
            obs("M1", "UNH", q(2024, 1)),
            obs("M1", "UNH", q(2024, 2)),
        ]
    }

    #[test]
    fn selection_filters_universe() {
        let universe = UniverseConfig {
            tickers: vec!["orcl".to_string()],
        };

        let selected = select_observations(&sample(), &universe, &AnalysisConfig::default());

        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|o| o.security_id == "ORCL"));
    }

    #[test]
    fn lookback_anchors_on_latest_period() {
        let analysis = AnalysisConfig {
            lookback_days: Some(365),
            ..AnalysisConfig::default()
        };

        let selected = select_observations(&sample(), &UniverseConfig::default(), &analysis);

        // latest is 2024-06-30; 2022-12-31 falls outside a year
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(|o| o.period >= q(2023, 3)));
    }

    #[test]
    fn lookback_beyond_calendar_range_keeps_everything() {
        for days in [i64::MAX, i64::MAX / 86_400, 400_000_000] {
            let analysis = AnalysisConfig {
                lookback_days: Some(days),
                ..AnalysisConfig::default()
            };

            let selected = select_observations(&sample(), &UniverseConfig::default(), &analysis);

            assert_eq!(selected.len(), 5, "lookback of {days} days");
        }
    }

    #[test]
    fn explicit_as_of_excludes_later_periods() {
        let analysis = AnalysisConfig {
            as_of: Some(q(2024, 1)),
            ..AnalysisConfig::default()
        };

        let selected = select_observations(&sample(), &UniverseConfig::default(), &analysis);

        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|o| o.period <= q(2024, 1)));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        struct NoPrices;
        impl PriceLookup for NoPrices {
            fn price_on_or_before(&self, _: &str, _: NaiveDate) -> Option<rust_decimal::Decimal> {
                None
            }
        }

        let output = run_pipeline(&[], &NoPrices, &AppConfig::default());

        assert!(output.trades.is_empty());
        assert!(output.pairs.is_empty());
        assert_eq!(output.statistics.len(), 1);
        assert_eq!(output.statistics[0].n_pairs, 0);
    }
}
