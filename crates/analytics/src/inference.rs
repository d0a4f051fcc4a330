//! Trade inference from successive disclosures.
//!
//! Observations are partitioned by (manager, security), each partition is
//! sorted by period, and every observation after the first yields one
//! inferred trade against its predecessor. The first observation of a
//! partition has no reference and yields nothing.

use crate::proxy::ProxiedObservation;
use inst_flow_core::{FlowError, FlowResult};
use inst_flow_data::{DisclosureObservation, InferredTrade, PairKey, TradeAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A manager/security partition that was rejected instead of inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedGroup {
    pub manager_id: String,
    pub security_id: String,
    pub reason: String,
}

/// Result of inferring trades across all partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeInference {
    /// Ordered by (security_id, manager_id, period)
    pub trades: Vec<InferredTrade>,
    pub flagged: Vec<FlaggedGroup>,
}

/// Infers trades for every manager/security pair.
///
/// A partition containing two observations for the same period is rejected
/// as a whole and reported in `flagged`; other partitions are unaffected.
pub fn infer_trades(observations: &[DisclosureObservation]) -> TradeInference {
    let mut partitions: BTreeMap<PairKey, Vec<&DisclosureObservation>> = BTreeMap::new();
    for observation in observations {
        partitions
            .entry(observation.pair_key())
            .or_default()
            .push(observation);
    }

    let mut inference = TradeInference::default();

    for (key, group) in partitions {
        match infer_pair_trades(group) {
            Ok(trades) => inference.trades.extend(trades),
            Err(err) => {
                tracing::warn!("Rejecting {}: {}", key, err);
                inference.flagged.push(FlaggedGroup {
                    manager_id: key.manager_id,
                    security_id: key.security_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    inference.trades.sort_by(|a, b| {
        (&a.security_id, &a.manager_id, a.period).cmp(&(&b.security_id, &b.manager_id, b.period))
    });

    tracing::info!(
        "Inferred {} trades from {} observations ({} groups flagged)",
        inference.trades.len(),
        observations.len(),
        inference.flagged.len()
    );

    inference
}

/// Infers trades for the observations of a single manager/security pair.
///
/// # Errors
/// Returns `DuplicateObservation` if two observations share a period.
pub fn infer_pair_trades(
    mut group: Vec<&DisclosureObservation>,
) -> FlowResult<Vec<InferredTrade>> {
    group.sort_by_key(|o| (o.period, o.filed_date));

    if let Some(pair) = group.windows(2).find(|w| w[0].period == w[1].period) {
        return Err(FlowError::DuplicateObservation {
            manager_id: pair[1].manager_id.clone(),
            security_id: pair[1].security_id.clone(),
            period: pair[1].period,
        });
    }

    let proxied: Vec<ProxiedObservation<'_>> =
        group.into_iter().map(ProxiedObservation::from).collect();

    let trades = proxied
        .windows(2)
        .map(|w| {
            let (previous, current) = (&w[0], &w[1]);
            if previous.proxy.source() != current.proxy.source() {
                tracing::debug!(
                    "{}/{} switches proxy source from {} to {} in {}",
                    current.observation.manager_id,
                    current.observation.security_id,
                    previous.proxy.source(),
                    current.proxy.source(),
                    current.observation.period
                );
            }

            let previous_proxy_quantity = previous.proxy.quantity();
            let proxy_quantity = current.proxy.quantity();
            let delta = proxy_quantity - previous_proxy_quantity;

            InferredTrade {
                manager_id: current.observation.manager_id.clone(),
                security_id: current.observation.security_id.clone(),
                period: current.observation.period,
                filed_date: current.observation.filed_date,
                previous_proxy_quantity,
                proxy_quantity,
                delta,
                action: TradeAction::from_delta(delta),
                proxy_source: current.proxy.source(),
            }
        })
        .collect();

    Ok(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inst_flow_data::ProxySource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn q(year: i32, quarter: u32) -> NaiveDate {
        inst_flow_core::quarter::last_day_of_month(year, quarter * 3).unwrap()
    }

    fn obs(
        filing: &str,
        manager: &str,
        ticker: &str,
        period: NaiveDate,
        shares: Option<u64>,
        value: Decimal,
    ) -> DisclosureObservation {
        DisclosureObservation::new(filing, manager, ticker, period, shares, value)
    }

    // ============================================
    // Single partition
    // ============================================

    #[test]
    fn value_only_scenario_buy_then_hold() {
        let observations = vec![
            obs("F1", "M", "T", q(2024, 1), None, dec!(100)),
            obs("F2", "M", "T", q(2024, 2), None, dec!(150)),
            obs("F3", "M", "T", q(2024, 3), None, dec!(150)),
        ];

        let inference = infer_trades(&observations);
        let trades = inference.trades;

        assert_eq!(trades.len(), 2);

        assert_eq!(trades[0].period, q(2024, 2));
        assert_eq!(trades[0].previous_proxy_quantity, dec!(100));
        assert_eq!(trades[0].proxy_quantity, dec!(150));
        assert_eq!(trades[0].delta, dec!(50));
        assert_eq!(trades[0].action, TradeAction::Buy);
        assert_eq!(trades[0].proxy_source, ProxySource::Value);

        assert_eq!(trades[1].period, q(2024, 3));
        assert_eq!(trades[1].previous_proxy_quantity, dec!(150));
        assert_eq!(trades[1].delta, dec!(0));
        assert_eq!(trades[1].action, TradeAction::Hold);

        assert!(trades.iter().all(|t| t.period != q(2024, 1)));
    }

    #[test]
    fn previous_follows_period_not_filing_date() {
        // Q1 filed late, after the Q2 filing
        let observations = vec![
            obs("F2", "M", "T", q(2024, 2), Some(900), dec!(1))
                .with_filed_date(NaiveDate::from_ymd_opt(2024, 8, 14).unwrap()),
            obs("F1", "M", "T", q(2024, 1), Some(1_000), dec!(1))
                .with_filed_date(NaiveDate::from_ymd_opt(2024, 9, 20).unwrap()),
        ];

        let trades = infer_trades(&observations).trades;

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].period, q(2024, 2));
        assert_eq!(trades[0].previous_proxy_quantity, dec!(1000));
        assert_eq!(trades[0].delta, dec!(-100));
        assert_eq!(trades[0].action, TradeAction::Sell);
        assert_eq!(trades[0].proxy_source, ProxySource::Shares);
    }

    #[test]
    fn single_observation_yields_no_trade() {
        let observations = vec![obs("F1", "M", "T", q(2024, 1), None, dec!(100))];
        let inference = infer_trades(&observations);
        assert!(inference.trades.is_empty());
        assert!(inference.flagged.is_empty());
    }

    #[test]
    fn first_observation_is_not_a_buy_from_zero() {
        let observations = vec![
            obs("F1", "M", "T", q(2024, 1), Some(500), dec!(10)),
            obs("F2", "M", "T", q(2024, 2), Some(500), dec!(12)),
        ];
        let trades = infer_trades(&observations).trades;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].action, TradeAction::Hold);
    }

    // ============================================
    // Partitioning and rejection
    // ============================================

    #[test]
    fn duplicate_period_flags_only_its_group() {
        let observations = vec![
            obs("F1", "M1", "T", q(2024, 1), None, dec!(100)),
            obs("F2", "M1", "T", q(2024, 1), None, dec!(120)),
            obs("F3", "M1", "T", q(2024, 2), None, dec!(130)),
            obs("F4", "M2", "T", q(2024, 1), None, dec!(10)),
            obs("F5", "M2", "T", q(2024, 2), None, dec!(5)),
        ];

        let inference = infer_trades(&observations);

        assert_eq!(inference.flagged.len(), 1);
        assert_eq!(inference.flagged[0].manager_id, "M1");
        assert!(inference.flagged[0].reason.contains("duplicate"));
        assert_eq!(inference.trades.len(), 1);
        assert_eq!(inference.trades[0].manager_id, "M2");
        assert_eq!(inference.trades[0].delta, dec!(-5));
    }

    #[test]
    fn infer_pair_trades_reports_duplicate_error() {
        let a = obs("F1", "M", "T", q(2024, 1), None, dec!(1));
        let b = obs("F2", "M", "T", q(2024, 1), None, dec!(2));
        let err = infer_pair_trades(vec![&a, &b]).unwrap_err();
        assert!(matches!(err, FlowError::DuplicateObservation { .. }));
    }

    #[test]
    fn trade_count_is_observations_minus_one_per_pair() {
        let mut observations = Vec::new();
        for (manager, n) in [("M1", 4), ("M2", 1), ("M3", 3)] {
            for i in 0..n {
                observations.push(obs(
                    &format!("{manager}-{i}"),
                    manager,
                    "T",
                    q(2022 + (i / 4) as i32, (i % 4) as u32 + 1),
                    None,
                    Decimal::from(10 * (i + 1)),
                ));
            }
        }

        let trades = infer_trades(&observations).trades;
        let count = |m: &str| trades.iter().filter(|t| t.manager_id == m).count();

        assert_eq!(count("M1"), 3);
        assert_eq!(count("M2"), 0);
        assert_eq!(count("M3"), 2);
    }

    #[test]
    fn output_is_ordered_by_security_manager_period() {
        let observations = vec![
            obs("F1", "M2", "UNH", q(2024, 2), None, dec!(2)),
            obs("F2", "M1", "ORCL", q(2024, 3), None, dec!(3)),
            obs("F3", "M2", "UNH", q(2024, 1), None, dec!(1)),
            obs("F4", "M1", "ORCL", q(2024, 1), None, dec!(1)),
            obs("F5", "M1", "ORCL", q(2024, 2), None, dec!(2)),
            obs("F6", "M0", "UNH", q(2024, 1), None, dec!(1)),
            obs("F7", "M0", "UNH", q(2024, 2), None, dec!(4)),
        ];

        let keys: Vec<_> = infer_trades(&observations)
            .trades
            .into_iter()
            .map(|t| (t.security_id, t.manager_id, t.period))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("ORCL".to_string(), "M1".to_string(), q(2024, 2)),
                ("ORCL".to_string(), "M1".to_string(), q(2024, 3)),
                ("UNH".to_string(), "M0".to_string(), q(2024, 2)),
                ("UNH".to_string(), "M2".to_string(), q(2024, 2)),
            ]
        );
    }
}
