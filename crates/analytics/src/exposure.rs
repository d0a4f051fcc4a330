//! Aggregation of per-manager trades into per-security exposure changes.
//!
//! Deltas are summed as reported, without weighting by manager size, so a
//! single large filer can dominate a security's figure.

use chrono::NaiveDate;
use inst_flow_data::{ExposureChange, InferredTrade};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Sums trade deltas by (security, period), ordered by security then period.
pub fn aggregate_exposure(trades: &[InferredTrade]) -> Vec<ExposureChange> {
    let mut totals: BTreeMap<(&str, NaiveDate), (Decimal, usize)> = BTreeMap::new();

    for trade in trades {
        let entry = totals
            .entry((trade.security_id.as_str(), trade.period))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += trade.delta;
        entry.1 += 1;
    }

    let exposures: Vec<ExposureChange> = totals
        .into_iter()
        .map(
            |((security_id, period), (net_exposure_change, trade_count))| ExposureChange {
                security_id: security_id.to_string(),
                period,
                net_exposure_change,
                trade_count,
            },
        )
        .collect();

    tracing::debug!(
        "Aggregated {} trades into {} exposure changes",
        trades.len(),
        exposures.len()
    );

    exposures
}

#[cfg(test)]
mod tests {
    use super::*;
    use inst_flow_data::{ProxySource, TradeAction};
    use rust_decimal_macros::dec;

    fn trade(manager: &str, ticker: &str, period: NaiveDate, delta: Decimal) -> InferredTrade {
        InferredTrade {
            manager_id: manager.to_string(),
            security_id: ticker.to_string(),
            period,
            filed_date: None,
            previous_proxy_quantity: Decimal::ZERO,
            proxy_quantity: delta,
            delta,
            action: TradeAction::from_delta(delta),
            proxy_source: ProxySource::Value,
        }
    }

    fn q2() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn q3() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
    }

    #[test]
    fn sums_across_managers() {
        let trades = vec![
            trade("M1", "T", q2(), dec!(300)),
            trade("M2", "T", q2(), dec!(250)),
            trade("M3", "T", q2(), dec!(-50)),
            trade("M1", "T", q3(), dec!(-10)),
        ];

        let exposures = aggregate_exposure(&trades);

        assert_eq!(exposures.len(), 2);
        assert_eq!(exposures[0].period, q2());
        assert_eq!(exposures[0].net_exposure_change, dec!(500));
        assert_eq!(exposures[0].trade_count, 3);
        assert_eq!(exposures[1].net_exposure_change, dec!(-10));
    }

    #[test]
    fn securities_are_kept_apart() {
        let trades = vec![
            trade("M1", "UNH", q2(), dec!(1)),
            trade("M1", "ORCL", q2(), dec!(2)),
        ];

        let exposures = aggregate_exposure(&trades);

        assert_eq!(exposures.len(), 2);
        assert_eq!(exposures[0].security_id, "ORCL");
        assert_eq!(exposures[1].security_id, "UNH");
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let mut trades = vec![
            trade("M1", "T", q2(), dec!(0.1)),
            trade("M2", "T", q2(), dec!(0.2)),
            trade("M3", "T", q2(), dec!(-0.3)),
            trade("M4", "T", q3(), dec!(0.000000001)),
            trade("M5", "T", q3(), dec!(123456789.123)),
        ];

        let forward = aggregate_exposure(&trades);
        trades.reverse();
        let reversed = aggregate_exposure(&trades);
        trades.swap(0, 3);
        let shuffled = aggregate_exposure(&trades);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
        assert_eq!(forward[0].net_exposure_change, dec!(0));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate_exposure(&[]).is_empty());
    }
}
