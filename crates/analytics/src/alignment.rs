//! Alignment of exposure changes with forward price returns.
//!
//! Each period's net exposure change is joined to the return from that
//! period's reference close to the reference close of the security's next
//! disclosure period. A pair is only produced when both closes resolve.

use chrono::NaiveDate;
use inst_flow_core::quarter::{is_next_quarter, quarter_end, quarter_label};
use inst_flow_core::{FlowError, GapPolicy};
use inst_flow_data::{ExposureChange, ExposureReturnPair, PriceLookup, SignalClass};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts of what happened to each exposure record during alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentStats {
    /// Exposure records considered
    pub candidates: usize,
    /// Pairs emitted
    pub aligned: usize,
    /// Last period of a security, nothing to return into
    pub no_following_period: usize,
    /// Following period exists but is not the next calendar quarter
    pub gap_excluded: usize,
    /// Start or end close could not be resolved
    pub unresolved_price: usize,
}

impl AlignmentStats {
    /// Formats a summary line.
    pub fn summary(&self) -> String {
        format!(
            "Candidates: {}, Aligned: {}, No following period: {}, Gap excluded: {}, Unresolved price: {}",
            self.candidates,
            self.aligned,
            self.no_following_period,
            self.gap_excluded,
            self.unresolved_price
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Ordered by (security_id, period)
    pub pairs: Vec<ExposureReturnPair>,
    pub stats: AlignmentStats,
    /// One `UnresolvedPrice` per dropped pair
    pub unresolved: Vec<FlowError>,
}

/// Price reference date of a disclosure period: its calendar quarter end.
#[must_use]
pub fn reference_date(period: NaiveDate) -> NaiveDate {
    quarter_end(period).unwrap_or(period)
}

/// Joins exposure changes to forward returns.
pub fn align_returns<P>(exposures: &[ExposureChange], prices: &P, policy: GapPolicy) -> Alignment
where
    P: PriceLookup + ?Sized,
{
    let mut by_security: BTreeMap<&str, Vec<&ExposureChange>> = BTreeMap::new();
    for exposure in exposures {
        by_security
            .entry(exposure.security_id.as_str())
            .or_default()
            .push(exposure);
    }

    let mut alignment = Alignment::default();

    for (security_id, mut series) in by_security {
        series.sort_by_key(|e| e.period);
        alignment.stats.candidates += series.len();
        alignment.stats.no_following_period += 1;

        for window in series.windows(2) {
            let (current, next) = (window[0], window[1]);

            if policy == GapPolicy::ConsecutiveQuarters && !is_next_quarter(current.period, next.period) {
                tracing::debug!(
                    "{}: {} -> {} skips a quarter, excluded",
                    security_id,
                    quarter_label(current.period),
                    quarter_label(next.period)
                );
                alignment.stats.gap_excluded += 1;
                continue;
            }

            match forward_return(prices, security_id, current.period, next.period) {
                Ok((start_price, end_price, forward_return)) => {
                    alignment.pairs.push(ExposureReturnPair {
                        security_id: security_id.to_string(),
                        period: current.period,
                        next_period: next.period,
                        net_exposure_change: current.net_exposure_change,
                        start_price,
                        end_price,
                        forward_return,
                        signal: SignalClass::classify(current.net_exposure_change, forward_return),
                    });
                    alignment.stats.aligned += 1;
                }
                Err(err) => {
                    tracing::debug!("Dropping {} {}: {}", security_id, current.period, err);
                    alignment.stats.unresolved_price += 1;
                    alignment.unresolved.push(err);
                }
            }
        }
    }

    tracing::info!("Return alignment: {}", alignment.stats.summary());
    alignment
}

fn forward_return<P>(
    prices: &P,
    security_id: &str,
    period: NaiveDate,
    next_period: NaiveDate,
) -> Result<(Decimal, Decimal, Decimal), FlowError>
where
    P: PriceLookup + ?Sized,
{
    let resolve = |period: NaiveDate| {
        let date = reference_date(period);
        prices
            .price_on_or_before(security_id, date)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| FlowError::UnresolvedPrice {
                security_id: security_id.to_string(),
                date,
            })
    };

    let start_price = resolve(period)?;
    let end_price = resolve(next_period)?;

    // A ratio beyond Decimal's range cannot be priced either.
    let forward_return = end_price
        .checked_div(start_price)
        .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
        .ok_or_else(|| FlowError::UnresolvedPrice {
            security_id: security_id.to_string(),
            date: reference_date(next_period),
        })?
        .normalize();

    Ok((start_price, end_price, forward_return))
}
