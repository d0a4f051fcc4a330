//! End-of-day price cache with as-of lookup.
//!
//! A lookup on a non-trading day resolves to the nearest earlier close, but
//! never to one older than the configured staleness bound.

use crate::models::PriceObservation;
use crate::sources::PriceLookup;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Date range covered by one security's prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCoverage {
    pub security_id: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: usize,
}

#[derive(Debug, Default, Clone)]
pub struct PriceStore {
    series: BTreeMap<String, BTreeMap<NaiveDate, Decimal>>,
    max_staleness: Option<Duration>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how far back an as-of lookup may reach.
    ///
    /// A bound too large to represent as a duration leaves lookups unbounded.
    #[must_use]
    pub fn with_max_staleness_days(mut self, days: Option<i64>) -> Self {
        self.max_staleness = days.and_then(Duration::try_days);
        self
    }

    /// Stores a close, replacing any existing close for the same day.
    ///
    /// Non-positive closes are ignored; returns whether the row was stored.
    pub fn upsert(&mut self, observation: PriceObservation) -> bool {
        if observation.close_price <= Decimal::ZERO {
            tracing::warn!(
                "Ignoring non-positive close {} for {} on {}",
                observation.close_price,
                observation.security_id,
                observation.trading_date
            );
            return false;
        }

        self.series
            .entry(observation.security_id.to_uppercase())
            .or_default()
            .insert(observation.trading_date, observation.close_price);
        true
    }

    /// Upserts a batch and returns the number of rows stored.
    pub fn extend<I>(&mut self, observations: I) -> usize
    where
        I: IntoIterator<Item = PriceObservation>,
    {
        let mut stored = 0;
        for observation in observations {
            if self.upsert(observation) {
                stored += 1;
            }
        }
        stored
    }

    pub fn len(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Coverage per security, sorted by security.
    pub fn coverage(&self) -> Vec<PriceCoverage> {
        self.series
            .iter()
            .filter_map(|(security_id, closes)| {
                let (first_date, _) = closes.first_key_value()?;
                let (last_date, _) = closes.last_key_value()?;
                Some(PriceCoverage {
                    security_id: security_id.clone(),
                    first_date: *first_date,
                    last_date: *last_date,
                    rows: closes.len(),
                })
            })
            .collect()
    }
}

impl PriceLookup for PriceStore {
    fn price_on_or_before(&self, security_id: &str, date: NaiveDate) -> Option<Decimal> {
        let closes = self.series.get(&security_id.to_uppercase())?;
        let (trading_date, close) = closes.range(..=date).next_back()?;

        if let Some(max_staleness) = self.max_staleness {
            if date - *trading_date > max_staleness {
                tracing::debug!(
                    "Close for {} on {} is too stale for {}",
                    security_id,
                    trading_date,
                    date
                );
                return None;
            }
        }

        Some(*close)
    }
}
