//! Read interfaces the analytics pipeline consumes.

use crate::models::DisclosureObservation;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Supplies the full, deduplicated set of disclosure observations.
#[async_trait]
pub trait HoldingsSource: Send + Sync {
    async fn fetch_disclosure_observations(&self) -> Result<Vec<DisclosureObservation>>;
}

/// As-of close price lookup.
pub trait PriceLookup {
    /// Close on `date`, or on the nearest earlier trading day.
    fn price_on_or_before(&self, security_id: &str, date: NaiveDate) -> Option<Decimal>;
}
