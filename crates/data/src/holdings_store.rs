//! In-memory holdings store.
//!
//! Holds one observation per (filing, manager, security). Inserting a row
//! whose identity is already present is a no-op, so re-ingesting the same
//! filings leaves the store unchanged.

use crate::models::{DisclosureObservation, ObservationKey, RawHolding};
use crate::sources::HoldingsSource;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use inst_flow_core::FlowError;
use std::collections::BTreeMap;

/// Outcome counts of an ingest batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    /// Rows offered to the store
    pub received: usize,
    /// Rows stored for the first time
    pub inserted: usize,
    /// Rows whose filing identity was already present
    pub duplicates: usize,
    /// Rows without shares or value
    pub missing_quantity: usize,
    /// Rows that could not be parsed
    pub invalid: usize,
}

impl IngestStats {
    /// Formats a summary line.
    pub fn summary(&self) -> String {
        format!(
            "Received: {}, Inserted: {}, Duplicates: {}, Missing quantity: {}, Invalid: {}",
            self.received, self.inserted, self.duplicates, self.missing_quantity, self.invalid
        )
    }
}

/// Holdings keyed by filing identity.
#[derive(Debug, Default, Clone)]
pub struct HoldingsStore {
    observations: BTreeMap<ObservationKey, DisclosureObservation>,
}

impl HoldingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a validated observation unless its identity is already stored.
    ///
    /// Returns true when the observation was new.
    pub fn insert(&mut self, observation: DisclosureObservation) -> bool {
        let key = observation.key();
        if self.observations.contains_key(&key) {
            return false;
        }
        self.observations.insert(key, observation);
        true
    }

    /// Validates and inserts raw rows, skipping rows that fail validation.
    pub fn ingest<I>(&mut self, rows: I) -> IngestStats
    where
        I: IntoIterator<Item = RawHolding>,
    {
        let mut stats = IngestStats::default();

        for row in rows {
            stats.received += 1;
            match DisclosureObservation::try_from(row) {
                Ok(observation) => {
                    if self.insert(observation) {
                        stats.inserted += 1;
                    } else {
                        stats.duplicates += 1;
                    }
                }
                Err(err @ FlowError::MissingQuantity { .. }) => {
                    tracing::debug!("Skipping holding: {}", err);
                    stats.missing_quantity += 1;
                }
                Err(err) => {
                    tracing::warn!("Skipping holding: {}", err);
                    stats.invalid += 1;
                }
            }
        }

        tracing::info!("Holdings ingest: {}", stats.summary());
        stats
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// All observations in key order.
    pub fn observations(&self) -> impl Iterator<Item = &DisclosureObservation> {
        self.observations.values()
    }

    /// Distinct securities in the store, sorted.
    pub fn securities(&self) -> Vec<String> {
        let mut securities: Vec<String> = self
            .observations
            .values()
            .map(|o| o.security_id.clone())
            .collect();
        securities.sort();
        securities.dedup();
        securities
    }

    /// Distinct periods disclosed for a security, ascending.
    pub fn periods_for(&self, security_id: &str) -> Vec<NaiveDate> {
        let mut periods: Vec<NaiveDate> = self
            .observations
            .values()
            .filter(|o| o.security_id == security_id)
            .map(|o| o.period)
            .collect();
        periods.sort();
        periods.dedup();
        periods
    }
}

#[async_trait]
impl HoldingsSource for HoldingsStore {
    async fn fetch_disclosure_observations(&self) -> Result<Vec<DisclosureObservation>> {
        Ok(self.observations.values().cloned().collect())
    }
}
