//! Data storage and management for institutional flow analysis.
//!
//! This crate provides:
//! - Data models for disclosures, prices and derived flow records
//! - An in-memory holdings store deduplicated by filing identity
//! - An end-of-day price store with as-of lookup
//! - CSV storage utilities
//! - The read interfaces the analytics pipeline consumes

pub mod csv_storage;
pub mod holdings_store;
pub mod models;
pub mod price_store;
pub mod sources;

pub use csv_storage::CsvStorage;
pub use holdings_store::{HoldingsStore, IngestStats};
pub use price_store::{PriceCoverage, PriceStore};
pub use sources::{HoldingsSource, PriceLookup};

pub use models::{
    DisclosureObservation, ExposureChange, ExposureReturnPair, InferredTrade, ObservationKey,
    PairKey, PriceObservation, ProxySource, QuantityProxy, RawHolding, SignalClass, TradeAction,
};
