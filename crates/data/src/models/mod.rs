//! Data models for institutional flow analysis.
//!
//! Quantities and prices use `rust_decimal::Decimal` so that aggregation is
//! exact and independent of input order.

pub mod disclosure;
pub mod flow;
pub mod price;

pub use disclosure::{DisclosureObservation, ObservationKey, PairKey, RawHolding};
pub use flow::{
    ExposureChange, ExposureReturnPair, InferredTrade, ProxySource, QuantityProxy, SignalClass,
    TradeAction,
};
pub use price::PriceObservation;
