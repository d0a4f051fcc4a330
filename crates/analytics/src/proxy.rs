//! Quantity proxy resolution.
//!
//! A holding's position size is its share count when the filing discloses
//! one, and its dollar value (USD thousands) otherwise.

use inst_flow_data::{DisclosureObservation, QuantityProxy};
use rust_decimal::Decimal;

/// Resolves the proxy quantity of one observation.
#[must_use]
pub fn resolve_proxy(observation: &DisclosureObservation) -> QuantityProxy {
    match observation.shares {
        Some(shares) => QuantityProxy::Shares(Decimal::from(shares)),
        None => QuantityProxy::Dollars(observation.value_thousands),
    }
}

/// An observation paired with its resolved proxy.
#[derive(Debug, Clone, Copy)]
pub struct ProxiedObservation<'a> {
    pub observation: &'a DisclosureObservation,
    pub proxy: QuantityProxy,
}

impl<'a> From<&'a DisclosureObservation> for ProxiedObservation<'a> {
    fn from(observation: &'a DisclosureObservation) -> Self {
        Self {
            observation,
            proxy: resolve_proxy(observation),
        }
    }
}
