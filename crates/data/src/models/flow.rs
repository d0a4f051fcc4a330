//! Derived position-change records.
//!
//! These are produced by the analytics pipeline and consumed by report and
//! export collaborators; field names are part of the output contract.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which disclosed field a proxy quantity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxySource {
    /// Share count
    Shares,
    /// Market value in USD thousands
    Value,
}

impl ProxySource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shares => "SHARES",
            Self::Value => "VALUE",
        }
    }
}

impl std::fmt::Display for ProxySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position size measured by share count when disclosed, else by dollar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityProxy {
    Shares(Decimal),
    Dollars(Decimal),
}

impl QuantityProxy {
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        match self {
            Self::Shares(q) | Self::Dollars(q) => *q,
        }
    }

    #[must_use]
    pub const fn source(&self) -> ProxySource {
        match self {
            Self::Shares(_) => ProxySource::Shares,
            Self::Dollars(_) => ProxySource::Value,
        }
    }
}

/// Direction of an inferred position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Classifies a delta by its strict sign; zero is `Hold`.
    #[must_use]
    pub fn from_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Self::Buy
        } else if delta < Decimal::ZERO {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period-over-period position change of one manager in one security.
///
/// Only exists for the second and later period of a manager/security pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredTrade {
    pub manager_id: String,
    pub security_id: String,
    pub period: NaiveDate,
    pub filed_date: Option<NaiveDate>,
    pub previous_proxy_quantity: Decimal,
    pub proxy_quantity: Decimal,
    pub delta: Decimal,
    pub action: TradeAction,
    pub proxy_source: ProxySource,
}

/// Net change in proxy quantity across all managers for one security and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureChange {
    pub security_id: String,
    pub period: NaiveDate,
    pub net_exposure_change: Decimal,
    /// Number of inferred trades summed into the figure
    pub trade_count: usize,
}

/// Agreement between the direction of flow and the following return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalClass {
    Match,
    Mismatch,
    Neutral,
}

impl SignalClass {
    /// `Neutral` when either side is exactly zero, `Match` when signs agree.
    #[must_use]
    pub fn classify(net_exposure_change: Decimal, forward_return: Decimal) -> Self {
        if net_exposure_change.is_zero() || forward_return.is_zero() {
            Self::Neutral
        } else if net_exposure_change.is_sign_positive() == forward_return.is_sign_positive() {
            Self::Match
        } else {
            Self::Mismatch
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::Mismatch => "MISMATCH",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for SignalClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net exposure change of a period joined to the return over the following period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureReturnPair {
    pub security_id: String,
    pub period: NaiveDate,
    /// Period whose reference price closes the return window
    pub next_period: NaiveDate,
    pub net_exposure_change: Decimal,
    pub start_price: Decimal,
    pub end_price: Decimal,
    pub forward_return: Decimal,
    pub signal: SignalClass,
}
