//! Disclosure observation models.
//!
//! A `RawHolding` is one holding row as delivered by a filing source. It is
//! validated into a `DisclosureObservation` before it can enter the store;
//! rows with neither shares nor value are rejected there.

use chrono::NaiveDate;
use inst_flow_core::{FlowError, FlowResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding row of a quarterly disclosure, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHolding {
    /// Filing identity (accession number)
    pub filing_id: String,
    /// Institutional filer
    pub manager_id: String,
    /// Ticker symbol
    pub security_id: String,
    /// Period of report, `YYYY-MM-DD`
    pub period: String,
    /// Filing timestamp; only the date part is kept
    #[serde(default)]
    pub filed_at: Option<String>,
    #[serde(default)]
    pub shares: Option<Decimal>,
    /// Disclosed market value in USD thousands
    #[serde(default)]
    pub value_thousands: Option<Decimal>,
}

/// A validated holding of one security by one manager for one period.
///
/// `value_thousands` is always present; `shares` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureObservation {
    pub filing_id: String,
    pub manager_id: String,
    pub security_id: String,
    pub period: NaiveDate,
    pub filed_date: Option<NaiveDate>,
    pub shares: Option<u64>,
    pub value_thousands: Decimal,
}

impl DisclosureObservation {
    /// Creates an observation. `security_id` is upper-cased.
    pub fn new(
        filing_id: impl Into<String>,
        manager_id: impl Into<String>,
        security_id: impl Into<String>,
        period: NaiveDate,
        shares: Option<u64>,
        value_thousands: Decimal,
    ) -> Self {
        Self {
            filing_id: filing_id.into(),
            manager_id: manager_id.into(),
            security_id: security_id.into().to_uppercase(),
            period,
            filed_date: None,
            shares,
            value_thousands,
        }
    }

    /// Builder method to set the filing date.
    #[must_use]
    pub fn with_filed_date(mut self, filed_date: NaiveDate) -> Self {
        self.filed_date = Some(filed_date);
        self
    }

    /// Deduplication identity of the observation.
    #[must_use]
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            filing_id: self.filing_id.clone(),
            manager_id: self.manager_id.clone(),
            security_id: self.security_id.clone(),
        }
    }

    /// Grouping key for trade inference.
    #[must_use]
    pub fn pair_key(&self) -> PairKey {
        PairKey {
            manager_id: self.manager_id.clone(),
            security_id: self.security_id.clone(),
        }
    }
}

impl TryFrom<RawHolding> for DisclosureObservation {
    type Error = FlowError;

    fn try_from(raw: RawHolding) -> FlowResult<Self> {
        let filing_id = raw.filing_id.trim().to_string();
        let manager_id = raw.manager_id.trim().to_string();
        let security_id = raw.security_id.trim().to_uppercase();

        if filing_id.is_empty() || manager_id.is_empty() || security_id.is_empty() {
            return Err(FlowError::InvalidRecord {
                reason: format!(
                    "holding needs filing, manager and security ids (got '{}', '{}', '{}')",
                    filing_id, manager_id, security_id
                ),
            });
        }

        let value_thousands = match raw.value_thousands {
            Some(v) if v >= Decimal::ZERO => v,
            Some(v) => {
                return Err(FlowError::InvalidRecord {
                    reason: format!("negative value_thousands {v} for {security_id}"),
                })
            }
            None => {
                return Err(FlowError::MissingQuantity {
                    filing_id,
                    manager_id,
                    security_id,
                })
            }
        };

        // A present share count is kept exactly or the row is rejected.
        let shares = match raw.shares {
            None => None,
            Some(s) if s < Decimal::ZERO => {
                return Err(FlowError::InvalidRecord {
                    reason: format!("negative share count {s} for {security_id}"),
                })
            }
            Some(s) if !s.fract().is_zero() => {
                return Err(FlowError::InvalidRecord {
                    reason: format!("fractional share count {s} for {security_id}"),
                })
            }
            Some(s) => Some(s.to_u64().ok_or_else(|| FlowError::InvalidRecord {
                reason: format!("share count {s} for {security_id} is out of range"),
            })?),
        };

        let period = parse_date_prefix(&raw.period).ok_or_else(|| FlowError::InvalidRecord {
            reason: format!("unparseable period '{}'", raw.period),
        })?;
        let filed_date = raw.filed_at.as_deref().and_then(parse_date_prefix);

        Ok(Self {
            filing_id,
            manager_id,
            security_id,
            period,
            filed_date,
            shares,
            value_thousands,
        })
    }
}

/// Parses the leading `YYYY-MM-DD` of a date or timestamp string.
fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Identity of one holding in one filing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationKey {
    pub filing_id: String,
    pub manager_id: String,
    pub security_id: String,
}

/// A manager's position in one security across periods.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub manager_id: String,
    pub security_id: String,
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.manager_id, self.security_id)
    }
}
