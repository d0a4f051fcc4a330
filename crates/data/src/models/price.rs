//! End-of-day price model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closing price of a security on one trading day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub security_id: String,
    pub trading_date: NaiveDate,
    pub close_price: Decimal,
}

impl PriceObservation {
    pub fn new(security_id: impl Into<String>, trading_date: NaiveDate, close_price: Decimal) -> Self {
        Self {
            security_id: security_id.into().to_uppercase(),
            trading_date,
            close_price,
        }
    }
}
