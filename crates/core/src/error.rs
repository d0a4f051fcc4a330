//! Error taxonomy for the institutional flow pipeline.
//!
//! Every variant is a deterministic function of the input data; nothing here
//! is transient or worth retrying.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A disclosed holding carries neither a share count nor a dollar value.
    #[error("holding {security_id} for {manager_id} in filing {filing_id} has neither shares nor value")]
    MissingQuantity {
        filing_id: String,
        manager_id: String,
        security_id: String,
    },

    /// No close on or before the reference date (within the staleness bound).
    #[error("no price for {security_id} on or before {date}")]
    UnresolvedPrice { security_id: String, date: NaiveDate },

    #[error("{test} needs at least {required} observations, got {actual}")]
    InsufficientSample {
        test: &'static str,
        required: usize,
        actual: usize,
    },

    /// Sample is large enough but the statistic is undefined (e.g. zero variance).
    #[error("{test} is undefined: {reason}")]
    DegenerateSample { test: &'static str, reason: String },

    /// More than one observation for the same manager, security and period.
    #[error("duplicate observation for {manager_id}/{security_id} in period {period}")]
    DuplicateObservation {
        manager_id: String,
        security_id: String,
        period: NaiveDate,
    },

    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}

impl FlowError {
    /// Returns true for errors that mean "not computable" rather than bad input.
    #[must_use]
    pub const fn is_sample_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientSample { .. } | Self::DegenerateSample { .. }
        )
    }
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;
