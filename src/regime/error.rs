//! Errors raised by the regime classification pipeline.
//!
//! Every error aborts the run; no partial table is produced.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimeError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Calibration failed: {0}")]
    Calibration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Non-finite {field} on {date}")]
    InvalidFeature { date: NaiveDate, field: &'static str },

    #[error("Feature series not in ascending date order at index {index} ({date})")]
    Unordered { index: usize, date: NaiveDate },

    #[error("Length mismatch: {field} has {got} values, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
}

pub type RegimeResult<T> = Result<T, RegimeError>;
