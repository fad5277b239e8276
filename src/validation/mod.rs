//! Price source validation.
//!
//! Checks the contract the classifier relies on: enough history, ascending
//! unique dates, positive prices and no large calendar gaps.

pub mod series;

pub use series::{
    CheckResult, PriceSeriesValidator, SeriesIntegrityReport, ValidationError, BLOCKING_CHECKS,
};
