//! Price series integrity validation.
//!
//! Validates:
//! - Minimum history length
//! - Chronological order
//! - Unique trading dates
//! - Positive prices
//! - Date continuity (no calendar gap above a limit)
//!
//! All checks but date continuity are blocking: a series failing one of them
//! is rejected before classification. Gaps are only reported.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::data::PricePoint;

/// Checks whose failure rejects the series.
pub const BLOCKING_CHECKS: &[&str] = &[
    "min_history",
    "chronological_order",
    "unique_dates",
    "positive_prices",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Price series rejected by {check}: {message}")]
    Rejected { check: String, message: String },
}

/// Result of a single validation check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one price history.
#[derive(Debug)]
pub struct SeriesIntegrityReport {
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub checks: Vec<CheckResult>,
}

impl SeriesIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    /// Reject the series if any blocking check failed.
    pub fn ensure_usable(&self) -> Result<(), ValidationError> {
        let blocking = self
            .checks
            .iter()
            .find(|c| !c.passed && BLOCKING_CHECKS.contains(&c.name.as_str()));

        match blocking {
            Some(check) => Err(ValidationError::Rejected {
                check: check.name.clone(),
                message: match &check.details {
                    Some(details) => format!("{} ({})", check.message, details),
                    None => check.message.clone(),
                },
            }),
            None => Ok(()),
        }
    }

    /// One-line pass count and date range.
    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        let range = match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => "empty".to_string(),
        };
        format!(
            "{} observations ({}): {}/{} checks passed",
            self.observations,
            range,
            passed,
            self.checks.len()
        )
    }
}

/// Validator for the price source contract.
#[derive(Debug, Clone)]
pub struct PriceSeriesValidator {
    /// Minimum number of observations.
    pub min_length: usize,
    /// Largest tolerated calendar gap between consecutive dates.
    pub max_gap_days: i64,
}

impl Default for PriceSeriesValidator {
    fn default() -> Self {
        Self {
            min_length: 2000,
            max_gap_days: 10,
        }
    }
}

impl PriceSeriesValidator {
    /// Create a validator with explicit limits.
    pub fn new(min_length: usize, max_gap_days: i64) -> Self {
        Self {
            min_length,
            max_gap_days,
        }
    }

    /// Run all checks.
    pub fn validate(&self, prices: &[PricePoint]) -> SeriesIntegrityReport {
        let checks = vec![
            self.check_min_history(prices),
            self.check_chronological_order(prices),
            self.check_unique_dates(prices),
            self.check_positive_prices(prices),
            self.check_date_continuity(prices),
        ];

        for check in checks.iter().filter(|c| !c.passed) {
            warn!("Check {} failed: {}", check.name, check.message);
        }

        SeriesIntegrityReport {
            observations: prices.len(),
            first_date: prices.iter().map(|p| p.date).min(),
            last_date: prices.iter().map(|p| p.date).max(),
            checks,
        }
    }

    fn check_min_history(&self, prices: &[PricePoint]) -> CheckResult {
        if prices.len() >= self.min_length {
            CheckResult::pass(
                "min_history",
                &format!("{} observations (minimum {})", prices.len(), self.min_length),
            )
        } else {
            CheckResult::fail(
                "min_history",
                "Not enough history",
                Some(format!(
                    "{} observations, need {}",
                    prices.len(),
                    self.min_length
                )),
            )
        }
    }

    fn check_chronological_order(&self, prices: &[PricePoint]) -> CheckResult {
        let out_of_order: Vec<String> = prices
            .windows(2)
            .filter(|w| w[1].date < w[0].date)
            .take(5)
            .map(|w| format!("{} after {}", w[1].date, w[0].date))
            .collect();

        if out_of_order.is_empty() {
            CheckResult::pass("chronological_order", "Dates ascending")
        } else {
            CheckResult::fail(
                "chronological_order",
                "Dates out of order",
                Some(out_of_order.join(", ")),
            )
        }
    }

    fn check_unique_dates(&self, prices: &[PricePoint]) -> CheckResult {
        let mut seen = HashSet::new();
        let duplicates: Vec<NaiveDate> = prices
            .iter()
            .filter(|p| !seen.insert(p.date))
            .map(|p| p.date)
            .collect();

        if duplicates.is_empty() {
            CheckResult::pass("unique_dates", "One observation per date")
        } else {
            CheckResult::fail(
                "unique_dates",
                &format!("{} duplicate dates", duplicates.len()),
                Some(format!("First: {:?}", &duplicates[..duplicates.len().min(5)])),
            )
        }
    }

    fn check_positive_prices(&self, prices: &[PricePoint]) -> CheckResult {
        let bad: Vec<&PricePoint> = prices.iter().filter(|p| p.close <= Decimal::ZERO).collect();

        if bad.is_empty() {
            CheckResult::pass("positive_prices", "All prices positive")
        } else {
            CheckResult::fail(
                "positive_prices",
                &format!("{} non-positive prices", bad.len()),
                Some(format!("First on {}: {}", bad[0].date, bad[0].close)),
            )
        }
    }

    fn check_date_continuity(&self, prices: &[PricePoint]) -> CheckResult {
        let gaps: Vec<(NaiveDate, NaiveDate, i64)> = prices
            .windows(2)
            .map(|w| (w[0].date, w[1].date, (w[1].date - w[0].date).num_days()))
            .filter(|(_, _, days)| *days > self.max_gap_days)
            .collect();

        if gaps.is_empty() {
            CheckResult::pass(
                "date_continuity",
                &format!("No gaps above {} calendar days", self.max_gap_days),
            )
        } else {
            let details = gaps
                .iter()
                .take(5)
                .map(|(from, to, days)| format!("{} -> {} ({} days)", from, to, days))
                .collect::<Vec<_>>()
                .join(", ");
            CheckResult::fail(
                "date_continuity",
                &format!("{} gaps above {} days", gaps.len(), self.max_gap_days),
                Some(details),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn series(n: usize) -> Vec<PricePoint> {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| PricePoint::new(base + Duration::days(i as i64), dec!(100) + Decimal::from(i)))
            .collect()
    }

    fn check<'a>(report: &'a SeriesIntegrityReport, name: &str) -> &'a CheckResult {
        report.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_clean_series_passes() {
        let validator = PriceSeriesValidator::new(50, 5);
        let report = validator.validate(&series(60));
        assert!(report.all_passed(), "{:?}", report.failed_checks());
        assert_eq!(report.checks.len(), 5);
        assert!(report.summary().contains("5/5 checks passed"));
    }

    #[test]
    fn test_default_min_history() {
        let report = PriceSeriesValidator::default().validate(&series(100));
        assert!(!check(&report, "min_history").passed);
        assert_eq!(report.failed_checks().len(), 1);
    }

    #[test]
    fn test_order_and_duplicates() {
        let mut s = series(10);
        s.swap(3, 4);
        s.push(s[0].clone());
        let report = PriceSeriesValidator::new(1, 30).validate(&s);
        assert!(!check(&report, "chronological_order").passed);
        assert!(!check(&report, "unique_dates").passed);
    }

    #[test]
    fn test_non_positive_price() {
        let mut s = series(10);
        s[5].close = dec!(-1);
        let report = PriceSeriesValidator::new(1, 30).validate(&s);
        let c = check(&report, "positive_prices");
        assert!(!c.passed);
        assert!(c.message.starts_with("1 "));
    }

    #[test]
    fn test_gap_detected() {
        let mut s = series(10);
        for p in s.iter_mut().skip(5) {
            p.date += Duration::days(20);
        }
        let report = PriceSeriesValidator::new(1, 10).validate(&s);
        let c = check(&report, "date_continuity");
        assert!(!c.passed);
        assert!(c.details.as_ref().unwrap().contains("21 days"));
    }

    #[test]
    fn test_empty_series() {
        let report = PriceSeriesValidator::new(1, 10).validate(&[]);
        assert_eq!(report.observations, 0);
        assert!(report.first_date.is_none());
        assert!(!report.all_passed());
        assert!(report.summary().contains("empty"));
    }

    #[test]
    fn test_short_history_rejected() {
        let report = PriceSeriesValidator::default().validate(&series(460));
        let err = report.ensure_usable().unwrap_err();
        let ValidationError::Rejected { check, message } = err;
        assert_eq!(check, "min_history");
        assert!(message.contains("460 observations, need 2000"));
    }

    #[test]
    fn test_gap_alone_does_not_reject() {
        let mut s = series(30);
        for p in s.iter_mut().skip(10) {
            p.date += Duration::days(30);
        }
        let report = PriceSeriesValidator::new(20, 10).validate(&s);
        assert!(!report.all_passed());
        assert!(report.ensure_usable().is_ok());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut s = series(30);
        s[3].close = dec!(0);
        let report = PriceSeriesValidator::new(20, 10).validate(&s);
        assert!(matches!(
            report.ensure_usable(),
            Err(ValidationError::Rejected { check, .. }) if check == "positive_prices"
        ));
    }
}
