//! Core data types for regime classification.
//!
//! A price history is a date-ordered list of [`PricePoint`]s. Feature
//! computation turns it into [`FeatureRecord`]s, one per trading day with a
//! full window history, which is the only input the classifier consumes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily close of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// Engineered features for a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Trading date
    pub date: NaiveDate,

    /// Closing price
    pub price: f64,

    /// Log return versus the previous close
    #[serde(rename = "return")]
    pub ret: f64,

    /// Annualized rolling volatility of returns
    pub volatility: f64,

    /// Trailing mean of price over the long window
    pub moving_average: f64,

    /// (price - moving_average) / moving_average
    pub trend_distance: f64,
}

impl FeatureRecord {
    /// Name of the first non-finite field, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("price", self.price),
            ("return", self.ret),
            ("volatility", self.volatility),
            ("moving_average", self.moving_average),
            ("trend_distance", self.trend_distance),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FeatureRecord {
        FeatureRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            price: 101.0,
            ret: 0.01,
            volatility: 0.15,
            moving_average: 100.0,
            trend_distance: 0.01,
        }
    }

    #[test]
    fn test_finite_record() {
        assert_eq!(record().non_finite_field(), None);
    }

    #[test]
    fn test_non_finite_field_reported() {
        let mut r = record();
        r.volatility = f64::NAN;
        assert_eq!(r.non_finite_field(), Some("volatility"));

        let mut r = record();
        r.ret = f64::INFINITY;
        assert_eq!(r.non_finite_field(), Some("return"));
    }
}
