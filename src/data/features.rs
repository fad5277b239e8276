//! Feature engineering for regime classification.
//!
//! Turns daily closes into log returns, annualized rolling volatility, a long
//! moving average and the relative distance from it. Days without a full
//! window of history are dropped, so every emitted record is complete.

use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::debug;

use super::types::{FeatureRecord, PricePoint};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Insufficient history: need at least {needed} prices, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("Invalid price {price} on {date}")]
    InvalidPrice { date: chrono::NaiveDate, price: String },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),
}

/// Feature builder.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    /// Returns per volatility estimate.
    pub volatility_window: usize,
    /// Prices per moving average.
    pub ma_window: usize,
    /// Annualization factor for volatility.
    pub periods_per_year: f64,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            volatility_window: 20,
            ma_window: 200,
            periods_per_year: 252.0,
        }
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volatility_window(mut self, window: usize) -> Self {
        self.volatility_window = window;
        self
    }

    pub fn with_ma_window(mut self, window: usize) -> Self {
        self.ma_window = window;
        self
    }

    /// Index of the first price with complete history.
    pub fn warmup(&self) -> usize {
        self.volatility_window.max(self.ma_window.saturating_sub(1))
    }

    /// Minimum number of prices producing at least one record.
    pub fn min_prices(&self) -> usize {
        self.warmup() + 1
    }

    /// Build one feature record per price with full window history.
    pub fn build(&self, prices: &[PricePoint]) -> Result<Vec<FeatureRecord>, FeatureError> {
        if self.volatility_window < 2 {
            return Err(FeatureError::InvalidWindow(format!(
                "volatility window must be at least 2, got {}",
                self.volatility_window
            )));
        }
        if self.ma_window == 0 {
            return Err(FeatureError::InvalidWindow(
                "moving average window must be at least 1".to_string(),
            ));
        }
        if prices.len() < self.min_prices() {
            return Err(FeatureError::InsufficientHistory {
                needed: self.min_prices(),
                got: prices.len(),
            });
        }

        let closes = prices
            .iter()
            .map(|p| match p.close.to_f64() {
                Some(c) if c > 0.0 && c.is_finite() => Ok(c),
                _ => Err(FeatureError::InvalidPrice {
                    date: p.date,
                    price: p.close.to_string(),
                }),
            })
            .collect::<Result<Vec<f64>, _>>()?;

        // returns[i] is the return into day i; returns[0] is undefined
        let mut returns = vec![0.0; closes.len()];
        for i in 1..closes.len() {
            returns[i] = (closes[i] / closes[i - 1]).ln();
        }

        let annualize = self.periods_per_year.sqrt();
        let warmup = self.warmup();
        let mut ma_sum: f64 = closes[warmup + 1 - self.ma_window..warmup].iter().sum();
        let mut records = Vec::with_capacity(closes.len() - warmup);

        for i in warmup..closes.len() {
            ma_sum += closes[i];
            if i > warmup {
                ma_sum -= closes[i - self.ma_window];
            }
            let moving_average = ma_sum / self.ma_window as f64;

            let window = &returns[i + 1 - self.volatility_window..=i];
            let volatility = window.iter().std_dev() * annualize;

            records.push(FeatureRecord {
                date: prices[i].date,
                price: closes[i],
                ret: returns[i],
                volatility,
                moving_average,
                trend_distance: (closes[i] - moving_average) / moving_average,
            });
        }

        debug!(
            "Built {} feature records from {} prices (warmup {})",
            records.len(),
            prices.len(),
            warmup
        );

        Ok(records)
    }
}
