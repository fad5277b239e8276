//! Price history loader.
//!
//! Reads daily closes from CSV or parquet files with polars. The date column
//! may hold `%Y-%m-%d` strings or a native date type; the price column is cast
//! to f64. Rows missing either value are dropped, the rest sorted by date,
//! and duplicate dates keep the last row. A date that is present but does not
//! parse is an error.

use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::PricePoint;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Loader for a single daily price history file.
#[derive(Debug, Clone)]
pub struct PriceLoader {
    date_column: String,
    price_column: String,
}

impl Default for PriceLoader {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            price_column: "close".to_string(),
        }
    }
}

impl PriceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use different column names.
    pub fn with_columns(date_column: &str, price_column: &str) -> Self {
        Self {
            date_column: date_column.to_string(),
            price_column: price_column.to_string(),
        }
    }

    /// Scan a CSV or parquet file lazily, chosen by extension.
    pub fn scan(&self, path: &Path) -> Result<LazyFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let lf = match ext.as_str() {
            "csv" => LazyCsvReader::new(path).with_has_header(true).finish()?,
            "parquet" => LazyFrame::scan_parquet(path, ScanArgsParquet::default())?,
            _ => return Err(LoaderError::UnsupportedFormat(path.display().to_string())),
        };
        Ok(lf)
    }

    /// Load the date and price columns into a DataFrame.
    pub fn load_dataframe(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        let df = self.scan(path)?.collect()?;

        for name in [&self.date_column, &self.price_column] {
            if df.column(name).is_err() {
                return Err(LoaderError::MissingColumn(name.clone()));
            }
        }

        Ok(df.select([self.date_column.as_str(), self.price_column.as_str()])?)
    }

    /// Load a cleaned, date-ordered price history.
    pub fn load(&self, path: &Path) -> Result<Vec<PricePoint>, LoaderError> {
        let df = self.load_dataframe(path)?;
        let points = self.dataframe_to_points(&df)?;
        debug!("Loaded {} prices from {}", points.len(), path.display());
        Ok(points)
    }

    /// Convert a DataFrame holding the configured columns to price points.
    pub fn dataframe_to_points(&self, df: &DataFrame) -> Result<Vec<PricePoint>, LoaderError> {
        let dates = self.read_dates(df)?;

        let price_col = df
            .column(&self.price_column)?
            .cast(&DataType::Float64)?;
        let prices: Vec<Option<f64>> = price_col.f64()?.into_iter().collect();

        let mut points: Vec<PricePoint> = Vec::with_capacity(prices.len());
        let mut dropped = 0usize;

        for (date, price) in dates.into_iter().zip(prices) {
            match (date, price.filter(|p| p.is_finite())) {
                (Some(date), Some(price)) => {
                    let close = Decimal::from_f64_retain(price).ok_or_else(|| {
                        LoaderError::InvalidData(format!("unrepresentable price {} on {}", price, date))
                    })?;
                    points.push(PricePoint::new(date, close));
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!("Dropped {} rows with missing date or price", dropped);
        }

        // Stable sort keeps file order within a date; keep the last row.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        if deduped.is_empty() {
            return Err(LoaderError::InvalidData("no valid price rows".to_string()));
        }

        Ok(deduped)
    }

    fn read_dates(&self, df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, LoaderError> {
        let dates_col = df.column(&self.date_column)?;

        // Handle both string and date column types
        if let Ok(str_col) = dates_col.str() {
            str_col
                .into_iter()
                .map(|s| match s {
                    Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                        .map(Some)
                        .map_err(|e| LoaderError::InvalidData(format!("bad date {:?}: {}", s, e))),
                    None => Ok(None),
                })
                .collect()
        } else if let Ok(date_col) = dates_col.date() {
            Ok(date_col
                .into_iter()
                .map(|d| d.map(date_from_days))
                .collect())
        } else {
            Err(LoaderError::InvalidData(format!(
                "{} column has unexpected type {}",
                self.date_column,
                dates_col.dtype()
            )))
        }
    }
}

/// Convert days since Unix epoch to NaiveDate.
fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + 719163).unwrap_or_default()
}
