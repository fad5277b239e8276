//! Export of the classified table.
//!
//! Dates and labels are written as strings so the files read back without a
//! schema.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::regime::{RegimeRecord, RegimeTable};

/// Output columns, in order.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "date",
    "price",
    "return",
    "volatility",
    "moving_average",
    "trend_distance",
    "trend_state",
    "vol_state_raw",
    "vol_state",
    "regime_raw",
    "regime",
    "confidence",
    "trend_score",
    "vol_score",
    "duration_score",
];

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported output type: {0}")]
    UnsupportedFormat(String),
}

/// Build a DataFrame with one column per output field.
pub fn to_dataframe(table: &RegimeTable) -> Result<DataFrame, WriteError> {
    let records = table.records();

    let columns = vec![
        Column::new(
            "date".into(),
            labels(records, |r| r.date.format("%Y-%m-%d").to_string()),
        ),
        Column::new("price".into(), floats(records, |r| r.price)),
        Column::new("return".into(), floats(records, |r| r.ret)),
        Column::new("volatility".into(), floats(records, |r| r.volatility)),
        Column::new("moving_average".into(), floats(records, |r| r.moving_average)),
        Column::new("trend_distance".into(), floats(records, |r| r.trend_distance)),
        Column::new("trend_state".into(), labels(records, |r| r.trend_state.to_string())),
        Column::new("vol_state_raw".into(), labels(records, |r| r.vol_state_raw.to_string())),
        Column::new("vol_state".into(), labels(records, |r| r.vol_state.to_string())),
        Column::new("regime_raw".into(), labels(records, |r| r.regime_raw.to_string())),
        Column::new("regime".into(), labels(records, |r| r.regime.to_string())),
        Column::new("confidence".into(), floats(records, |r| r.confidence)),
        Column::new("trend_score".into(), floats(records, |r| r.trend_score)),
        Column::new("vol_score".into(), floats(records, |r| r.vol_score)),
        Column::new("duration_score".into(), floats(records, |r| r.duration_score)),
    ];

    Ok(DataFrame::new(columns)?)
}

fn floats(records: &[RegimeRecord], f: impl Fn(&RegimeRecord) -> f64) -> Vec<f64> {
    records.iter().map(f).collect()
}

fn labels(records: &[RegimeRecord], f: impl Fn(&RegimeRecord) -> String) -> Vec<String> {
    records.iter().map(f).collect()
}

/// Write the table as CSV with a header row.
pub fn write_csv(table: &RegimeTable, path: &Path) -> Result<(), WriteError> {
    let mut df = to_dataframe(table)?;
    let file = File::create(path)?;
    CsvWriter::new(BufWriter::new(file))
        .include_header(true)
        .finish(&mut df)?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write the records as a JSON array.
pub fn write_json(table: &RegimeTable, path: &Path) -> Result<(), WriteError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), table.records())?;
    info!("Wrote {} records to {}", table.len(), path.display());
    Ok(())
}

/// Write by extension: `.csv` or `.json`.
pub fn write_table(table: &RegimeTable, path: &Path) -> Result<(), WriteError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(table, path),
        Some("json") => write_json(table, path),
        _ => Err(WriteError::UnsupportedFormat(path.display().to_string())),
    }
}
