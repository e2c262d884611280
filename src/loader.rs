//! Load daily OHLCV bars from CSV
//!
//! Expected header: `date,open,high,low,close,volume`. Capitalised names
//! (`Open`, `Close`) are accepted and extra columns ignored. Rows are sorted
//! by date and duplicate dates keep the last row, so the engine always sees
//! an ascending, duplicate-free series.

use crate::price_action::Bar;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// CSV row as exported by common quote providers
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "DATE", alias = "timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

/// Parse a date like `2024-01-31`, `20240131` or `2024-01-31 15:00:00`
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Read bars from any CSV source
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    let mut skipped = 0u64;
    let mut duplicates = 0u64;

    for (line, result) in csv_reader.deserialize().enumerate() {
        let row: CsvRow = result.with_context(|| format!("Failed to parse CSV row {}", line + 1))?;

        let Some(date) = parse_date(&row.date) else {
            tracing::warn!("Skipping row {}: unparseable date {:?}", line + 1, row.date);
            skipped += 1;
            continue;
        };

        let prices = [row.open, row.high, row.low, row.close];
        if prices.iter().any(|p| !p.is_finite()) || row.high < row.low {
            tracing::warn!("Skipping row {} ({}): invalid prices", line + 1, date);
            skipped += 1;
            continue;
        }

        let volume = row.volume.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0);
        let bar = Bar::new(date, row.open, row.high, row.low, row.close, volume);
        if by_date.insert(date, bar).is_some() {
            duplicates += 1;
        }
    }

    if skipped > 0 || duplicates > 0 {
        tracing::debug!("Skipped {} invalid rows, replaced {} duplicate dates", skipped, duplicates);
    }

    Ok(by_date.into_values().collect())
}

/// Read bars from a CSV file
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    read_bars(BufReader::new(file)).with_context(|| format!("Failed to load bars from {:?}", path))
}

/// Symbol for a bar file: its stem, upper-cased (`data/aapl.csv` -> `AAPL`)
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}
