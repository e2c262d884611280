//! OHLCV bar type consumed by the engine

use chrono::NaiveDate;

/// One OHLCV observation.
///
/// Prices are expected to be finite with `high >= low`; the engine does not
/// re-validate them. Series are passed around as `&[Bar]`, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { date, open, high, low, close, volume }
    }

    /// Close above open
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close below open
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High minus low, `None` for a zero-range bar
    pub fn range(&self) -> Option<f64> {
        let range = self.high - self.low;
        if range > 0.0 {
            Some(range)
        } else {
            None
        }
    }

    /// Where the close sits inside the bar: 0.0 at the low, 1.0 at the high
    pub fn close_position(&self) -> Option<f64> {
        self.range().map(|range| (self.close - self.low) / range)
    }
}

/// Last `lookback` bars of a series (the whole series when shorter)
pub fn tail(bars: &[Bar], lookback: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(lookback)..]
}
