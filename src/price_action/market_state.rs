//! Market Regime Classification
//!
//! Decides whether recent price action is a Trend, a Trading Range or a
//! Spike and Channel, and which way it leans.
//!
//! Inputs over the lookback window:
//! - ATR(14) to normalize the regression slope across price scales
//! - Average body / average range (trend bars have big bodies)
//! - Closes crossing the 20-bar moving average (ranges keep crossing it)
//! - Recent spike bars: big bodies closing near their extreme

use super::bars::{tail, Bar};
use super::indicators::{linear_slope, ma_bias, mean_defined, IndicatorFrame};
use crate::error::{PriceActionError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Market regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    /// Sustained directional movement
    Trend,
    /// Price rotating around its mean without progress
    TradingRange,
    /// Sharp directional spike followed by a channel
    SpikeChannel,
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketType::Trend => write!(f, "Trend"),
            MarketType::TradingRange => write!(f, "TradingRange"),
            MarketType::SpikeChannel => write!(f, "SpikeChannel"),
        }
    }
}

/// Directional bias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bull,
    Bear,
    Neutral,
}

impl Direction {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Bull => write!(f, "Bull"),
            Direction::Bear => write!(f, "Bear"),
            Direction::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Thresholds for regime classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Bars kept from the end of the series (default: 60)
    pub lookback: usize,
    /// Minimum bars left after truncation (default: 30)
    pub min_bars: usize,
    pub atr_period: usize,
    /// Window for average body/range and the rolling body mean used by spikes
    pub body_window: usize,
    /// Closes used for the regression slope (default: 40)
    pub regression_window: usize,
    /// Body must exceed this multiple of the rolling mean body to be a spike
    pub spike_body_mult: f64,
    /// Spike range must exceed this multiple of ATR
    pub spike_range_atr_mult: f64,
    /// Bull spike closes above this fraction of its range
    pub spike_bull_close: f64,
    /// Bear spike closes below this fraction of its range
    pub spike_bear_close: f64,
    /// Trailing bars searched for a spike (default: 6)
    pub spike_window: usize,
    /// Moving average period for crossing counts (default: 20)
    pub ma_period: usize,
    /// Trailing bars over which MA crossings are counted (default: 30)
    pub cross_window: usize,
    /// Trailing bars for up/down pressure (default: 20)
    pub pressure_window: usize,
    /// |slope_norm| above this is trend-like
    pub trend_slope: f64,
    /// body_to_range above this is trend-like
    pub trend_body_ratio: f64,
    /// |slope_norm| below this is range-like
    pub range_slope: f64,
    /// MA crossings needed for range-like
    pub range_min_crosses: u32,
    /// Guard for divisions by ATR and average range
    pub epsilon: f64,
    /// Fail on an all-zero-range window instead of dividing by epsilon
    pub reject_degenerate: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            min_bars: 30,
            atr_period: 14,
            body_window: 20,
            regression_window: 40,
            spike_body_mult: 1.6,
            spike_range_atr_mult: 1.2,
            spike_bull_close: 0.75,
            spike_bear_close: 0.25,
            spike_window: 6,
            ma_period: 20,
            cross_window: 30,
            pressure_window: 20,
            trend_slope: 0.25,
            trend_body_ratio: 0.45,
            range_slope: 0.18,
            range_min_crosses: 8,
            epsilon: 1e-9,
            reject_degenerate: true,
        }
    }
}

/// Diagnostics behind a classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetrics {
    pub atr: f64,
    /// Regression slope of close divided by ATR
    pub slope_norm: f64,
    pub body_to_range: f64,
    pub ma_crosses: u32,
    pub up_pressure: f64,
    pub down_pressure: f64,
    pub has_spike: bool,
    /// Percent distance of the last close from its moving average
    pub ma_bias: Option<f64>,
}

/// Classification result, produced once per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub market_type: MarketType,
    pub direction: Direction,
    pub metrics: ContextMetrics,
}

/// Count how many times close crosses its moving average.
/// Positions where the average is undefined are skipped.
fn count_ma_crosses(closes: &[f64], ma: &[Option<f64>]) -> u32 {
    let mut crosses = 0u32;
    let mut prev_above: Option<bool> = None;

    for (close, ma) in closes.iter().zip(ma) {
        let Some(ma) = ma else {
            continue;
        };
        let curr_above = *close > *ma;
        if let Some(prev) = prev_above {
            if curr_above != prev {
                crosses += 1;
            }
        }
        prev_above = Some(curr_above);
    }

    crosses
}

/// Fraction of bars making higher (lower) highs and lows vs the bar before.
/// Returns (up_pressure, down_pressure).
fn directional_pressure(bars: &[Bar], window: usize) -> (f64, f64) {
    let n = bars.len();
    let start = n.saturating_sub(window).max(1);
    if start >= n {
        return (0.0, 0.0);
    }

    let mut up = 0usize;
    let mut down = 0usize;
    for i in start..n {
        let (prev, curr) = (&bars[i - 1], &bars[i]);
        up += (curr.high > prev.high) as usize + (curr.low > prev.low) as usize;
        down += (curr.high < prev.high) as usize + (curr.low < prev.low) as usize;
    }

    let samples = (2 * (n - start)) as f64;
    (up as f64 / samples, down as f64 / samples)
}

/// Any spike bar among the trailing `config.spike_window` bars
fn detect_spike(bars: &[Bar], frame: &IndicatorFrame, atr: f64, config: &ClassifierConfig) -> bool {
    let n = bars.len();
    (n.saturating_sub(config.spike_window)..n).any(|i| {
        let bar = &bars[i];
        let big_body = frame.body_ma[i].is_some_and(|mean| frame.body[i] > config.spike_body_mult * mean);
        if !big_body {
            return false;
        }

        let bar_atr = frame.atr[i].unwrap_or(atr);
        let wide = frame.range[i].is_some_and(|r| r > config.spike_range_atr_mult * bar_atr);
        if !wide {
            return false;
        }

        match frame.close_position[i] {
            Some(cp) if bar.is_bullish() => cp > config.spike_bull_close,
            Some(cp) if bar.is_bearish() => cp < config.spike_bear_close,
            _ => false,
        }
    })
}

/// Classify the regime of the last `config.lookback` bars
pub fn classify(bars: &[Bar], config: &ClassifierConfig) -> Result<MarketContext> {
    let window = tail(bars, config.lookback);
    let n = window.len();

    if n < config.min_bars {
        return Err(PriceActionError::InsufficientData {
            required: config.min_bars,
            available: n,
        });
    }

    if config.reject_degenerate && window.iter().all(|b| b.range().is_none()) {
        return Err(PriceActionError::DegenerateSeries { bars: n });
    }

    let frame = IndicatorFrame::compute(window, config.atr_period, config.body_window, config.ma_period);
    let atr = frame.current_atr();

    // Body vs range over the recent bars
    let recent = n.saturating_sub(config.body_window);
    let avg_body = frame.body[recent..].iter().sum::<f64>() / (n - recent) as f64;
    let avg_range = mean_defined(frame.range[recent..].iter().copied()).unwrap_or(0.0);
    let body_to_range = avg_body / (avg_range + config.epsilon);

    // Regression slope normalized by volatility
    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
    let reg_start = n.saturating_sub(config.regression_window);
    let slope_norm = linear_slope(&closes[reg_start..]) / (atr + config.epsilon);

    let has_spike = detect_spike(window, &frame, atr, config);

    let cross_start = n.saturating_sub(config.cross_window);
    let ma_crosses = count_ma_crosses(&closes[cross_start..], &frame.close_ma[cross_start..]);

    let (up_pressure, down_pressure) = directional_pressure(window, config.pressure_window);

    let bias = frame
        .close_ma
        .last()
        .copied()
        .flatten()
        .and_then(|ma| ma_bias(closes[n - 1], ma));

    let trend_like = slope_norm.abs() > config.trend_slope && body_to_range > config.trend_body_ratio;
    let range_like = slope_norm.abs() < config.range_slope && ma_crosses >= config.range_min_crosses;

    let market_type = if has_spike && trend_like {
        MarketType::SpikeChannel
    } else if range_like {
        MarketType::TradingRange
    } else {
        MarketType::Trend
    };

    let direction = match market_type {
        MarketType::TradingRange => Direction::Neutral,
        _ if slope_norm >= 0.0 => Direction::Bull,
        _ => Direction::Bear,
    };

    debug!(
        "Classified {} bars: {} {} (slope_norm={:.3}, body_to_range={:.3}, crosses={}, spike={})",
        n, market_type, direction, slope_norm, body_to_range, ma_crosses, has_spike
    );

    Ok(MarketContext {
        market_type,
        direction,
        metrics: ContextMetrics {
            atr,
            slope_norm,
            body_to_range,
            ma_crosses,
            up_pressure,
            down_pressure,
            has_spike,
            ma_bias: bias,
        },
    })
}
