//! Setup Detection
//!
//! Searches the latest bar for price action entries given the regime:
//!
//! Trend / Spike and Channel (with the trend):
//! - H1 / L1: first pullback entry on a strong signal bar
//! - H2 / L2: second entry after earlier strong signal bars
//! - 2EL / 2ES: signal bar after a deeper pullback (approximation of a
//!   two-legged pullback, kept deliberately simple)
//!
//! Trading Range (fade the edges):
//! - FailedBreakout: poke beyond a range bound that closes back inside
//! - RangeFade: reversal bar sitting on a range bound
//!
//! Setups are independent; several may fire on the same bar.

use super::bars::{tail, Bar};
use super::indicators::{current_atr, quantile};
use super::market_state::{Direction, MarketContext, MarketType};
use super::swings::SwingPoints;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pattern tag of a setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetupType {
    H1,
    H2,
    #[serde(rename = "2EL")]
    SecondEntryLong,
    L1,
    L2,
    #[serde(rename = "2ES")]
    SecondEntryShort,
    FailedBreakout,
    RangeFade,
}

impl std::fmt::Display for SetupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupType::H1 => write!(f, "H1"),
            SetupType::H2 => write!(f, "H2"),
            SetupType::SecondEntryLong => write!(f, "2EL"),
            SetupType::L1 => write!(f, "L1"),
            SetupType::L2 => write!(f, "L2"),
            SetupType::SecondEntryShort => write!(f, "2ES"),
            SetupType::FailedBreakout => write!(f, "FailedBreakout"),
            SetupType::RangeFade => write!(f, "RangeFade"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Candidate trade structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(rename = "type")]
    pub setup_type: SetupType,
    pub direction: Direction,
    /// Human-readable entry condition
    pub trigger: String,
    pub entry: Option<f64>,
    pub stop: Option<f64>,
    pub target_1: Option<f64>,
    pub confidence: Confidence,
    pub notes: String,
}

/// Thresholds for setup detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Bars kept from the end of the series (default: 80)
    pub lookback: usize,
    pub atr_period: usize,
    pub swing_left: usize,
    pub swing_right: usize,
    /// Strong bull signal closes above this fraction of its range
    pub strong_bull_close: f64,
    /// Strong bear signal closes below this fraction of its range
    pub strong_bear_close: f64,
    /// Strong signal body must exceed this fraction of its range
    pub signal_body_fraction: f64,
    /// Trailing bars scanned for counter-trend bars (default: 12)
    pub pullback_window: usize,
    /// Counter-trend bars needed for H1/L1
    pub first_entry_min_pullbacks: usize,
    /// Bars before the signal bar scanned for earlier signals (default: 25)
    pub second_entry_window: usize,
    /// Earlier strong signals needed for H2/L2
    pub second_entry_min_signals: usize,
    /// Counter-trend bars needed for 2EL/2ES
    pub two_leg_min_pullbacks: usize,
    pub first_entry_target_atr: f64,
    pub second_entry_target_atr: f64,
    pub two_leg_target_atr: f64,
    /// Quantile of highs taken as the range top
    pub range_upper_quantile: f64,
    /// Quantile of lows taken as the range bottom
    pub range_lower_quantile: f64,
    /// Bound tolerance as a multiple of ATR...
    pub range_tolerance_atr: f64,
    /// ...or as a fraction of range height, whichever is larger
    pub range_tolerance_height: f64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            lookback: 80,
            atr_period: 14,
            swing_left: 2,
            swing_right: 2,
            strong_bull_close: 0.7,
            strong_bear_close: 0.3,
            signal_body_fraction: 0.45,
            pullback_window: 12,
            first_entry_min_pullbacks: 2,
            second_entry_window: 25,
            second_entry_min_signals: 2,
            two_leg_min_pullbacks: 3,
            first_entry_target_atr: 1.5,
            second_entry_target_atr: 2.0,
            two_leg_target_atr: 1.5,
            range_upper_quantile: 0.9,
            range_lower_quantile: 0.1,
            range_tolerance_atr: 0.3,
            range_tolerance_height: 0.05,
        }
    }
}

/// Strong signal bar in `direction`: trend-colored body, close near the
/// extreme and a body that is a good share of the range
pub fn is_strong_signal(bar: &Bar, direction: Direction, config: &SetupConfig) -> bool {
    let (Some(range), Some(cp)) = (bar.range(), bar.close_position()) else {
        return false;
    };
    let solid_body = bar.body() > config.signal_body_fraction * range;

    match direction {
        Direction::Bull => bar.is_bullish() && cp > config.strong_bull_close && solid_body,
        Direction::Bear => bar.is_bearish() && cp < config.strong_bear_close && solid_body,
        Direction::Neutral => false,
    }
}

/// Quantities shared by every check in one call
struct Scan<'a> {
    window: &'a [Bar],
    last: &'a Bar,
    prev: &'a Bar,
    atr: f64,
    swing_high: f64,
    swing_low: f64,
    config: &'a SetupConfig,
}

/// Detect setups on the last `config.lookback` bars.
/// Finding nothing is a normal outcome.
pub fn detect(bars: &[Bar], context: &MarketContext, config: &SetupConfig) -> Vec<Setup> {
    let window = tail(bars, config.lookback);
    let Some(last) = window.last() else {
        return Vec::new();
    };
    let prev = if window.len() >= 2 { &window[window.len() - 2] } else { last };

    let swings = SwingPoints::detect(window, config.swing_left, config.swing_right);
    let swing_high = swings
        .last_high()
        .map(|i| window[i].high)
        .unwrap_or_else(|| window.iter().map(|b| b.high).fold(f64::MIN, f64::max));
    let swing_low = swings
        .last_low()
        .map(|i| window[i].low)
        .unwrap_or_else(|| window.iter().map(|b| b.low).fold(f64::MAX, f64::min));

    let scan = Scan {
        window,
        last,
        prev,
        atr: current_atr(window, config.atr_period),
        swing_high,
        swing_low,
        config,
    };

    let setups = match context.market_type {
        MarketType::Trend | MarketType::SpikeChannel if context.direction.is_directional() => {
            trend_setups(&scan, context.direction)
        }
        MarketType::TradingRange => range_setups(&scan),
        _ => Vec::new(),
    };

    debug!(
        "Setup scan over {} bars ({} {}): {} found",
        window.len(),
        context.market_type,
        context.direction,
        setups.len()
    );

    setups
}

fn trend_setups(scan: &Scan, direction: Direction) -> Vec<Setup> {
    let config = scan.config;
    let last = scan.last;
    let bull = direction == Direction::Bull;

    if !is_strong_signal(last, direction, config) {
        return Vec::new();
    }

    let pullbacks = tail(scan.window, config.pullback_window)
        .iter()
        .filter(|b| if bull { b.is_bearish() } else { b.is_bullish() })
        .count();

    let n = scan.window.len();
    let earlier = &scan.window[n.saturating_sub(1 + config.second_entry_window)..n - 1];
    let prior_signals = earlier
        .iter()
        .filter(|b| is_strong_signal(b, direction, config))
        .count();

    let sign = if bull { 1.0 } else { -1.0 };
    let entry = if bull { last.high } else { last.low };
    let bar_stop = if bull { last.low } else { last.high };
    let target = |mult: f64| entry + sign * mult * scan.atr;

    let (side, extreme) = if bull { ("buy stop above", "high") } else { ("sell stop below", "low") };
    let swing_note = if bull {
        format!("prior swing low {:.2}", scan.swing_low)
    } else {
        format!("prior swing high {:.2}", scan.swing_high)
    };

    let mut setups = Vec::new();

    if pullbacks >= config.first_entry_min_pullbacks {
        // Tighter of the last two bars' opposite extremes
        let stop = if bull {
            last.low.max(scan.prev.low)
        } else {
            last.high.min(scan.prev.high)
        };
        setups.push(Setup {
            setup_type: if bull { SetupType::H1 } else { SetupType::L1 },
            direction,
            trigger: format!("{} signal bar {} {:.2}", side, extreme, entry),
            entry: Some(entry),
            stop: Some(stop),
            target_1: Some(target(config.first_entry_target_atr)),
            confidence: Confidence::Medium,
            notes: format!("first pullback entry after {} counter-trend bars; {}", pullbacks, swing_note),
        });
    }

    if prior_signals >= config.second_entry_min_signals {
        setups.push(Setup {
            setup_type: if bull { SetupType::H2 } else { SetupType::L2 },
            direction,
            trigger: format!("{} signal bar {} {:.2}", side, extreme, entry),
            entry: Some(entry),
            stop: Some(bar_stop),
            target_1: Some(target(config.second_entry_target_atr)),
            confidence: Confidence::Medium,
            notes: format!(
                "second entry: {} earlier strong signal bars in the last {}; {}",
                prior_signals, config.second_entry_window, swing_note
            ),
        });
    }

    if pullbacks >= config.two_leg_min_pullbacks {
        setups.push(Setup {
            setup_type: if bull { SetupType::SecondEntryLong } else { SetupType::SecondEntryShort },
            direction,
            trigger: format!("{} signal bar {} {:.2}", side, extreme, entry),
            entry: Some(entry),
            stop: Some(bar_stop),
            target_1: Some(target(config.two_leg_target_atr)),
            confidence: Confidence::Low,
            notes: format!(
                "approximate two-legged pullback ({} counter-trend bars in the last {}); {}",
                pullbacks, config.pullback_window, swing_note
            ),
        });
    }

    setups
}

fn range_setups(scan: &Scan) -> Vec<Setup> {
    let config = scan.config;
    let last = scan.last;

    let highs: Vec<f64> = scan.window.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = scan.window.iter().map(|b| b.low).collect();
    let (Some(hi), Some(lo)) = (
        quantile(&highs, config.range_upper_quantile),
        quantile(&lows, config.range_lower_quantile),
    ) else {
        return Vec::new();
    };

    let mid = (hi + lo) / 2.0;
    let tolerance = (config.range_tolerance_atr * scan.atr).max(config.range_tolerance_height * (hi - lo));
    let strong_bull = is_strong_signal(last, Direction::Bull, config);
    let strong_bear = is_strong_signal(last, Direction::Bear, config);
    let bounds = format!("range {:.2}-{:.2}, mid {:.2}", lo, hi, mid);

    let mut setups = Vec::new();

    if last.high > hi && last.close < hi && strong_bear {
        setups.push(Setup {
            setup_type: SetupType::FailedBreakout,
            direction: Direction::Bear,
            trigger: format!("sell stop below failed breakout bar low {:.2}", last.low),
            entry: Some(last.low),
            stop: Some(last.high + tolerance),
            target_1: Some(mid),
            confidence: Confidence::Medium,
            notes: format!("breakout above {:.2} closed back inside; {}", hi, bounds),
        });
    }

    if last.low < lo && last.close > lo && strong_bull {
        setups.push(Setup {
            setup_type: SetupType::FailedBreakout,
            direction: Direction::Bull,
            trigger: format!("buy stop above failed breakout bar high {:.2}", last.high),
            entry: Some(last.high),
            stop: Some(last.low - tolerance),
            target_1: Some(mid),
            confidence: Confidence::Medium,
            notes: format!("breakout below {:.2} closed back inside; {}", lo, bounds),
        });
    }

    if (last.close - lo).abs() <= tolerance && strong_bull {
        setups.push(Setup {
            setup_type: SetupType::RangeFade,
            direction: Direction::Bull,
            trigger: format!("buy stop above reversal bar high {:.2} near range bottom", last.high),
            entry: Some(last.high),
            stop: Some(last.low.min(lo) - tolerance),
            target_1: Some(mid),
            confidence: Confidence::Low,
            notes: format!("fade of the range bottom; {}", bounds),
        });
    }

    if (last.close - hi).abs() <= tolerance && strong_bear {
        setups.push(Setup {
            setup_type: SetupType::RangeFade,
            direction: Direction::Bear,
            trigger: format!("sell stop below reversal bar low {:.2} near range top", last.low),
            entry: Some(last.low),
            stop: Some(last.high.max(hi) + tolerance),
            target_1: Some(mid),
            confidence: Confidence::Low,
            notes: format!("fade of the range top; {}", bounds),
        });
    }

    setups
}
