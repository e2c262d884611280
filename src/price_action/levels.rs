//! Key levels: recent swing support/resistance and a measured move

use super::bars::{tail, Bar};
use super::swings::SwingPoints;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLevelConfig {
    /// Bars kept from the end of the series (default: 120)
    pub lookback: usize,
    pub swing_left: usize,
    pub swing_right: usize,
    /// Most recent swings kept per side (default: 3)
    pub max_levels: usize,
}

impl Default for KeyLevelConfig {
    fn default() -> Self {
        Self {
            lookback: 120,
            swing_left: 2,
            swing_right: 2,
            max_levels: 3,
        }
    }
}

/// Last swing leg projected from the last close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasuredMove {
    pub leg: f64,
    pub target_up: f64,
    pub target_down: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    /// Recent swing-high prices, oldest first
    pub swing_resistance: Vec<f64>,
    /// Recent swing-low prices, oldest first
    pub swing_support: Vec<f64>,
    pub measured_move: MeasuredMove,
}

/// Compute key levels over the last `config.lookback` bars.
///
/// Without confirmed swings the window's own high/low stand in, both as the
/// single level on that side and as the measured-move leg.
pub fn compute(bars: &[Bar], config: &KeyLevelConfig) -> KeyLevels {
    let window = tail(bars, config.lookback);
    let Some(last) = window.last() else {
        return KeyLevels {
            swing_resistance: Vec::new(),
            swing_support: Vec::new(),
            measured_move: MeasuredMove { leg: 0.0, target_up: 0.0, target_down: 0.0 },
        };
    };

    let window_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let window_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

    let swings = SwingPoints::detect(window, config.swing_left, config.swing_right);

    let recent = |indices: &[usize], price: fn(&Bar) -> f64, fallback: f64| -> Vec<f64> {
        if indices.is_empty() {
            return vec![fallback];
        }
        indices[indices.len().saturating_sub(config.max_levels)..]
            .iter()
            .map(|&i| price(&window[i]))
            .collect()
    };

    let swing_resistance = recent(&swings.highs, |b: &Bar| b.high, window_high);
    let swing_support = recent(&swings.lows, |b: &Bar| b.low, window_low);

    // The later of the two latest swings anchors the leg; the latest swing on
    // the other side necessarily precedes it.
    let leg = match (swings.last_high(), swings.last_low()) {
        (Some(h), Some(l)) => (window[h].high - window[l].low).abs(),
        _ => window_high - window_low,
    };

    KeyLevels {
        swing_resistance,
        swing_support,
        measured_move: MeasuredMove {
            leg,
            target_up: last.close + leg,
            target_down: last.close - leg,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_action::fixtures;

    #[test]
    fn test_zigzag_levels() {
        let bars = fixtures::zigzag(&[100.0, 110.0, 104.0, 116.0, 108.0, 120.0], 4);
        let levels = compute(&bars, &KeyLevelConfig::default());

        assert_eq!(levels.swing_resistance, vec![110.25, 116.25]);
        assert_eq!(levels.swing_support, vec![103.75, 107.75]);

        let mm = levels.measured_move;
        assert!((mm.leg - 8.5).abs() < 1e-9);
        assert!((mm.target_up - 128.5).abs() < 1e-9);
        assert!((mm.target_down - 111.5).abs() < 1e-9);
    }

    #[test]
    fn test_keeps_most_recent_swings() {
        let bars = fixtures::zigzag(&[100.0, 110.0, 104.0, 112.0, 105.0, 114.0, 106.0, 116.0, 107.0, 118.0], 4);
        let levels = compute(&bars, &KeyLevelConfig::default());

        assert_eq!(levels.swing_resistance, vec![112.25, 114.25, 116.25]);
        assert_eq!(levels.swing_support, vec![104.75, 105.75, 106.75]);
    }

    #[test]
    fn test_monotonic_trend_falls_back_to_extremes() {
        let bars: Vec<Bar> = (0..50)
            .map(|i| {
                let base = 100.0 + i as f64;
                Bar::new(fixtures::day(i), base, base + 1.5, base - 0.5, base + 1.0, 1_000.0)
            })
            .collect();
        let levels = compute(&bars, &KeyLevelConfig::default());

        assert_eq!(levels.swing_resistance, vec![150.5]);
        assert_eq!(levels.swing_support, vec![99.5]);
        for r in &levels.swing_resistance {
            for s in &levels.swing_support {
                assert!(r >= s);
            }
        }
        assert!((levels.measured_move.leg - 51.0).abs() < 1e-9);
        assert!((levels.measured_move.target_up - (150.0 + 51.0)).abs() < 1e-9);
    }

    #[test]
    fn test_lookback_limits_window() {
        let mut bars = fixtures::zigzag(&[100.0, 200.0, 150.0], 10);
        bars.extend(
            fixtures::zigzag(&[150.0, 160.0, 155.0, 165.0], 4)
                .into_iter()
                .enumerate()
                .map(|(i, mut b)| {
                    b.date = fixtures::day(20 + i);
                    b
                }),
        );
        let config = KeyLevelConfig { lookback: 12, ..Default::default() };
        let levels = compute(&bars, &config);
        assert!(levels.swing_resistance.iter().all(|&p| p < 200.0));
    }

    #[test]
    fn test_empty_input() {
        let levels = compute(&[], &KeyLevelConfig::default());
        assert!(levels.swing_resistance.is_empty());
        assert!(levels.swing_support.is_empty());
        assert_eq!(levels.measured_move.leg, 0.0);
    }
}
