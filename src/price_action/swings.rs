//! Swing point detection
//!
//! A swing high is a value strictly above every value in the `left` positions
//! before it and the `right` positions after it. Swing lows mirror this.

use super::bars::Bar;

/// Default bars compared on each side of a candidate swing
pub const DEFAULT_SWING_WINDOW: usize = 2;

/// Swing indices for one value series, ascending
pub fn find_swings(values: &[f64], left: usize, right: usize) -> (Vec<usize>, Vec<usize>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    let n = values.len();
    if n < left + right + 1 {
        return (highs, lows);
    }

    for i in left..n - right {
        let v = values[i];
        let neighbours = values[i - left..i].iter().chain(&values[i + 1..=i + right]);

        let mut is_high = true;
        let mut is_low = true;
        for &other in neighbours {
            is_high &= v > other;
            is_low &= v < other;
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            highs.push(i);
        }
        if is_low {
            lows.push(i);
        }
    }

    (highs, lows)
}

/// Swing highs taken from bar highs and swing lows from bar lows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwingPoints {
    pub highs: Vec<usize>,
    pub lows: Vec<usize>,
}

impl SwingPoints {
    pub fn detect(bars: &[Bar], left: usize, right: usize) -> Self {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

        Self {
            highs: find_swings(&highs, left, right).0,
            lows: find_swings(&lows, left, right).1,
        }
    }

    pub fn last_high(&self) -> Option<usize> {
        self.highs.last().copied()
    }

    pub fn last_low(&self) -> Option<usize> {
        self.lows.last().copied()
    }
}
