//! Synthetic bar series for tests

use super::bars::Bar;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64)
}

fn bar_from(i: usize, open: f64, close: f64, wick: f64) -> Bar {
    Bar::new(day(i), open, open.max(close) + wick, open.min(close) - wick, close, 1_000.0)
}

/// Rising closes (+1.0 per bar) with a 0.5 pullback bar every 5th bar
/// (indices 4, 9, 14, ...). Each bar opens at the previous close.
pub fn uptrend_with_pullbacks(n: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut prev_close = 99.0;

    for i in 0..n {
        let close = if i == 0 {
            100.0
        } else if i % 5 == 4 {
            prev_close - 0.5
        } else {
            prev_close + 1.0
        };
        bars.push(bar_from(i, prev_close, close, 0.2));
        prev_close = close;
    }

    bars
}

/// Reflect every price around `axis`: bull bars become bear bars, highs
/// become lows.
pub fn mirror(bars: &[Bar], axis: f64) -> Vec<Bar> {
    bars.iter()
        .map(|b| Bar::new(b.date, axis - b.open, axis - b.low, axis - b.high, axis - b.close, b.volume))
        .collect()
}

/// Alternating 100 -> 103 bull bars and 103 -> 100 bear bars, every bar
/// spanning 99.5..103.5.
pub fn sideways(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let (open, close) = if i % 2 == 0 { (100.0, 103.0) } else { (103.0, 100.0) };
            Bar::new(day(i), open, 103.5, 99.5, close, 1_000.0)
        })
        .collect()
}

/// Sixty-bar range whose last bar pokes to 106 and closes back at 100.5 as
/// a strong bear bar.
pub fn failed_breakout_high() -> Vec<Bar> {
    let mut bars = sideways(59);
    bars.push(Bar::new(day(59), 104.0, 106.0, 100.2, 100.5, 1_500.0));
    bars
}

/// Sixty-bar range ending on a small strong bull bar just above the
/// lower bound.
pub fn fade_from_low() -> Vec<Bar> {
    let mut bars = sideways(59);
    bars.push(Bar::new(day(59), 99.6, 100.4, 99.5, 100.3, 800.0));
    bars
}

/// Closes step linearly between consecutive pivots, `bars_per_leg` bars per
/// leg. The bar closing on a pivot carries the unique extreme around it.
pub fn zigzag(pivots: &[f64], bars_per_leg: usize) -> Vec<Bar> {
    let mut bars = Vec::new();
    let Some(&first) = pivots.first() else {
        return bars;
    };
    let mut prev_close = first;

    for leg in pivots.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        for k in 0..bars_per_leg {
            let close = from + (to - from) * (k + 1) as f64 / bars_per_leg as f64;
            let open = prev_close + (close - prev_close) * 0.25;
            bars.push(bar_from(bars.len(), open, close, 0.25));
            prev_close = close;
        }
    }

    bars
}

/// Seeded random walk around 100
pub fn random_walk(seed: u64, n: usize) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prev_close: f64 = 100.0;

    (0..n)
        .map(|i| {
            let close: f64 = (prev_close + rng.gen_range(-1.0..1.0)).max(1.0);
            let open = prev_close;
            let high = open.max(close) + rng.gen_range(0.0..0.5);
            let low = (open.min(close) - rng.gen_range(0.0..0.5)).max(0.5);
            prev_close = close;
            Bar::new(day(i), open, high, low, close, rng.gen_range(100.0..10_000.0))
        })
        .collect()
}
