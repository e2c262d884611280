//! Per-bar and rolling-window indicators
//!
//! All series are position-aligned with the input bars. Rolling statistics
//! are `None` until their window is full and never default to zero.

use super::bars::Bar;

/// True range per bar. The first bar has no previous close, so its true
/// range is its own high-low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let hl = bar.high - bar.low;
        let tr = match prev_close {
            Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
            None => hl,
        };
        out.push(tr);
        prev_close = Some(bar.close);
    }

    out
}

/// Simple rolling mean; `None` for the first `period - 1` positions
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

/// Average true range over `period` bars
pub fn atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range(bars), period)
}

/// ATR at the last bar, falling back to the last true range while the
/// rolling window is still filling. Zero for an empty series.
pub fn current_atr(bars: &[Bar], period: usize) -> f64 {
    let tr = true_range(bars);
    let atr = rolling_mean(&tr, period);
    match atr.last() {
        Some(Some(value)) => *value,
        _ => tr.last().copied().unwrap_or(0.0),
    }
}

/// Simple moving average of closes
pub fn sma(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling_mean(&closes, period)
}

/// Percent deviation of close from a moving average
pub fn ma_bias(close: f64, ma: f64) -> Option<f64> {
    if ma == 0.0 || !ma.is_finite() {
        return None;
    }
    Some((close / ma - 1.0) * 100.0)
}

/// Mean of the defined values only; `None` when nothing is defined
pub fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Quantile with linear interpolation between closest ranks
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Least-squares slope of `values` against their index
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    sxy / sxx
}

/// Position-aligned indicator series for one bar window
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub true_range: Vec<f64>,
    pub atr: Vec<Option<f64>>,
    pub body: Vec<f64>,
    pub range: Vec<Option<f64>>,
    pub close_position: Vec<Option<f64>>,
    /// Rolling mean of body size
    pub body_ma: Vec<Option<f64>>,
    /// Rolling mean of close
    pub close_ma: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn compute(bars: &[Bar], atr_period: usize, body_period: usize, ma_period: usize) -> Self {
        let true_range = true_range(bars);
        let atr = rolling_mean(&true_range, atr_period);
        let body: Vec<f64> = bars.iter().map(Bar::body).collect();
        let body_ma = rolling_mean(&body, body_period);

        Self {
            atr,
            true_range,
            range: bars.iter().map(Bar::range).collect(),
            close_position: bars.iter().map(Bar::close_position).collect(),
            body_ma,
            body,
            close_ma: sma(bars, ma_period),
        }
    }

    /// Last defined ATR, else the last true range
    pub fn current_atr(&self) -> f64 {
        match self.atr.last() {
            Some(Some(value)) => *value,
            _ => self.true_range.last().copied().unwrap_or(0.0),
        }
    }
}
