use thiserror::Error;

/// Errors raised by the price action engine.
///
/// Either one aborts the whole call; no partial result is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceActionError {
    /// Fewer bars than the classifier needs after windowing.
    #[error("insufficient data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Every bar in the window has zero range, so ratios are undefined.
    #[error("degenerate series: all {bars} bars have zero range")]
    DegenerateSeries { bars: usize },
}

pub type Result<T> = std::result::Result<T, PriceActionError>;
