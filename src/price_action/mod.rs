//! Price Action Core - regime classification and setup detection
//!
//! This module contains the analysis components, leaves first:
//! - OHLCV bars and per-bar shape helpers
//! - Indicators (true range, ATR, moving averages)
//! - Swing point detection
//! - Market regime classification
//! - Setup detection
//! - Key levels (swing support/resistance, measured move)
//! - Engine orchestration

pub mod bars;
pub mod indicators;
pub mod swings;
pub mod market_state;
pub mod setups;
pub mod levels;
pub mod engine;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use bars::Bar;
pub use indicators::IndicatorFrame;
pub use swings::{find_swings, SwingPoints};
pub use market_state::{classify, ClassifierConfig, ContextMetrics, Direction, MarketContext, MarketType};
pub use setups::{detect, Confidence, Setup, SetupConfig, SetupType};
pub use levels::{KeyLevelConfig, KeyLevels, MeasuredMove};
pub use engine::{run, Decision, PriceActionEngine, PriceActionResult};
