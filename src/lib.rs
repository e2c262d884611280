// Library crate - price action analysis engine plus the glue the CLI uses

pub mod config;
pub mod error;
pub mod loader;
pub mod price_action;
pub mod report;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{PriceActionError, Result};
pub use price_action::{
    Bar, Confidence, Direction, KeyLevels, MarketContext, MarketType, PriceActionEngine,
    PriceActionResult, Setup, SetupType,
};
