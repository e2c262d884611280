//! Price Action Engine
//!
//! Runs classification, setup detection and key levels over one bar series
//! and assembles a single result value. Calls share no state, so separate
//! instruments can be analyzed in parallel.

use super::bars::Bar;
use super::levels::{self, KeyLevels};
use super::market_state::{classify, Direction, MarketContext, MarketType};
use super::setups::{self, Setup};
use crate::config::EngineConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const INVALIDATION_BULL: &str = "close below prior swing low invalidates the setup";
pub const INVALIDATION_BEAR: &str = "close above prior swing high invalidates the setup";
pub const INVALIDATION_RANGE: &str =
    "two or more strong trend bars on a breakout should cancel range-fade bias";

/// Everything the engine derives from one bar series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceActionResult {
    pub market_type: MarketType,
    pub direction: Direction,
    pub context: MarketContext,
    pub key_levels: KeyLevels,
    pub setups: Vec<Setup>,
    pub invalidations: Vec<String>,
}

/// Whether the result is actionable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allow_trade: bool,
    pub reason: String,
}

impl PriceActionResult {
    /// Trade only when at least one setup was found
    pub fn decision(&self) -> Decision {
        if self.setups.is_empty() {
            Decision {
                allow_trade: false,
                reason: "no reliable price action structure found; for observation only".to_string(),
            }
        } else {
            let tags: Vec<String> = self
                .setups
                .iter()
                .map(|s| format!("{} {}", s.setup_type, s.direction))
                .collect();
            Decision {
                allow_trade: true,
                reason: format!("{} {} with setups: {}", self.market_type, self.direction, tags.join(", ")),
            }
        }
    }
}

/// Structural conditions under which the regime read no longer holds
pub fn invalidations(context: &MarketContext) -> Vec<String> {
    let text = match (context.market_type, context.direction) {
        (MarketType::TradingRange, _) => INVALIDATION_RANGE,
        (_, Direction::Bull) => INVALIDATION_BULL,
        (_, Direction::Bear) => INVALIDATION_BEAR,
        (_, Direction::Neutral) => return Vec::new(),
    };
    vec![text.to_string()]
}

/// Stateless engine holding only its thresholds
#[derive(Debug, Clone, Default)]
pub struct PriceActionEngine {
    config: EngineConfig,
}

impl PriceActionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a bar series, oldest bar first.
    ///
    /// Fails fast with the classifier's error; nothing partial is returned.
    pub fn run(&self, bars: &[Bar]) -> Result<PriceActionResult> {
        let context = classify(bars, &self.config.classifier)?;
        let setups = setups::detect(bars, &context, &self.config.setups);
        let key_levels = levels::compute(bars, &self.config.levels);
        let invalidations = invalidations(&context);

        debug!(
            "Engine run: {} bars -> {} {}, {} setups",
            bars.len(),
            context.market_type,
            context.direction,
            setups.len()
        );

        Ok(PriceActionResult {
            market_type: context.market_type,
            direction: context.direction,
            context,
            key_levels,
            setups,
            invalidations,
        })
    }
}

/// Run with the default thresholds
pub fn run(bars: &[Bar]) -> Result<PriceActionResult> {
    PriceActionEngine::default().run(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriceActionError;
    use crate::price_action::fixtures;
    use crate::price_action::setups::SetupType;

    #[test]
    fn test_bull_trend_result() {
        let bars = fixtures::uptrend_with_pullbacks(58);
        let result = run(&bars).unwrap();

        assert_eq!(result.market_type, MarketType::Trend);
        assert_eq!(result.direction, Direction::Bull);
        assert_eq!(result.context.market_type, result.market_type);
        assert_eq!(result.invalidations, vec![INVALIDATION_BULL.to_string()]);
        assert_eq!(result.setups.len(), 2);

        let decision = result.decision();
        assert!(decision.allow_trade);
        assert!(decision.reason.contains("H1 Bull"));
    }

    #[test]
    fn test_bear_trend_invalidation() {
        let bars = fixtures::mirror(&fixtures::uptrend_with_pullbacks(60), 400.0);
        let result = run(&bars).unwrap();
        assert_eq!(result.invalidations, vec![INVALIDATION_BEAR.to_string()]);
    }

    #[test]
    fn test_range_result() {
        let bars = fixtures::failed_breakout_high();
        let result = run(&bars).unwrap();

        assert_eq!(result.market_type, MarketType::TradingRange);
        assert_eq!(result.direction, Direction::Neutral);
        assert_eq!(result.invalidations, vec![INVALIDATION_RANGE.to_string()]);
        assert!(result
            .setups
            .iter()
            .any(|s| s.setup_type == SetupType::FailedBreakout && s.direction == Direction::Bear));
    }

    #[test]
    fn test_no_setups_decision() {
        let result = run(&fixtures::sideways(60)).unwrap();
        let decision = result.decision();
        assert!(!decision.allow_trade);
        assert!(decision.reason.contains("observation only"));
    }

    #[test]
    fn test_insufficient_data_propagates() {
        let err = run(&fixtures::sideways(20)).unwrap_err();
        assert!(matches!(
            err,
            PriceActionError::InsufficientData { required: 30, available: 20 }
        ));
    }

    #[test]
    fn test_run_is_deterministic() {
        for seed in 0..10 {
            let bars = fixtures::random_walk(seed, 150);
            let snapshot = bars.clone();

            let first = serde_json::to_string(&run(&bars).unwrap()).unwrap();
            let second = serde_json::to_string(&run(&bars).unwrap()).unwrap();
            assert_eq!(first, second);
            // Input untouched
            assert_eq!(bars, snapshot);
        }
    }

    #[test]
    fn test_custom_config_is_used() {
        let mut config = EngineConfig::default();
        config.classifier.min_bars = 10;
        config.classifier.lookback = 20;
        let engine = PriceActionEngine::new(config);

        let result = engine.run(&fixtures::uptrend_with_pullbacks(20)).unwrap();
        assert_eq!(result.direction, Direction::Bull);
        assert_eq!(engine.config().classifier.min_bars, 10);
    }

    #[test]
    fn test_result_field_names() {
        let result = run(&fixtures::failed_breakout_high()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in ["market_type", "direction", "context", "key_levels", "setups", "invalidations"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["market_type"], "TradingRange");
        assert_eq!(json["direction"], "Neutral");
        assert!(json["context"]["metrics"]["ma_crosses"].is_u64());
        assert!(json["key_levels"]["measured_move"]["leg"].is_f64());
        assert_eq!(json["setups"][0]["type"], "FailedBreakout");
    }
}
