//! Engine configuration
//!
//! Groups the threshold tables of each stage. Every field has a default, so
//! a JSON file only needs the values being tuned:
//!
//! ```json
//! { "classifier": { "range_min_crosses": 6 }, "setups": { "lookback": 100 } }
//! ```

use crate::price_action::levels::KeyLevelConfig;
use crate::price_action::market_state::ClassifierConfig;
use crate::price_action::setups::SetupConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub setups: SetupConfig,
    pub levels: KeyLevelConfig,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON threshold table
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse engine config")
    }

    /// Load a JSON threshold table from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_json_str(&json).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize engine config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_thresholds() {
        let config = EngineConfig::default();

        assert_eq!(config.classifier.lookback, 60);
        assert_eq!(config.classifier.min_bars, 30);
        assert_eq!(config.classifier.trend_slope, 0.25);
        assert_eq!(config.classifier.trend_body_ratio, 0.45);
        assert_eq!(config.classifier.range_slope, 0.18);
        assert_eq!(config.classifier.range_min_crosses, 8);
        assert_eq!(config.classifier.spike_body_mult, 1.6);
        assert_eq!(config.classifier.spike_range_atr_mult, 1.2);
        assert_eq!(config.setups.lookback, 80);
        assert_eq!(config.setups.second_entry_target_atr, 2.0);
        assert_eq!(config.levels.lookback, 120);
        assert_eq!(config.levels.max_levels, 3);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json_str(
            r#"{ "classifier": { "range_min_crosses": 6 }, "levels": { "max_levels": 5 } }"#,
        )
        .unwrap();

        assert_eq!(config.classifier.range_min_crosses, 6);
        assert_eq!(config.classifier.lookback, 60);
        assert_eq!(config.levels.max_levels, 5);
        assert_eq!(config.setups, SetupConfig::default());
    }

    #[test]
    fn test_round_trip_and_errors() {
        let json = EngineConfig::default().to_json_pretty().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), EngineConfig::default());
        assert!(EngineConfig::from_json_str("{ not json").is_err());
        assert!(EngineConfig::from_json_file(Path::new("/nonexistent/pa-config.json")).is_err());
    }
}
