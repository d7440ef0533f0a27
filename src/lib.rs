//! Gridiron prediction engine
//!
//! Turns weekly standings snapshots into team strength ratings, game forecasts,
//! market edges and stake sizes, and calibrates its scaling constant against
//! completed games.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::features::TeamStrength;
use crate::model::EngineConfig;
use crate::predict::edge::{EdgeReport, Recommendation};
use crate::predict::ensemble::Consensus;
use crate::predict::staking::{StakeRecommendation, StakingConfig};
use crate::predict::volatility::VolatilityScore;
use crate::training::calibration::CalibrationSettings;

/// Which side of a matchup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// Side favoured by a home-minus-away margin. Zero leans home.
    pub fn from_margin(margin: f64) -> Side {
        if margin >= 0.0 {
            Side::Home
        } else {
            Side::Away
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "HOME"),
            Side::Away => write!(f, "AWAY"),
        }
    }
}

/// Whole-point final or projected score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreLine {
    pub home: u32,
    pub away: u32,
}

impl ScoreLine {
    pub fn new(home: u32, away: u32) -> Self {
        ScoreLine { home, away }
    }

    /// Home minus away
    pub fn margin(&self) -> i64 {
        self.home as i64 - self.away as i64
    }

    pub fn total(&self) -> u32 {
        self.home + self.away
    }
}

/// Full forecast for one game under one engine config.
///
/// Spreads are in margin convention: positive means the home team is
/// expected to win by that many points. `market_spread` is the closing line
/// converted to the same convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePrediction {
    pub season: u16,
    pub week: u8,
    pub home_team: String,
    pub away_team: String,
    pub home_rating: TeamStrength,
    pub away_rating: TeamStrength,
    pub predicted_spread: f64,
    pub predicted_total: f64,
    pub predicted_score: ScoreLine,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_spread: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_total: Option<f64>,
    pub recommendation: Recommendation,
    pub edge: EdgeReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<Consensus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<VolatilityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking: Option<StakeRecommendation>,
}

impl GamePrediction {
    /// Predicted straight-up winner. A zero spread leans home.
    pub fn predicted_winner(&self) -> Side {
        Side::from_margin(self.predicted_spread)
    }

    /// Name of the predicted winner
    pub fn winner_name(&self) -> &str {
        match self.predicted_winner() {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }
}

/// Engine-wide errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No standings for {team} (season {season}, week {week})")]
    MissingData { team: String, season: u16, week: u8 },

    #[error("Invalid engine config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Application configuration loaded from gridiron.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default)]
    pub calibration: CalibrationSettings,
    #[serde(default)]
    pub data: DataConfig,
}

/// Which engine weights to use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Named preset, used unless `custom` is set
    pub preset: String,
    /// Fully custom weights (validated before use)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<EngineConfig>,
}

impl Default for EngineSection {
    fn default() -> Self {
        EngineSection {
            preset: "balanced".to_string(),
            custom: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub standings_path: String,
    pub games_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            standings_path: "data/standings".to_string(),
            games_path: "data/games.json".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse config text and reject an unusable staking section
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.staking.clone().validated()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the active engine config, validating custom weights
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let config = match &self.engine.custom {
            Some(custom) => custom.clone(),
            None => EngineConfig::preset(&self.engine.preset).ok_or_else(|| {
                EngineError::Config(format!(
                    "Unknown preset '{}'. Available: {}",
                    self.engine.preset,
                    EngineConfig::PRESETS.join(", ")
                ))
            })?,
        };
        config.validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_resolves_balanced() {
        let config = Config::default();
        let engine = config.engine_config().unwrap();
        assert_eq!(engine, EngineConfig::balanced());
    }

    #[test]
    fn test_unknown_preset_is_config_error() {
        let mut config = Config::default();
        config.engine.preset = "moonshot".to_string();
        assert!(matches!(config.engine_config(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_invalid_custom_weights_rejected() {
        let mut config = Config::default();
        let mut custom = EngineConfig::balanced();
        custom.regression_factor = 1.7;
        config.engine.custom = Some(custom);

        match config.engine_config() {
            Err(EngineError::InvalidConfig(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("regression_factor"));
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.engine.preset, "balanced");
        assert_eq!(parsed.calibration.candidates, config.calibration.candidates);
    }

    #[test]
    fn test_invalid_staking_rejected_on_load() {
        let text = "[staking]\ndecimal_odds = 1.91\nkelly_fraction = nan\n";
        match Config::from_toml(text) {
            Err(EngineError::InvalidConfig(errors)) => {
                assert!(errors[0].contains("kelly_fraction"));
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }

        let text = "[staking]\ndecimal_odds = 2.0\nkelly_fraction = 0.5\n";
        let config = Config::from_toml(text).unwrap();
        assert_eq!(config.staking.kelly_fraction, 0.5);
    }

    #[test]
    fn test_scoreline_margin() {
        let score = ScoreLine::new(17, 24);
        assert_eq!(score.margin(), -7);
        assert_eq!(score.total(), 41);
    }
}
