//! Volatility and risk scoring
//!
//! Additive, order-independent 0-100 score. Every factor is checked once and
//! contributes on its own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::Market;

pub const MAX_SCORE: u32 = 100;

/// Game-day weather, all fields optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default)]
    pub wind_mph: Option<f64>,
    #[serde(default)]
    pub precipitation_pct: Option<f64>,
    #[serde(default)]
    pub temperature_f: Option<f64>,
    #[serde(default)]
    pub is_dome: bool,
}

/// Situational context for one matchup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameContext {
    #[serde(default)]
    pub weather: Option<Weather>,
    /// Explicit divisional flag; derived from standings when absent
    #[serde(default)]
    pub is_divisional: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Stable,
    Moderate,
    Volatile,
    HighRisk,
}

impl RiskTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=24 => RiskTier::Stable,
            25..=44 => RiskTier::Moderate,
            45..=69 => RiskTier::Volatile,
            _ => RiskTier::HighRisk,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Stable => "Stable",
            RiskTier::Moderate => "Moderate",
            RiskTier::Volatile => "Volatile",
            RiskTier::HighRisk => "High Risk",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub label: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityScore {
    pub score: u32,
    pub tier: RiskTier,
    pub factors: Vec<RiskFactor>,
}

impl VolatilityScore {
    /// Score a matchup from its context, the model spread and the market
    pub fn score(context: &GameContext, predicted_spread: f64, market: &Market) -> VolatilityScore {
        let mut factors = Vec::new();
        let mut add = |label: &str, points: u32| {
            factors.push(RiskFactor {
                label: label.to_string(),
                points,
            })
        };

        if let Some(weather) = &context.weather {
            match weather.wind_mph {
                Some(wind) if wind > 15.0 => add("high wind", 20),
                Some(wind) if wind > 10.0 => add("wind", 10),
                _ => {}
            }
            if weather.precipitation_pct.map_or(false, |p| p > 50.0) {
                add("precipitation", 15);
            }
            if !weather.is_dome && weather.temperature_f.map_or(false, |t| t <= 32.0) {
                add("freezing", 10);
            }
        }

        let market_margin = market.expected_margin();
        let magnitude = market_margin.unwrap_or(predicted_spread).abs();
        if magnitude > 14.0 {
            add("large spread", 15);
        } else if magnitude > 10.0 {
            add("double-digit spread", 10);
        }

        if let Some(margin) = market_margin {
            let divergence = (predicted_spread - margin).abs();
            if divergence > 7.0 {
                add("model/market divergence", 25);
            } else if divergence > 4.0 {
                add("model/market disagreement", 10);
            }
        }

        if context.is_divisional == Some(true) {
            add("divisional rivalry", 10);
        }

        let score = factors.iter().map(|f| f.points).sum::<u32>().min(MAX_SCORE);
        VolatilityScore {
            score,
            tier: RiskTier::from_score(score),
            factors,
        }
    }
}
