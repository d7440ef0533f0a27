//! Fractional Kelly stake sizing
//!
//! One unit is one percent of bankroll.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{EngineError, Result};

pub const MAX_UNITS: f64 = 5.0;
/// Stakes below this many units are noise and round to zero
pub const MIN_UNITS: f64 = 0.25;

/// Payout odds and Kelly safety multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingConfig {
    /// Decimal odds (1.91 is standard -110 pricing)
    pub decimal_odds: f64,
    /// Fraction of full Kelly to stake
    pub kelly_fraction: f64,
}

impl Default for StakingConfig {
    fn default() -> Self {
        StakingConfig {
            decimal_odds: 1.91,
            kelly_fraction: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StakeLabel {
    Pass,
    Conservative,
    Standard,
    Aggressive,
}

impl StakeLabel {
    pub fn from_units(units: f64) -> Self {
        if units <= 0.0 {
            StakeLabel::Pass
        } else if units >= 3.0 {
            StakeLabel::Aggressive
        } else if units <= 0.5 {
            StakeLabel::Conservative
        } else {
            StakeLabel::Standard
        }
    }
}

impl fmt::Display for StakeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StakeLabel::Pass => "Pass",
            StakeLabel::Conservative => "Conservative",
            StakeLabel::Standard => "Standard",
            StakeLabel::Aggressive => "Aggressive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecommendation {
    pub win_probability: f64,
    pub full_kelly: f64,
    /// Percent of bankroll after the safety fraction
    pub stake_pct: f64,
    pub units: f64,
    pub label: StakeLabel,
    pub note: String,
}

impl StakingConfig {
    /// Every range violation, empty when the config is usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.decimal_odds.is_finite() || self.decimal_odds <= 1.0 {
            errors.push(format!(
                "decimal_odds must be a finite number above 1 (got {})",
                self.decimal_odds
            ));
        }
        if !self.kelly_fraction.is_finite()
            || self.kelly_fraction <= 0.0
            || self.kelly_fraction > 1.0
        {
            errors.push(format!(
                "kelly_fraction must be in (0, 1] (got {})",
                self.kelly_fraction
            ));
        }
        errors
    }

    /// Return the config unchanged if valid, otherwise every violation
    pub fn validated(self) -> Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(EngineError::InvalidConfig(errors))
        }
    }

    /// Size a stake from a 0-100 confidence
    pub fn size(&self, confidence: f64) -> StakeRecommendation {
        let p = (confidence / 100.0).clamp(0.0, 1.0);
        let q = 1.0 - p;
        let b = self.decimal_odds - 1.0;

        let full_kelly = if b > 0.0 && p.is_finite() {
            (b * p - q) / b
        } else {
            0.0
        };

        if full_kelly <= 0.0 {
            return StakeRecommendation {
                win_probability: p,
                full_kelly,
                stake_pct: 0.0,
                units: 0.0,
                label: StakeLabel::Pass,
                note: "negative edge: do not bet".to_string(),
            };
        }

        let stake_pct = full_kelly * self.kelly_fraction * 100.0;
        let mut units = (stake_pct.clamp(0.0, MAX_UNITS) * 10.0).round() / 10.0;
        if units < MIN_UNITS {
            units = 0.0;
        }

        let label = StakeLabel::from_units(units);
        let note = match label {
            StakeLabel::Pass => "edge too small to stake".to_string(),
            _ => format!(
                "{:.1}u at {:.0}% Kelly ({:.2}% of bankroll)",
                units,
                self.kelly_fraction * 100.0,
                stake_pct
            ),
        };

        StakeRecommendation {
            win_probability: p,
            full_kelly,
            stake_pct,
            units,
            label,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edge_is_zero() {
        let staking = StakingConfig::default();
        for confidence in [0.0, 40.0, 50.0, 52.0] {
            let stake = staking.size(confidence);
            assert_eq!(stake.units, 0.0);
            assert_eq!(stake.label, StakeLabel::Pass);
        }
        assert!(staking.size(50.0).note.contains("do not bet"));
    }

    #[test]
    fn test_labels_by_size() {
        let staking = StakingConfig::default();
        assert_eq!(staking.size(53.0).label, StakeLabel::Conservative);
        assert_eq!(staking.size(53.0).units, 0.3);
        assert_eq!(staking.size(55.0).label, StakeLabel::Standard);
        assert_eq!(staking.size(55.0).units, 1.4);
        assert_eq!(staking.size(60.0).label, StakeLabel::Aggressive);
        assert_eq!(staking.size(95.0).units, MAX_UNITS);
    }

    #[test]
    fn test_validate_rejects_bad_staking() {
        assert!(StakingConfig::default().validate().is_empty());

        let nan: StakingConfig = toml::from_str("kelly_fraction = nan").unwrap();
        let errors = nan.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("kelly_fraction"));

        for fraction in [0.0, -0.25, 1.5] {
            let staking = StakingConfig {
                kelly_fraction: fraction,
                ..Default::default()
            };
            assert_eq!(staking.validate().len(), 1, "fraction {}", fraction);
        }

        let full = StakingConfig {
            kelly_fraction: 1.0,
            ..Default::default()
        };
        assert!(full.validate().is_empty());

        let evens = StakingConfig {
            decimal_odds: 1.0,
            kelly_fraction: f64::INFINITY,
        };
        assert!(matches!(
            evens.validated(),
            Err(EngineError::InvalidConfig(errors)) if errors.len() == 2
        ));
    }

    #[test]
    fn test_units_never_decrease_with_probability() {
        let staking = StakingConfig::default();
        let mut previous = 0.0;
        for step in 0..=1000 {
            let units = staking.size(step as f64 * 0.1).units;
            assert!(units >= previous, "units fell at confidence {}", step as f64 * 0.1);
            assert!((0.0..=MAX_UNITS).contains(&units));
            previous = units;
        }
    }
}
