//! Engine weights and presets
//!
//! An `EngineConfig` is an immutable value passed explicitly into every
//! calculation. Named presets are plain constructors; custom configs must
//! pass [`EngineConfig::validate`] before they are used.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Result};

/// Scalar weights and constants for the rating and forecast pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Net points per game component weight
    pub w_net: f64,
    /// Last-5 momentum component weight
    pub w_momentum: f64,
    /// Conference record component weight
    pub w_conf: f64,
    /// Home-field split component weight
    pub w_home: f64,
    /// Offense component weight
    pub w_off: f64,
    /// Defense component weight
    pub w_def: f64,
    /// Range-checked and kept for config round-tripping only. Standings carry
    /// season totals, so no calculation reads it.
    pub w_recency_total: f64,
    /// Points added to every projected total
    pub total_boost: f64,
    /// Margin widening (>1) or narrowing (<1) for projected scores
    pub volatility: f64,
    /// Spread dampening toward zero
    pub regression_factor: f64,
    /// Rating points to game points conversion
    pub scaling_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::balanced()
    }
}

/// (name, min, max) for every bounded weight
const RANGES: &[(&str, f64, f64)] = &[
    ("w_net", 0.0, 10.0),
    ("w_momentum", 0.0, 10.0),
    ("w_conf", 0.0, 10.0),
    ("w_home", 0.0, 10.0),
    ("w_off", 0.0, 10.0),
    ("w_def", 0.0, 10.0),
    ("w_recency_total", 0.0, 1.0),
    ("total_boost", -10.0, 10.0),
    ("volatility", 0.5, 2.0),
    ("regression_factor", 0.1, 1.0),
    ("scaling_factor", 0.05, 3.0),
];

impl EngineConfig {
    /// Available preset names
    pub const PRESETS: &'static [&'static str] = &["balanced", "conservative", "aggressive"];

    /// Look up a preset by name (case-insensitive)
    pub fn preset(name: &str) -> Option<EngineConfig> {
        match name.trim().to_lowercase().as_str() {
            "balanced" => Some(Self::balanced()),
            "conservative" => Some(Self::conservative()),
            "aggressive" => Some(Self::aggressive()),
            _ => None,
        }
    }

    pub fn balanced() -> Self {
        EngineConfig {
            w_net: 1.0,
            w_momentum: 3.0,
            w_conf: 2.0,
            w_home: 2.5,
            w_off: 0.25,
            w_def: 0.25,
            w_recency_total: 0.3,
            total_boost: 0.0,
            volatility: 1.0,
            regression_factor: 0.85,
            scaling_factor: 0.55,
        }
    }

    /// Smaller weights, tighter spreads and lower totals
    pub fn conservative() -> Self {
        EngineConfig {
            w_net: 0.8,
            w_momentum: 1.5,
            w_conf: 1.0,
            w_home: 1.5,
            w_off: 0.15,
            w_def: 0.15,
            w_recency_total: 0.2,
            total_boost: -1.0,
            volatility: 0.9,
            regression_factor: 0.75,
            scaling_factor: 0.5,
        }
    }

    /// Heavier weights and wider margins
    pub fn aggressive() -> Self {
        EngineConfig {
            w_net: 1.2,
            w_momentum: 4.5,
            w_conf: 3.0,
            w_home: 3.0,
            w_off: 0.4,
            w_def: 0.4,
            w_recency_total: 0.5,
            total_boost: 1.0,
            volatility: 1.15,
            regression_factor: 0.95,
            scaling_factor: 0.65,
        }
    }

    /// Same config with a different scaling factor
    pub fn with_scaling_factor(&self, scaling_factor: f64) -> Self {
        EngineConfig {
            scaling_factor,
            ..self.clone()
        }
    }

    fn values(&self) -> [f64; 11] {
        [
            self.w_net,
            self.w_momentum,
            self.w_conf,
            self.w_home,
            self.w_off,
            self.w_def,
            self.w_recency_total,
            self.total_boost,
            self.volatility,
            self.regression_factor,
            self.scaling_factor,
        ]
    }

    /// Range violations as human-readable messages (empty when valid)
    pub fn validate(&self) -> Vec<String> {
        RANGES
            .iter()
            .zip(self.values())
            .filter_map(|(&(name, min, max), value)| {
                if !value.is_finite() {
                    Some(format!("{} must be a finite number (got {})", name, value))
                } else if value < min || value > max {
                    Some(format!(
                        "{} must be between {} and {} (got {})",
                        name, min, max, value
                    ))
                } else {
                    None
                }
            })
            .collect()
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
}

/// Validate a scaling factor on its own (used for calibration candidates)
pub fn validate_scaling_factor(value: f64) -> Option<String> {
    EngineConfig::balanced().with_scaling_factor(value).validate().pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for name in EngineConfig::PRESETS {
            let config = EngineConfig::preset(name).unwrap();
            assert!(config.validate().is_empty(), "{} preset invalid", name);
        }
        assert_eq!(EngineConfig::preset("Balanced"), Some(EngineConfig::balanced()));
        assert!(EngineConfig::preset("yolo").is_none());
    }

    #[test]
    fn test_validation_collects_every_violation() {
        let config = EngineConfig {
            w_net: -1.0,
            volatility: 3.0,
            scaling_factor: f64::NAN,
            ..EngineConfig::balanced()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("w_net"));
        assert!(errors[1].starts_with("volatility"));
        assert!(errors[2].contains("finite"));

        assert!(matches!(
            config.validated(),
            Err(EngineError::InvalidConfig(list)) if list.len() == 3
        ));
    }

    #[test]
    fn test_partial_json_fills_from_balanced() {
        let config: EngineConfig = serde_json::from_str(r#"{"w_net": 2.0}"#).unwrap();
        assert_eq!(config.w_net, 2.0);
        assert_eq!(config.scaling_factor, EngineConfig::balanced().scaling_factor);
    }

    #[test]
    fn test_scaling_factor_check() {
        assert!(validate_scaling_factor(0.55).is_none());
        assert!(validate_scaling_factor(0.0).is_some());
        assert!(validate_scaling_factor(f64::INFINITY).is_some());
    }
}
