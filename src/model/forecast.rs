//! Spread, total, score and confidence projection
//!
//! Pure functions of two ratings, the two snapshots and an engine config.

use serde::{Deserialize, Serialize};

use crate::data::StandingsSnapshot;
use crate::features::TeamStrength;
use crate::model::EngineConfig;
use crate::ScoreLine;

pub const MIN_TOTAL: f64 = 30.0;
pub const MAX_TOTAL: f64 = 70.0;
pub const MIN_TEAM_SCORE: f64 = 3.0;
pub const MAX_TEAM_SCORE: f64 = 60.0;

pub const MIN_CONFIDENCE: f64 = 40.0;
pub const MAX_CONFIDENCE: f64 = 95.0;
/// Confidence points per rating point of separation
pub const CONFIDENCE_PER_POINT: f64 = 4.5;

/// Game projection from two team ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// Scaled rating differential before dampening
    pub raw_spread: f64,
    /// Home minus away margin
    pub predicted_spread: f64,
    pub predicted_total: f64,
    pub predicted_score: ScoreLine,
    pub confidence: f64,
}

/// Rating differential converted to points and dampened toward zero.
///
/// Returns (raw, dampened).
pub fn project_spread(home_rating: f64, away_rating: f64, config: &EngineConfig) -> (f64, f64) {
    let raw = (home_rating - away_rating) * config.scaling_factor;
    (raw, raw * config.regression_factor)
}

/// Cross-blend each side's scoring with the opponent's points allowed
pub fn project_total(home: &StandingsSnapshot, away: &StandingsSnapshot, config: &EngineConfig) -> f64 {
    let home_view = (home.points_for_per_game() + away.points_against_per_game()) / 2.0;
    let away_view = (away.points_for_per_game() + home.points_against_per_game()) / 2.0;
    let total = home_view + away_view + config.total_boost;
    if total.is_finite() {
        total.clamp(MIN_TOTAL, MAX_TOTAL)
    } else {
        MIN_TOTAL
    }
}

/// Split a total around the spread, widened or narrowed by the volatility
/// setting, as whole points within [3, 60]
pub fn project_score(spread: f64, total: f64, config: &EngineConfig) -> ScoreLine {
    let center = total / 2.0;
    let adjustment = (spread / 2.0) * (config.volatility - 1.0);
    let home = center + spread / 2.0 + adjustment;
    let away = center - spread / 2.0 - adjustment;
    ScoreLine::new(whole_points(home), whole_points(away))
}

fn whole_points(value: f64) -> u32 {
    if !value.is_finite() {
        return MIN_TEAM_SCORE as u32;
    }
    value.round().clamp(MIN_TEAM_SCORE, MAX_TEAM_SCORE) as u32
}

/// Confidence from the rating gap, always within [40, 95].
///
/// No separation at all sits on the 40 floor; any separation starts from 50
/// and climbs by 4.5 per rating point.
pub fn confidence(home_rating: f64, away_rating: f64) -> f64 {
    let gap = (home_rating - away_rating).abs();
    if !gap.is_finite() {
        return if gap.is_nan() { MIN_CONFIDENCE } else { MAX_CONFIDENCE };
    }
    if gap < f64::EPSILON {
        return MIN_CONFIDENCE;
    }
    (50.0 + gap * CONFIDENCE_PER_POINT).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Full projection for one matchup
pub fn forecast(
    home: &TeamStrength,
    away: &TeamStrength,
    home_snapshot: &StandingsSnapshot,
    away_snapshot: &StandingsSnapshot,
    config: &EngineConfig,
) -> Forecast {
    let (raw_spread, predicted_spread) = project_spread(home.rating, away.rating, config);
    let predicted_total = project_total(home_snapshot, away_snapshot, config);
    let predicted_score = project_score(predicted_spread, predicted_total, config);

    Forecast {
        raw_spread,
        predicted_spread,
        predicted_total,
        predicted_score,
        confidence: confidence(home.rating, away.rating),
    }
}
