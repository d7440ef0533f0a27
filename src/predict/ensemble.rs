//! Ensemble consensus
//!
//! Independent voters each pick HOME, AWAY or PASS. The consensus side is the
//! majority of active (non-PASS) votes and its strength grades agreement:
//!
//! - LOCK: at least two active voters and all of them agree
//! - LEAN: at least three active voters and two thirds or more agree
//! - UNCERTAIN: anything else

use serde::{Deserialize, Serialize};

use crate::data::StandingsSnapshot;

/// Fixed home-field points in the stat differential voter
pub const STAT_HOME_ADVANTAGE: f64 = 2.0;
/// Stat differential edge needed to vote
pub const STAT_EDGE: f64 = 3.0;
/// Trend score needed to vote
pub const TREND_THRESHOLD: i32 = 10;
/// Share of active votes needed for LEAN
pub const LEAN_AGREEMENT: f64 = 0.66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteSide {
    Home,
    Away,
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoterKind {
    Matrix,
    Trend,
    StatDifferential,
    /// External signal supplied by the caller
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: VoterKind,
    pub side: VoteSide,
    /// Signal strength in the voter's own units (informational)
    pub weight: f64,
    pub reason: String,
}

impl Vote {
    pub fn new(voter: VoterKind, side: VoteSide, weight: f64, reason: impl Into<String>) -> Self {
        Vote {
            voter,
            side,
            weight,
            reason: reason.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.side != VoteSide::Pass
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsensusSide {
    Home,
    Away,
    Split,
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsensusStrength {
    Lock,
    Lean,
    Uncertain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub side: ConsensusSide,
    pub strength: ConsensusStrength,
    /// Share of active votes on the consensus side (0-1)
    pub agreement: f64,
    pub active_voters: usize,
    pub votes: Vec<Vote>,
}

pub struct Ensemble;

impl Ensemble {
    /// Combine votes into a graded consensus
    pub fn tally(votes: &[Vote]) -> Consensus {
        let home = votes.iter().filter(|v| v.side == VoteSide::Home).count();
        let away = votes.iter().filter(|v| v.side == VoteSide::Away).count();
        let active = home + away;

        let side = match home.cmp(&away) {
            _ if active == 0 => ConsensusSide::Pass,
            std::cmp::Ordering::Greater => ConsensusSide::Home,
            std::cmp::Ordering::Less => ConsensusSide::Away,
            std::cmp::Ordering::Equal => ConsensusSide::Split,
        };

        let agreement = if active == 0 {
            0.0
        } else {
            home.max(away) as f64 / active as f64
        };

        let strength = if active >= 2 && (home == active || away == active) {
            ConsensusStrength::Lock
        } else if active >= 3 && agreement >= LEAN_AGREEMENT {
            ConsensusStrength::Lean
        } else {
            ConsensusStrength::Uncertain
        };

        Consensus {
            side,
            strength,
            agreement,
            active_voters: active,
            votes: votes.to_vec(),
        }
    }
}

/// Model voter: backs the side the model likes relative to the market, or
/// the projected winner when there is no line
pub fn matrix_vote(predicted_spread: f64, confidence: f64, market_margin: Option<f64>) -> Vote {
    let (diff, reason) = match market_margin {
        Some(margin) => (
            predicted_spread - margin,
            format!("model {:+.1} vs market {:+.1}", predicted_spread, margin),
        ),
        None => (
            predicted_spread,
            format!("model {:+.1}, no line", predicted_spread),
        ),
    };
    let side = if diff > 0.0 {
        VoteSide::Home
    } else if diff < 0.0 {
        VoteSide::Away
    } else {
        VoteSide::Pass
    };
    Vote::new(
        VoterKind::Matrix,
        side,
        confidence,
        format!("{} ({:.0}% confidence)", reason, confidence),
    )
}

/// Situational trend voter. Needs a market line to know who is favoured.
///
/// Positive scores lean HOME: home underdogs +15, road favourites laying three
/// or more +10 against them, divisional underdogs +10 toward the dog.
pub fn trend_vote(market_margin: Option<f64>, is_divisional: bool) -> Vote {
    let margin = match market_margin {
        Some(margin) => margin,
        None => return Vote::new(VoterKind::Trend, VoteSide::Pass, 0.0, "no market line"),
    };

    let mut score = 0;
    let mut reasons = Vec::new();

    if margin < 0.0 {
        score += 15;
        reasons.push("home underdog");
        if margin <= -3.0 {
            score += 10;
            reasons.push("road favourite laying 3+");
        }
    }

    if is_divisional && margin != 0.0 {
        if margin < 0.0 {
            score += 10;
        } else {
            score -= 10;
        }
        reasons.push("divisional underdog");
    }

    let side = if score >= TREND_THRESHOLD {
        VoteSide::Home
    } else if score <= -TREND_THRESHOLD {
        VoteSide::Away
    } else {
        VoteSide::Pass
    };
    let reason = if reasons.is_empty() {
        "no situational trend".to_string()
    } else {
        reasons.join(", ")
    };
    Vote::new(VoterKind::Trend, side, score as f64, reason)
}

/// Raw point differential voter.
///
/// Per-game net difference plus a fixed home edge, compared against
/// the active spread (the market margin when present, otherwise the model's).
pub fn stat_vote(home: &StandingsSnapshot, away: &StandingsSnapshot, active_spread: f64) -> Vote {
    let expected = home.net_per_game() - away.net_per_game() + STAT_HOME_ADVANTAGE;
    let edge = expected - active_spread;
    let side = if edge > STAT_EDGE {
        VoteSide::Home
    } else if edge < -STAT_EDGE {
        VoteSide::Away
    } else {
        VoteSide::Pass
    };
    Vote::new(
        VoterKind::StatDifferential,
        side,
        edge,
        format!("differential {:+.1} vs spread {:+.1}", expected, active_spread),
    )
}
