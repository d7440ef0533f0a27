//! League-wide scoring averages for one week

use serde::{Deserialize, Serialize};

use crate::data::StandingsSnapshot;

/// Points per game assumed before any game has been played
pub const NEUTRAL_POINTS_PER_GAME: f64 = 21.5;

/// League per-game scoring context.
///
/// Derived from a week's snapshots and recomputed whenever a new week is
/// loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueAverages {
    #[serde(rename = "avgPFpg")]
    pub points_for_pg: f64,
    #[serde(rename = "avgPApg")]
    pub points_against_pg: f64,
    #[serde(rename = "avgNetPG")]
    pub net_pg: f64,
    /// Team-games the averages were computed from
    #[serde(rename = "gamesPlayed")]
    pub games_played: u64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        LeagueAverages::new(NEUTRAL_POINTS_PER_GAME, NEUTRAL_POINTS_PER_GAME)
    }
}

impl LeagueAverages {
    pub fn new(points_for_pg: f64, points_against_pg: f64) -> Self {
        LeagueAverages {
            points_for_pg,
            points_against_pg,
            net_pg: points_for_pg - points_against_pg,
            games_played: 0,
        }
    }

    /// Sum every team's totals and divide by summed games played.
    ///
    /// Falls back to the neutral default when nobody has played yet.
    pub fn from_snapshots(snapshots: &[StandingsSnapshot]) -> Self {
        let games: u64 = snapshots.iter().map(|s| s.games_played()).sum();
        if games == 0 {
            return Self::default();
        }

        let points_for: f64 = snapshots.iter().map(|s| s.points_for).sum();
        let points_against: f64 = snapshots.iter().map(|s| s.points_against).sum();

        LeagueAverages {
            games_played: games,
            ..LeagueAverages::new(points_for / games as f64, points_against / games as f64)
        }
    }

    /// True when computed from no games at all
    pub fn is_neutral(&self) -> bool {
        self.games_played == 0
    }
}
