//! Weekly standings snapshots
//!
//! Cumulative per-team counts as captured after a given week. Snapshots are
//! produced externally and are never mutated once loaded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::resolver::TeamResolver;
use crate::features::LeagueAverages;
use crate::{EngineError, Result};

/// Season-to-date standings for one team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsSnapshot {
    pub team: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub wins: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub losses: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub ties: u32,
    #[serde(default, deserialize_with = "lenient::points")]
    pub points_for: f64,
    #[serde(default, deserialize_with = "lenient::points")]
    pub points_against: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub home_wins: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub home_losses: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub road_wins: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub road_losses: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub conf_wins: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub conf_losses: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub last5_wins: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub last5_losses: u32,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub division: String,
}

impl StandingsSnapshot {
    /// Empty snapshot for a team that has not played yet
    pub fn new(team: &str) -> Self {
        StandingsSnapshot {
            team: team.to_string(),
            ..Default::default()
        }
    }

    /// Coerce non-finite or negative point totals to zero
    pub fn sanitized(mut self) -> Self {
        self.points_for = lenient::finite_or_zero(self.points_for);
        self.points_against = lenient::finite_or_zero(self.points_against);
        self
    }

    /// Summed in `u64` so absurd but finite counts cannot overflow
    pub fn games_played(&self) -> u64 {
        self.wins as u64 + self.losses as u64 + self.ties as u64
    }

    /// Season win ratio with ties as half a win (0.5 before any games)
    pub fn win_pct(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            0.5
        } else {
            (self.wins as f64 + 0.5 * self.ties as f64) / games as f64
        }
    }

    /// Last-5 win ratio, falling back to the season ratio with no recent sample
    pub fn last5_win_pct(&self) -> f64 {
        let games = self.last5_wins as u64 + self.last5_losses as u64;
        if games == 0 {
            self.win_pct()
        } else {
            self.last5_wins as f64 / games as f64
        }
    }

    /// Conference win ratio (0.5 before any conference games)
    pub fn conf_win_pct(&self) -> f64 {
        let games = self.conf_wins as u64 + self.conf_losses as u64;
        if games == 0 {
            0.5
        } else {
            self.conf_wins as f64 / games as f64
        }
    }

    /// Home win ratio minus road win ratio. None unless both samples exist.
    pub fn home_road_split(&self) -> Option<f64> {
        let home_games = self.home_wins as u64 + self.home_losses as u64;
        let road_games = self.road_wins as u64 + self.road_losses as u64;
        if home_games == 0 || road_games == 0 {
            return None;
        }
        let home = self.home_wins as f64 / home_games as f64;
        let road = self.road_wins as f64 / road_games as f64;
        Some(home - road)
    }

    /// Average points scored per game
    pub fn points_for_per_game(&self) -> f64 {
        match self.games_played() {
            0 => 0.0,
            games => self.points_for / games as f64,
        }
    }

    /// Average points conceded per game
    pub fn points_against_per_game(&self) -> f64 {
        match self.games_played() {
            0 => 0.0,
            games => self.points_against / games as f64,
        }
    }

    /// Average point differential per game
    pub fn net_per_game(&self) -> f64 {
        self.points_for_per_game() - self.points_against_per_game()
    }

    /// Same conference and same non-empty division
    pub fn same_division(&self, other: &StandingsSnapshot) -> bool {
        !self.division.is_empty()
            && self.division.eq_ignore_ascii_case(&other.division)
            && self.conference.eq_ignore_ascii_case(&other.conference)
    }
}

/// Every team's snapshot for one season/week.
///
/// League averages are computed once at construction; a new week means a new
/// value rather than an update.
#[derive(Debug, Clone)]
pub struct WeekStandings {
    season: u16,
    week: u8,
    snapshots: Vec<StandingsSnapshot>,
    averages: LeagueAverages,
}

impl WeekStandings {
    pub fn new(season: u16, week: u8, snapshots: Vec<StandingsSnapshot>) -> Self {
        let snapshots: Vec<StandingsSnapshot> =
            snapshots.into_iter().map(StandingsSnapshot::sanitized).collect();
        let averages = LeagueAverages::from_snapshots(&snapshots);
        WeekStandings {
            season,
            week,
            snapshots,
            averages,
        }
    }

    pub fn season(&self) -> u16 {
        self.season
    }

    pub fn week(&self) -> u8 {
        self.week
    }

    pub fn snapshots(&self) -> &[StandingsSnapshot] {
        &self.snapshots
    }

    pub fn averages(&self) -> &LeagueAverages {
        &self.averages
    }

    /// Resolve a team's snapshot by name
    pub fn find(&self, name: &str, resolver: &TeamResolver) -> Result<&StandingsSnapshot> {
        resolver
            .resolve(name, &self.snapshots, |s| s.team.as_str())
            .ok_or_else(|| EngineError::MissingData {
                team: name.to_string(),
                season: self.season,
                week: self.week,
            })
    }
}

/// Standings for many weeks, ordered by (season, week)
#[derive(Debug, Clone, Default)]
pub struct StandingsBook {
    weeks: BTreeMap<(u16, u8), WeekStandings>,
}

impl StandingsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a week, replacing any existing snapshot set for the same key
    pub fn insert(&mut self, standings: WeekStandings) {
        self.weeks
            .insert((standings.season, standings.week), standings);
    }

    pub fn get(&self, season: u16, week: u8) -> Option<&WeekStandings> {
        self.weeks.get(&(season, week))
    }

    /// Most recent standings strictly before `week` in the same season.
    ///
    /// Never returns the game week itself or anything later.
    pub fn prior_to(&self, season: u16, week: u8) -> Option<&WeekStandings> {
        self.weeks
            .range((season, 0)..(season, week))
            .next_back()
            .map(|(_, standings)| standings)
    }

    /// Latest standings available for a season
    pub fn latest(&self, season: u16) -> Option<&WeekStandings> {
        self.weeks
            .range((season, 0)..=(season, u8::MAX))
            .next_back()
            .map(|(_, standings)| standings)
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeekStandings> {
        self.weeks.values()
    }
}

impl FromIterator<WeekStandings> for StandingsBook {
    fn from_iter<I: IntoIterator<Item = WeekStandings>>(iter: I) -> Self {
        let mut book = StandingsBook::new();
        for standings in iter {
            book.insert(standings);
        }
        book
    }
}

/// Tolerant numeric decoding: missing, null, non-numeric and non-finite
/// values become zero instead of failing the whole file.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn finite_or_zero(value: f64) -> f64 {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    fn number(value: Option<Value>) -> f64 {
        let raw = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        raw.map(finite_or_zero).unwrap_or(0.0)
    }

    pub fn points<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(Option::<Value>::deserialize(deserializer)?))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = number(Option::<Value>::deserialize(deserializer)?);
        Ok(value.round().min(u32::MAX as f64) as u32)
    }
}
