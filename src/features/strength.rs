//! Team Strength Rating (TSR)
//!
//! Six weighted components, each `weight × (statistic − reference)`, summed
//! into one rating per team per week. The components are kept alongside the
//! total so a rating can be explained.

use serde::{Deserialize, Serialize};

use crate::data::StandingsSnapshot;
use crate::features::LeagueAverages;
use crate::model::EngineConfig;

/// Where the rated team plays in the game being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

/// Weighted contributions that make up a rating
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthComponents {
    /// Net points per game against the league average
    pub net: f64,
    /// Last-5 win ratio against season win ratio
    pub momentum: f64,
    /// Conference win ratio against 0.50
    pub conference: f64,
    /// Home win ratio minus road win ratio, home team only
    pub home_field: f64,
    /// Points scored per game against the league average
    pub offense: f64,
    /// League average allowed minus own points allowed per game
    pub defense: f64,
}

impl StrengthComponents {
    pub fn total(&self) -> f64 {
        self.net + self.momentum + self.conference + self.home_field + self.offense + self.defense
    }
}

/// One team's rating for one week under one config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStrength {
    pub team: String,
    pub rating: f64,
    pub components: StrengthComponents,
}

impl TeamStrength {
    /// Rate a team from its snapshot.
    ///
    /// A team with no games played rates exactly 0. The home-field term is
    /// only ever applied for [`Venue::Home`], and only when both home and
    /// road samples exist.
    pub fn calculate(
        snapshot: &StandingsSnapshot,
        venue: Venue,
        league: &LeagueAverages,
        config: &EngineConfig,
    ) -> TeamStrength {
        if snapshot.games_played() == 0 {
            return TeamStrength {
                team: snapshot.team.clone(),
                rating: 0.0,
                components: StrengthComponents::default(),
            };
        }

        let home_split = match venue {
            Venue::Home => snapshot.home_road_split().unwrap_or(0.0),
            Venue::Away => 0.0,
        };

        let components = StrengthComponents {
            net: config.w_net * (snapshot.net_per_game() - league.net_pg),
            momentum: config.w_momentum * (snapshot.last5_win_pct() - snapshot.win_pct()),
            conference: config.w_conf * (snapshot.conf_win_pct() - 0.5),
            home_field: config.w_home * home_split,
            offense: config.w_off * (snapshot.points_for_per_game() - league.points_for_pg),
            defense: config.w_def * (league.points_against_pg - snapshot.points_against_per_game()),
        };

        TeamStrength {
            team: snapshot.team.clone(),
            rating: components.total(),
            components,
        }
    }
}
