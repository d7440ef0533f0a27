//! Completed games used for backtesting and calibration

use serde::{Deserialize, Serialize};

use crate::data::market::{Market, MarketLine};
use crate::Side;

/// A finished game with its final score and, when known, the closing line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalGame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub season: u16,
    pub week: u8,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketLine>,
}

impl HistoricalGame {
    pub fn new(season: u16, week: u8, home: &str, away: &str, home_score: u32, away_score: u32) -> Self {
        HistoricalGame {
            game_id: None,
            season,
            week,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score,
            away_score,
            market: None,
        }
    }

    pub fn with_market(mut self, line: MarketLine) -> Self {
        self.market = Some(line);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.game_id = Some(id.to_string());
        self
    }

    /// (season, week) ordering key
    pub fn week_key(&self) -> (u16, u8) {
        (self.season, self.week)
    }

    /// Final margin, home minus away
    pub fn actual_spread(&self) -> f64 {
        self.home_score as f64 - self.away_score as f64
    }

    pub fn actual_total(&self) -> f64 {
        (self.home_score + self.away_score) as f64
    }

    /// Winning side, or None for a tie
    pub fn winner(&self) -> Option<Side> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn market(&self) -> Market {
        self.market.clone().into()
    }

    /// Human-readable label for logs
    pub fn label(&self) -> String {
        match &self.game_id {
            Some(id) => format!("{} ({} @ {})", id, self.away_team, self.home_team),
            None => format!(
                "{} wk{} {} @ {}",
                self.season, self.week, self.away_team, self.home_team
            ),
        }
    }
}
