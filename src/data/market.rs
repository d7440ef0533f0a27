//! Market lines
//!
//! Lines follow bookmaker convention: a home spread of -7.0 means the home
//! team is favoured by seven. The engine works in margin convention
//! (home minus away), so callers go through [`MarketLine::expected_margin`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadLine {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalLine {
    pub line: f64,
}

/// American moneyline odds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Moneyline {
    pub home: Option<f64>,
    pub away: Option<f64>,
}

/// Closing or current line from one bookmaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketLine {
    pub spread: SpreadLine,
    pub total: TotalLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moneyline: Option<Moneyline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MarketLine {
    /// Line from a home spread (bookmaker convention) and a total
    pub fn new(home_spread: f64, total: f64) -> Self {
        MarketLine {
            spread: SpreadLine {
                home: home_spread,
                away: -home_spread,
            },
            total: TotalLine { line: total },
            moneyline: None,
            bookmaker: None,
            timestamp: None,
        }
    }

    pub fn with_bookmaker(mut self, bookmaker: &str) -> Self {
        self.bookmaker = Some(bookmaker.to_string());
        self
    }

    /// Home-minus-away margin the market expects
    pub fn expected_margin(&self) -> f64 {
        -self.spread.home
    }

    pub fn total_line(&self) -> f64 {
        self.total.line
    }

    pub fn home_is_favorite(&self) -> bool {
        self.spread.home < 0.0
    }

    pub fn away_is_favorite(&self) -> bool {
        self.spread.home > 0.0
    }
}

/// A game either has a market line or it doesn't
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Market {
    Line(MarketLine),
    #[default]
    NoLine,
}

impl Market {
    pub fn line(&self) -> Option<&MarketLine> {
        match self {
            Market::Line(line) => Some(line),
            Market::NoLine => None,
        }
    }

    /// Market margin in home-minus-away convention
    pub fn expected_margin(&self) -> Option<f64> {
        self.line().map(MarketLine::expected_margin)
    }

    pub fn total_line(&self) -> Option<f64> {
        self.line().map(MarketLine::total_line)
    }
}

impl From<Option<MarketLine>> for Market {
    fn from(line: Option<MarketLine>) -> Self {
        match line {
            Some(line) => Market::Line(line),
            None => Market::NoLine,
        }
    }
}

impl From<MarketLine> for Market {
    fn from(line: MarketLine) -> Self {
        Market::Line(line)
    }
}
