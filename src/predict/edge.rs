//! Edge detection against market lines
//!
//! Spread and total edges are measured independently in points; the larger
//! one picks the bet type and its size picks the tier. Without a line the
//! recommendation falls back to confidence bands.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::Market;
use crate::model::Forecast;

/// Edge in points for a strong bet
pub const STRONG_EDGE: f64 = 4.0;
/// Edge in points for a value bet
pub const GOOD_EDGE: f64 = 2.5;
/// Smallest edge worth reporting
pub const SLIGHT_EDGE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBet,
    ValueBet,
    SlightEdge,
    Wait,
    Avoid,
}

impl Recommendation {
    /// Band by confidence alone (no market to compare against)
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 75.0 {
            Recommendation::StrongBet
        } else if confidence >= 65.0 {
            Recommendation::ValueBet
        } else if confidence >= 55.0 {
            Recommendation::Wait
        } else {
            Recommendation::Avoid
        }
    }

    /// Tier for an edge in points
    pub fn from_edge(edge: f64) -> Self {
        if edge >= STRONG_EDGE {
            Recommendation::StrongBet
        } else if edge >= GOOD_EDGE {
            Recommendation::ValueBet
        } else if edge >= SLIGHT_EDGE {
            Recommendation::SlightEdge
        } else {
            Recommendation::Avoid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBet => "STRONG BET",
            Recommendation::ValueBet => "Value Bet",
            Recommendation::SlightEdge => "Slight Edge",
            Recommendation::Wait => "Wait",
            Recommendation::Avoid => "Avoid",
        }
    }

    /// Whether this tier suggests placing a bet
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            Recommendation::StrongBet | Recommendation::ValueBet | Recommendation::SlightEdge
        )
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetType {
    Spread,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pick {
    Home,
    Away,
    Over,
    Under,
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pick::Home => "HOME",
            Pick::Away => "AWAY",
            Pick::Over => "OVER",
            Pick::Under => "UNDER",
        };
        f.write_str(s)
    }
}

/// The bet an edge points to, at the market's number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetSelection {
    pub bet_type: BetType,
    pub pick: Pick,
    /// Market number for the pick (bookmaker convention for spreads)
    pub line: f64,
    pub edge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeReport {
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_edge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_edge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<BetSelection>,
}

/// Compare a forecast to the market
pub fn detect_edge(forecast: &Forecast, confidence: f64, market: &Market) -> EdgeReport {
    let line = match market {
        Market::Line(line) => line,
        Market::NoLine => {
            return EdgeReport {
                recommendation: Recommendation::from_confidence(confidence),
                spread_edge: None,
                total_edge: None,
                selection: None,
            }
        }
    };

    let market_margin = line.expected_margin();
    let spread_edge = (forecast.predicted_spread - market_margin).abs();
    let total_edge = (forecast.predicted_total - line.total_line()).abs();

    let selection = if spread_edge >= total_edge {
        let (pick, number) = if forecast.predicted_spread > market_margin {
            (Pick::Home, line.spread.home)
        } else {
            (Pick::Away, line.spread.away)
        };
        BetSelection {
            bet_type: BetType::Spread,
            pick,
            line: number,
            edge: spread_edge,
        }
    } else {
        let pick = if forecast.predicted_total > line.total_line() {
            Pick::Over
        } else {
            Pick::Under
        };
        BetSelection {
            bet_type: BetType::Total,
            pick,
            line: line.total_line(),
            edge: total_edge,
        }
    };

    let recommendation = Recommendation::from_edge(selection.edge);
    EdgeReport {
        recommendation,
        spread_edge: Some(spread_edge),
        total_edge: Some(total_edge),
        selection: recommendation.is_actionable().then_some(selection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketLine;
    use crate::ScoreLine;

    fn forecast(spread: f64, total: f64) -> Forecast {
        Forecast {
            raw_spread: spread,
            predicted_spread: spread,
            predicted_total: total,
            predicted_score: ScoreLine::new(24, 20),
            confidence: 60.0,
        }
    }

    #[test]
    fn test_no_line_bands_by_confidence() {
        let f = forecast(3.0, 44.0);
        let cases = [
            (80.0, Recommendation::StrongBet),
            (75.0, Recommendation::StrongBet),
            (66.0, Recommendation::ValueBet),
            (55.0, Recommendation::Wait),
            (54.9, Recommendation::Avoid),
        ];
        for (confidence, expected) in cases {
            let report = detect_edge(&f, confidence, &Market::NoLine);
            assert_eq!(report.recommendation, expected);
            assert!(report.selection.is_none());
            assert!(report.spread_edge.is_none());
        }
    }

    #[test]
    fn test_spread_edge_backs_home_at_market_number() {
        // market: home -3 (margin +3); model says home by 8
        let market = Market::from(MarketLine::new(-3.0, 44.0));
        let report = detect_edge(&forecast(8.0, 45.0), 60.0, &market);
        assert_eq!(report.recommendation, Recommendation::StrongBet);
        let selection = report.selection.unwrap();
        assert_eq!(selection.bet_type, BetType::Spread);
        assert_eq!(selection.pick, Pick::Home);
        assert_eq!(selection.line, -3.0);
        assert!((selection.edge - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_spread_edge_backs_away() {
        // market: home -7 (margin +7); model only home by 4
        let market = Market::from(MarketLine::new(-7.0, 44.0));
        let report = detect_edge(&forecast(4.0, 44.5), 60.0, &market);
        assert_eq!(report.recommendation, Recommendation::ValueBet);
        let selection = report.selection.unwrap();
        assert_eq!(selection.pick, Pick::Away);
        assert_eq!(selection.line, 7.0);
    }

    #[test]
    fn test_larger_total_edge_wins() {
        let market = Market::from(MarketLine::new(-3.0, 41.0));
        let report = detect_edge(&forecast(4.5, 42.8), 60.0, &market);
        assert_eq!(report.recommendation, Recommendation::SlightEdge);
        let selection = report.selection.unwrap();
        assert_eq!(selection.bet_type, BetType::Total);
        assert_eq!(selection.pick, Pick::Over);

        let report = detect_edge(&forecast(3.0, 35.0), 60.0, &market);
        let selection = report.selection.unwrap();
        assert_eq!(selection.pick, Pick::Under);
        assert_eq!(report.recommendation, Recommendation::StrongBet);
    }

    #[test]
    fn test_slight_edge_boundary() {
        let market = Market::from(MarketLine::new(-3.0, 44.0));
        let report = detect_edge(&forecast(4.49, 44.0), 90.0, &market);
        assert_eq!(report.recommendation, Recommendation::Avoid);
        assert!(report.selection.is_none());

        let report = detect_edge(&forecast(4.5, 44.0), 90.0, &market);
        assert_eq!(report.recommendation, Recommendation::SlightEdge);
        assert_eq!(report.selection.unwrap().pick, Pick::Home);

        // 1.2 points is noise, not an edge
        let report = detect_edge(&forecast(4.2, 44.0), 90.0, &market);
        assert_eq!(report.recommendation, Recommendation::Avoid);
    }

    #[test]
    fn test_tiny_edges_avoid() {
        let market = Market::from(MarketLine::new(-3.0, 44.0));
        let report = detect_edge(&forecast(3.5, 44.5), 90.0, &market);
        assert_eq!(report.recommendation, Recommendation::Avoid);
        assert!(report.selection.is_none());
        assert_eq!(report.spread_edge, Some(0.5));
    }
}
