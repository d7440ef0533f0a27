//! Full game predictions
//!
//! Resolves both teams in a week's standings, rates them and runs every
//! downstream stage (edge, ensemble, volatility, staking) on the result.

use serde::{Deserialize, Serialize};

use crate::data::{Market, StandingsSnapshot, TeamResolver, WeekStandings};
use crate::features::{TeamStrength, Venue};
use crate::model::{forecast, EngineConfig, Forecast};
use crate::predict::edge::detect_edge;
use crate::predict::ensemble::{matrix_vote, stat_vote, trend_vote, Ensemble, Vote};
use crate::predict::staking::StakingConfig;
use crate::predict::volatility::{GameContext, VolatilityScore};
use crate::{GamePrediction, Result};

/// A game to predict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub context: GameContext,
}

impl Matchup {
    pub fn new(home: &str, away: &str) -> Self {
        Matchup {
            home: home.to_string(),
            away: away.to_string(),
            context: GameContext::default(),
        }
    }

    pub fn with_context(mut self, context: GameContext) -> Self {
        self.context = context;
        self
    }
}

/// Both ratings and the forecast for one matchup
#[derive(Debug, Clone)]
pub struct RatedGame<'a> {
    pub home_snapshot: &'a StandingsSnapshot,
    pub away_snapshot: &'a StandingsSnapshot,
    pub home: TeamStrength,
    pub away: TeamStrength,
    pub forecast: Forecast,
}

/// Rate and forecast one matchup from a week's standings
pub fn rate_matchup<'a>(
    standings: &'a WeekStandings,
    home: &str,
    away: &str,
    config: &EngineConfig,
    resolver: &TeamResolver,
) -> Result<RatedGame<'a>> {
    let home_snapshot = standings.find(home, resolver)?;
    let away_snapshot = standings.find(away, resolver)?;
    let averages = standings.averages();

    let home_rating = TeamStrength::calculate(home_snapshot, Venue::Home, averages, config);
    let away_rating = TeamStrength::calculate(away_snapshot, Venue::Away, averages, config);
    let forecast = forecast(&home_rating, &away_rating, home_snapshot, away_snapshot, config);

    Ok(RatedGame {
        home_snapshot,
        away_snapshot,
        home: home_rating,
        away: away_rating,
        forecast,
    })
}

/// Predictor for full game predictions under one validated config
pub struct Predictor {
    config: EngineConfig,
    staking: StakingConfig,
    resolver: TeamResolver,
    advisory: Option<Vote>,
}

impl Predictor {
    /// Create a predictor. Fails if the config has range violations.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Predictor {
            config: config.validated()?,
            staking: StakingConfig::default(),
            resolver: TeamResolver::nfl(),
            advisory: None,
        })
    }

    pub fn with_staking(mut self, staking: StakingConfig) -> Self {
        self.staking = staking;
        self
    }

    pub fn with_resolver(mut self, resolver: TeamResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Extra vote from an external source, added to every ensemble
    pub fn with_advisory(mut self, vote: Vote) -> Self {
        self.advisory = Some(vote);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Predict a single game
    pub fn predict(
        &self,
        standings: &WeekStandings,
        matchup: &Matchup,
        market: &Market,
    ) -> Result<GamePrediction> {
        let rated = rate_matchup(
            standings,
            &matchup.home,
            &matchup.away,
            &self.config,
            &self.resolver,
        )?;
        let forecast = &rated.forecast;

        let is_divisional = matchup
            .context
            .is_divisional
            .unwrap_or_else(|| rated.home_snapshot.same_division(rated.away_snapshot));
        let context = GameContext {
            is_divisional: Some(is_divisional),
            ..matchup.context.clone()
        };

        let edge = detect_edge(forecast, forecast.confidence, market);
        let market_margin = market.expected_margin();

        let mut votes = vec![
            matrix_vote(forecast.predicted_spread, forecast.confidence, market_margin),
            trend_vote(market_margin, is_divisional),
            stat_vote(
                rated.home_snapshot,
                rated.away_snapshot,
                market_margin.unwrap_or(forecast.predicted_spread),
            ),
        ];
        if let Some(advisory) = &self.advisory {
            votes.push(advisory.clone());
        }
        let ensemble = Ensemble::tally(&votes);

        let volatility = VolatilityScore::score(&context, forecast.predicted_spread, market);
        let staking = self.staking.size(forecast.confidence);

        log::debug!(
            "{} {:.2} vs {} {:.2}: spread {:+.1}, total {:.1}, {}",
            rated.home.team,
            rated.home.rating,
            rated.away.team,
            rated.away.rating,
            forecast.predicted_spread,
            forecast.predicted_total,
            edge.recommendation
        );

        Ok(GamePrediction {
            season: standings.season(),
            week: standings.week(),
            home_team: rated.home_snapshot.team.clone(),
            away_team: rated.away_snapshot.team.clone(),
            predicted_spread: forecast.predicted_spread,
            predicted_total: forecast.predicted_total,
            predicted_score: forecast.predicted_score,
            confidence: forecast.confidence,
            market_spread: market_margin,
            market_total: market.total_line(),
            recommendation: edge.recommendation,
            edge,
            ensemble: Some(ensemble),
            volatility: Some(volatility),
            staking: Some(staking),
            home_rating: rated.home,
            away_rating: rated.away,
        })
    }

    /// Predict several games; each result stands alone
    pub fn predict_batch(
        &self,
        standings: &WeekStandings,
        games: &[(Matchup, Market)],
    ) -> Vec<Result<GamePrediction>> {
        games
            .iter()
            .map(|(matchup, market)| self.predict(standings, matchup, market))
            .collect()
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &GamePrediction) -> String {
    let market = match (pred.market_spread, pred.market_total) {
        (Some(spread), Some(total)) => format!("{:+.1} / {:.1}", spread, total),
        _ => "no line".to_string(),
    };
    let pick = match &pred.edge.selection {
        Some(sel) => format!("{:?} {} {:+.1} (edge {:.1})", sel.bet_type, sel.pick, sel.line, sel.edge),
        None => "-".to_string(),
    };
    let ensemble = pred
        .ensemble
        .as_ref()
        .map(|c| format!("{:?} {:?} ({}/{} active)", c.side, c.strength, c.active_voters, c.votes.len()))
        .unwrap_or_else(|| "-".to_string());
    let risk = pred
        .volatility
        .as_ref()
        .map(|v| format!("{} ({})", v.tier, v.score))
        .unwrap_or_else(|| "-".to_string());
    let stake = pred
        .staking
        .as_ref()
        .map(|s| format!("{:.1}u {}", s.units, s.label))
        .unwrap_or_else(|| "-".to_string());

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}  (season {}, week {})
├─────────────────────────────────────────────────┤
│  TSR:              {:.2} / {:.2}
│  Predicted spread: {} by {:.1}
│  Predicted total:  {:.1}
│  Predicted score:  {} {} - {} {}
│  Confidence:       {:.0}%
│  Market:           {}
│  Recommendation:   {}
│  Pick:             {}
│  Ensemble:         {}
│  Volatility:       {}
│  Stake:            {}
└─────────────────────────────────────────────────┘
"#,
        pred.home_team,
        pred.away_team,
        pred.season,
        pred.week,
        pred.home_rating.rating,
        pred.away_rating.rating,
        pred.winner_name(),
        pred.predicted_spread.abs(),
        pred.predicted_total,
        pred.home_team,
        pred.predicted_score.home,
        pred.away_team,
        pred.predicted_score.away,
        pred.confidence,
        market,
        pred.recommendation,
        pick,
        ensemble,
        risk,
        stake
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketLine;
    use crate::predict::edge::Recommendation;
    use crate::EngineError;

    fn team(name: &str, division: &str, wins: u32, losses: u32, pf: f64, pa: f64) -> StandingsSnapshot {
        StandingsSnapshot {
            team: name.to_string(),
            wins,
            losses,
            points_for: pf,
            points_against: pa,
            home_wins: wins / 2,
            home_losses: losses / 2,
            road_wins: wins - wins / 2,
            road_losses: losses - losses / 2,
            conf_wins: wins / 2,
            conf_losses: losses / 2,
            last5_wins: wins.min(3),
            last5_losses: losses.min(2),
            conference: "AFC".to_string(),
            division: division.to_string(),
            ..Default::default()
        }
    }

    fn week() -> WeekStandings {
        WeekStandings::new(
            2024,
            6,
            vec![
                team("Kansas City Chiefs", "West", 5, 0, 140.0, 90.0),
                team("Las Vegas Raiders", "West", 2, 3, 95.0, 130.0),
                team("Buffalo Bills", "East", 4, 1, 150.0, 100.0),
            ],
        )
    }

    #[test]
    fn test_predict_full_pipeline() {
        let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
        let market = Market::from(MarketLine::new(-9.5, 45.5));
        let pred = predictor
            .predict(&week(), &Matchup::new("KC", "Raiders"), &market)
            .unwrap();

        assert_eq!(pred.home_team, "Kansas City Chiefs");
        assert_eq!(pred.away_team, "Las Vegas Raiders");
        assert!(pred.predicted_spread > 0.0);
        assert_eq!(pred.winner_name(), "Kansas City Chiefs");
        assert_eq!(pred.market_spread, Some(9.5));
        assert_eq!(pred.away_rating.components.home_field, 0.0);
        assert!(pred.ensemble.is_some());
        // same division is derived from the snapshots
        let volatility = pred.volatility.unwrap();
        assert!(volatility.factors.iter().any(|f| f.label == "divisional rivalry"));
    }

    #[test]
    fn test_no_line_degrades_to_confidence_band() {
        let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
        let pred = predictor
            .predict(&week(), &Matchup::new("Buffalo Bills", "Las Vegas Raiders"), &Market::NoLine)
            .unwrap();
        assert_eq!(pred.market_spread, None);
        assert_eq!(pred.recommendation, Recommendation::from_confidence(pred.confidence));
        assert!(pred.edge.selection.is_none());
    }

    #[test]
    fn test_unknown_team_is_missing_data() {
        let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
        let result = predictor.predict(&week(), &Matchup::new("Green Bay Packers", "KC"), &Market::NoLine);
        match result {
            Err(EngineError::MissingData { team, season, week }) => {
                assert_eq!(team, "Green Bay Packers");
                assert_eq!((season, week), (2024, 6));
            }
            other => panic!("expected MissingData, got {:?}", other.map(|p| p.home_team)),
        }
    }

    #[test]
    fn test_invalid_config_blocks_predictor() {
        let config = EngineConfig {
            scaling_factor: 10.0,
            ..EngineConfig::balanced()
        };
        assert!(matches!(Predictor::new(config), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
        let games = vec![
            (Matchup::new("KC", "BUF"), Market::NoLine),
            (Matchup::new("Nowhere", "BUF"), Market::NoLine),
        ];
        let results = predictor.predict_batch(&week(), &games);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_format_prediction_mentions_teams() {
        let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
        let pred = predictor
            .predict(&week(), &Matchup::new("KC", "LV"), &Market::from(MarketLine::new(-3.0, 44.0)))
            .unwrap();
        let text = format_prediction(&pred);
        assert!(text.contains("Kansas City Chiefs"));
        assert!(text.contains("Recommendation"));
    }
}
