//! End-to-end scenarios across rating, forecast, edge and backtest

use gridiron::data::{
    HistoricalGame, Market, MarketLine, StandingsBook, StandingsSnapshot, TeamResolver, WeekStandings,
};
use gridiron::features::{TeamStrength, Venue};
use gridiron::model::{confidence, forecast, EngineConfig};
use gridiron::predict::{Matchup, Predictor};
use gridiron::training::backtest::replay_game;
use gridiron::training::calibration::{evaluate_test, grid_search, SplitRatios, WeekSplit};
use gridiron::training::metrics::ats_correct;

fn snapshot(team: &str, games: u32, pf_pg: f64, pa_pg: f64) -> StandingsSnapshot {
    StandingsSnapshot {
        team: team.to_string(),
        wins: games / 2,
        losses: games - games / 2,
        points_for: pf_pg * games as f64,
        points_against: pa_pg * games as f64,
        ..Default::default()
    }
}

fn net_only() -> EngineConfig {
    EngineConfig {
        w_net: 5.0,
        w_momentum: 0.0,
        w_conf: 0.0,
        w_home: 0.0,
        w_off: 0.0,
        w_def: 0.0,
        ..EngineConfig::balanced()
    }
}

#[test]
fn net_only_weights_give_expected_ratings() {
    let week = WeekStandings::new(
        2024,
        8,
        vec![snapshot("Home", 4, 26.0, 18.0), snapshot("Away", 4, 20.0, 24.0), snapshot("Other", 4, 20.0, 24.0)],
    );
    let averages = week.averages();
    assert!((averages.points_for_pg - 22.0).abs() < 1e-9);
    assert!((averages.points_against_pg - 22.0).abs() < 1e-9);
    assert!(averages.net_pg.abs() < 1e-9);

    let config = net_only();
    let home = TeamStrength::calculate(&week.snapshots()[0], Venue::Home, averages, &config);
    let away = TeamStrength::calculate(&week.snapshots()[1], Venue::Away, averages, &config);
    assert!((home.rating - 40.0).abs() < 1e-9);
    assert!((away.rating + 20.0).abs() < 1e-9);

    let f = forecast(&home, &away, &week.snapshots()[0], &week.snapshots()[1], &config);
    assert!((f.raw_spread - 60.0 * config.scaling_factor).abs() < 1e-9);
}

#[test]
fn identical_ratings_floor_confidence_and_split_total() {
    let config = EngineConfig::balanced();
    let week = WeekStandings::new(2024, 3, vec![snapshot("A", 2, 22.0, 22.0), snapshot("B", 2, 22.0, 22.0)]);
    let a = TeamStrength::calculate(&week.snapshots()[0], Venue::Away, week.averages(), &config);
    let b = TeamStrength::calculate(&week.snapshots()[1], Venue::Away, week.averages(), &config);
    assert_eq!(a.rating, b.rating);

    let f = forecast(&a, &b, &week.snapshots()[0], &week.snapshots()[1], &config);
    assert_eq!(f.predicted_spread, 0.0);
    assert_eq!(f.confidence, 40.0);
    assert_eq!(confidence(a.rating, b.rating), 40.0);
    assert_eq!(f.predicted_score.home, f.predicted_score.away);
    assert_eq!(f.predicted_score.home as f64, (f.predicted_total / 2.0).round());
}

#[test]
fn market_closer_than_model_is_not_ats_correct() {
    // model -3, market -7, actual -6: model misses by 3, market by 1
    assert!(!ats_correct(-3.0, -6.0, -7.0));
    // exact prediction beats any other line
    assert!(ats_correct(-6.0, -6.0, -7.0));
}

#[test]
fn replay_converts_bookmaker_line_before_ats() {
    let book: StandingsBook = vec![
        WeekStandings::new(2024, 4, vec![snapshot("Home", 4, 23.0, 22.0), snapshot("Away", 4, 22.0, 23.0)]),
        // game week: must not be read
        WeekStandings::new(2024, 5, vec![snapshot("Home", 5, 10.0, 40.0), snapshot("Away", 5, 40.0, 10.0)]),
    ]
    .into_iter()
    .collect();
    let config = net_only();
    let resolver = TeamResolver::new();

    // home -7 with the books, home wins by 6, model says home by 4.675
    let game = HistoricalGame::new(2024, 5, "Home", "Away", 27, 21).with_market(MarketLine::new(-7.0, 44.0));
    let record = replay_game(&game, &book, &config, &resolver).unwrap();
    assert!((record.predicted_spread - 4.675).abs() < 1e-9);
    assert_eq!(record.actual_spread, 6.0);
    assert_eq!(record.market_spread, Some(7.0));
    assert_eq!(record.ats_correct, Some(false));

    // mirrored: road favourite by 7, road team wins by 6, model says road by 4.675
    let game = HistoricalGame::new(2024, 5, "Away", "Home", 21, 27).with_market(MarketLine::new(7.0, 44.0));
    let record = replay_game(&game, &book, &config, &resolver).unwrap();
    assert!((record.predicted_spread + 4.675).abs() < 1e-9);
    assert_eq!(record.actual_spread, -6.0);
    assert_eq!(record.market_spread, Some(-7.0));
    assert_eq!(record.ats_correct, Some(false));
}

#[test]
fn predictor_handles_line_and_no_line() {
    let week = WeekStandings::new(
        2024,
        5,
        vec![snapshot("Detroit Lions", 5, 31.0, 19.0), snapshot("Chicago Bears", 5, 18.0, 25.0)],
    );
    let predictor = Predictor::new(EngineConfig::balanced()).unwrap();
    let matchup = Matchup::new("DET", "CHI");

    let lined = predictor
        .predict(&week, &matchup, &Market::from(MarketLine::new(-6.5, 44.5)))
        .unwrap();
    assert_eq!(lined.market_spread, Some(6.5));
    assert!(lined.edge.spread_edge.is_some());

    let unlined = predictor.predict(&week, &matchup, &Market::NoLine).unwrap();
    assert!(unlined.edge.spread_edge.is_none());
    assert_eq!(lined.predicted_spread, unlined.predicted_spread);

    let json = serde_json::to_value(&lined).unwrap();
    assert!(json.get("predictedSpread").is_some());
    assert!(json.get("marketSpread").is_some());
    assert!(serde_json::to_value(&unlined).unwrap().get("marketSpread").is_none());
}

#[test]
fn test_set_is_scored_once_after_selection() {
    let book: StandingsBook = (1..=13u8)
        .map(|week| {
            let g = week as u32;
            WeekStandings::new(2022, week, vec![snapshot("Up", g * 2, 28.0, 17.0), snapshot("Down", g * 2, 17.0, 28.0)])
        })
        .collect();
    let games: Vec<HistoricalGame> = (2..=13u8)
        .map(|week| HistoricalGame::new(2022, week, "Up", "Down", 24, 17).with_market(MarketLine::new(-3.0, 41.0)))
        .collect();

    let split = WeekSplit::chronological(games, SplitRatios::default()).unwrap();
    let test_weeks = split.test.weeks().to_vec();
    assert!(split.validation.iter().all(|g| g.week_key() < test_weeks[0]));

    let config = EngineConfig::balanced();
    let selection = grid_search(&split.validation, &book, &config, &[0.2, 0.4, 0.6]).unwrap();
    let result = evaluate_test(split.test, selection.factor, 0.55, &book, &config).unwrap();

    assert_eq!(result.best_factor, selection.factor.value());
    assert_eq!(result.validation_error, selection.factor.validation_error());
    assert_eq!(result.test_weeks, test_weeks);
    assert_eq!(result.test_metrics.ats_games, result.test_metrics.games);
}
