//! Historical replay
//!
//! Every game is re-predicted from the standings captured before its week,
//! never from the game week itself or anything later. Games whose standings
//! cannot be resolved are skipped and reported, not fatal.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::{HistoricalGame, StandingsBook, TeamResolver};
use crate::model::EngineConfig;
use crate::predict::inference::rate_matchup;
use crate::training::metrics::{
    ats_correct, cover_result, AtsRecord, BacktestRecord, Metrics, MetricsSummary, SeasonStats,
    WeeklyStats,
};
use crate::{EngineError, Result, ScoreLine, Side};

/// Market-edge thresholds reported by default
pub const DEFAULT_THRESHOLDS: &[f64] = &[0.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

/// A game left out of an evaluation and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGame {
    pub game: String,
    pub reason: String,
}

/// Records and metrics for one pass over a set of games
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub records: Vec<BacktestRecord>,
    pub skipped: Vec<SkippedGame>,
    pub metrics: Metrics,
}

/// Re-predict one completed game from the prior week's standings
pub fn replay_game(
    game: &HistoricalGame,
    book: &StandingsBook,
    config: &EngineConfig,
    resolver: &TeamResolver,
) -> Result<BacktestRecord> {
    let standings = book
        .prior_to(game.season, game.week)
        .ok_or_else(|| EngineError::MissingData {
            team: game.home_team.clone(),
            season: game.season,
            week: game.week,
        })?;

    let rated = rate_matchup(standings, &game.home_team, &game.away_team, config, resolver)?;
    let forecast = rated.forecast;

    let actual_spread = game.actual_spread();
    let actual_total = game.actual_total();
    let market = game.market();
    let market_spread = market.expected_margin();

    let winner_correct = match game.winner() {
        Some(side) => side == Side::from_margin(forecast.predicted_spread),
        None => false,
    };

    log::debug!(
        "{}: predicted {:+.1}, actual {:+.1} (standings week {})",
        game.label(),
        forecast.predicted_spread,
        actual_spread,
        standings.week()
    );

    Ok(BacktestRecord {
        season: game.season,
        week: game.week,
        home_team: game.home_team.clone(),
        away_team: game.away_team.clone(),
        home_rating: rated.home.rating,
        away_rating: rated.away.rating,
        predicted_spread: forecast.predicted_spread,
        predicted_total: forecast.predicted_total,
        predicted_score: forecast.predicted_score,
        confidence: forecast.confidence,
        actual_spread,
        actual_total,
        actual_score: ScoreLine::new(game.home_score, game.away_score),
        market_spread,
        market_total: market.total_line(),
        spread_error: (forecast.predicted_spread - actual_spread).abs(),
        total_error: (forecast.predicted_total - actual_total).abs(),
        winner_correct,
        ats_correct: market_spread.map(|m| ats_correct(forecast.predicted_spread, actual_spread, m)),
        cover: market_spread.and_then(|m| cover_result(forecast.predicted_spread, actual_spread, m)),
    })
}

/// Replay games under `config` with its scaling factor replaced.
///
/// Pure over already-loaded inputs; games are replayed in parallel and the
/// records come back in input order.
pub fn evaluate(
    games: &[HistoricalGame],
    book: &StandingsBook,
    config: &EngineConfig,
    scaling_factor: f64,
) -> Evaluation {
    evaluate_with(
        games,
        book,
        &config.with_scaling_factor(scaling_factor),
        &TeamResolver::nfl(),
    )
}

/// Replay games under `config` exactly as given
pub fn evaluate_with(
    games: &[HistoricalGame],
    book: &StandingsBook,
    config: &EngineConfig,
    resolver: &TeamResolver,
) -> Evaluation {
    let results: Vec<Result<BacktestRecord>> = games
        .par_iter()
        .map(|game| replay_game(game, book, config, resolver))
        .collect();

    let mut evaluation = Evaluation::default();
    for (game, result) in games.iter().zip(results) {
        match result {
            Ok(record) => {
                evaluation.metrics.update(&record);
                evaluation.records.push(record);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", game.label(), e);
                evaluation.skipped.push(SkippedGame {
                    game: game.label(),
                    reason: e.to_string(),
                });
            }
        }
    }
    evaluation
}

/// ATS record for games where the model disagreed with the close by at least
/// a given number of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdResult {
    pub threshold: f64,
    pub games: usize,
    pub ats_record: AtsRecord,
    pub win_rate: f64,
    pub roi: f64,
}

pub fn threshold_sweep(records: &[BacktestRecord], thresholds: &[f64]) -> Vec<ThresholdResult> {
    thresholds
        .iter()
        .map(|&threshold| {
            let filtered: Vec<&BacktestRecord> = records
                .iter()
                .filter(|r| r.market_edge().map_or(false, |edge| edge >= threshold))
                .collect();
            let ats_record = AtsRecord::from_records(filtered.iter().copied());
            ThresholdResult {
                threshold,
                games: filtered.len(),
                ats_record,
                win_rate: ats_record.win_rate(),
                roi: ats_record.roi(),
            }
        })
        .collect()
}

/// Full backtest output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub scaling_factor: f64,
    pub overall: MetricsSummary,
    pub ats_record: AtsRecord,
    pub seasons: Vec<SeasonStats>,
    pub weekly: Vec<WeeklyStats>,
    pub thresholds: Vec<ThresholdResult>,
    pub records: Vec<BacktestRecord>,
    pub skipped: Vec<SkippedGame>,
}

/// Per-week stats in (season, week) order
pub fn weekly_stats(records: &[BacktestRecord]) -> Vec<WeeklyStats> {
    let mut weeks: BTreeMap<(u16, u8), Metrics> = BTreeMap::new();
    for record in records {
        weeks.entry((record.season, record.week)).or_default().update(record);
    }
    weeks
        .into_iter()
        .map(|((season, week), metrics)| WeeklyStats {
            season,
            week,
            metrics: metrics.summary(),
        })
        .collect()
}

/// Per-season stats in season order
pub fn season_stats(records: &[BacktestRecord]) -> Vec<SeasonStats> {
    let mut seasons: BTreeMap<u16, Vec<&BacktestRecord>> = BTreeMap::new();
    for record in records {
        seasons.entry(record.season).or_default().push(record);
    }
    seasons
        .into_iter()
        .map(|(season, records)| SeasonStats {
            season,
            metrics: Metrics::from_records(records.iter().copied()).summary(),
            ats_record: AtsRecord::from_records(records.iter().copied()),
        })
        .collect()
}

/// Replay every game under `config` and aggregate
pub fn backtest(games: &[HistoricalGame], book: &StandingsBook, config: &EngineConfig) -> BacktestReport {
    let evaluation = evaluate(games, book, config, config.scaling_factor);
    log::info!("Backtest: {}", evaluation.metrics);
    if !evaluation.skipped.is_empty() {
        log::warn!("{} games skipped", evaluation.skipped.len());
    }
    report(evaluation, config.scaling_factor)
}

/// Aggregate an evaluation into a report
pub fn report(evaluation: Evaluation, scaling_factor: f64) -> BacktestReport {
    let Evaluation {
        records,
        skipped,
        metrics,
    } = evaluation;

    BacktestReport {
        scaling_factor,
        overall: metrics.summary(),
        ats_record: AtsRecord::from_records(&records),
        seasons: season_stats(&records),
        weekly: weekly_stats(&records),
        thresholds: threshold_sweep(&records, DEFAULT_THRESHOLDS),
        records,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MarketLine, StandingsSnapshot, WeekStandings};

    fn snapshot(team: &str, wins: u32, losses: u32, pf: f64, pa: f64) -> StandingsSnapshot {
        StandingsSnapshot {
            team: team.to_string(),
            wins,
            losses,
            points_for: pf,
            points_against: pa,
            ..Default::default()
        }
    }

    fn book() -> StandingsBook {
        vec![
            WeekStandings::new(
                2023,
                1,
                vec![
                    snapshot("Strong", 1, 0, 30.0, 10.0),
                    snapshot("Weak", 0, 1, 10.0, 30.0),
                ],
            ),
            // the game week itself: wildly different numbers that must not be used
            WeekStandings::new(
                2023,
                2,
                vec![
                    snapshot("Strong", 1, 1, 30.0, 90.0),
                    snapshot("Weak", 2, 0, 90.0, 30.0),
                ],
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_replay_uses_prior_week_only() {
        let game = HistoricalGame::new(2023, 2, "Strong", "Weak", 27, 13);
        let record = replay_game(&game, &book(), &EngineConfig::balanced(), &TeamResolver::new()).unwrap();
        // week 1 says Strong is far better
        assert!(record.predicted_spread > 0.0);
        assert!(record.winner_correct);
        assert_eq!(record.actual_spread, 14.0);
        assert!(record.ats_correct.is_none());
    }

    #[test]
    fn test_first_week_has_no_prior_standings() {
        let game = HistoricalGame::new(2023, 1, "Strong", "Weak", 27, 13);
        let result = replay_game(&game, &book(), &EngineConfig::balanced(), &TeamResolver::new());
        assert!(matches!(result, Err(EngineError::MissingData { week: 1, .. })));
    }

    #[test]
    fn test_evaluate_skips_and_continues() {
        let games = vec![
            HistoricalGame::new(2023, 2, "Strong", "Weak", 27, 13),
            HistoricalGame::new(2023, 2, "Strong", "Ghosts", 27, 13),
            HistoricalGame::new(2023, 3, "Weak", "Strong", 20, 17).with_market(MarketLine::new(3.0, 40.0)),
        ];
        let evaluation = evaluate(&games, &book(), &EngineConfig::balanced(), 0.55);
        assert_eq!(evaluation.records.len(), 2);
        assert_eq!(evaluation.skipped.len(), 1);
        assert!(evaluation.skipped[0].game.contains("Ghosts"));
        assert_eq!(evaluation.metrics.games, 2);
        assert_eq!(evaluation.metrics.ats_games, 1);
        // records stay in input order
        assert_eq!(evaluation.records[1].week, 3);
    }

    #[test]
    fn test_scaling_factor_changes_error() {
        let games = vec![HistoricalGame::new(2023, 2, "Strong", "Weak", 27, 13)];
        let small = evaluate(&games, &book(), &EngineConfig::balanced(), 0.1);
        let large = evaluate(&games, &book(), &EngineConfig::balanced(), 2.0);
        assert!(large.records[0].predicted_spread > small.records[0].predicted_spread);
    }

    #[test]
    fn test_threshold_sweep_filters_by_edge() {
        let games = vec![
            HistoricalGame::new(2023, 2, "Strong", "Weak", 27, 13).with_market(MarketLine::new(-13.0, 40.0)),
            HistoricalGame::new(2023, 2, "Weak", "Strong", 13, 27).with_market(MarketLine::new(-50.0, 40.0)),
        ];
        let evaluation = evaluate(&games, &book(), &EngineConfig::balanced(), 0.55);
        let sweep = threshold_sweep(&evaluation.records, &[0.0, 1000.0]);
        assert_eq!(sweep[0].games, 2);
        assert_eq!(sweep[1].games, 0);
        assert_eq!(sweep[1].ats_record, AtsRecord::default());
    }

    #[test]
    fn test_backtest_report_groups() {
        let games = vec![
            HistoricalGame::new(2023, 2, "Strong", "Weak", 27, 13),
            HistoricalGame::new(2023, 3, "Weak", "Strong", 20, 17),
        ];
        let report = backtest(&games, &book(), &EngineConfig::balanced());
        assert_eq!(report.overall.games, 2);
        assert_eq!(report.weekly.len(), 2);
        assert_eq!(report.seasons.len(), 1);
        assert_eq!(report.thresholds.len(), DEFAULT_THRESHOLDS.len());
        assert!(serde_json::to_string(&report).unwrap().contains("winnerAccuracy"));
    }
}
