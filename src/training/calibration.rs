//! Scaling factor calibration
//!
//! Games are split by week into train, validation and test sets. The grid
//! search only ever sees the validation games. The test set can only be
//! evaluated by handing it over by value together with a [`SelectedFactor`],
//! which in turn can only come out of [`grid_search`], so the test games are
//! scored exactly once and only after selection is final.
//!
//! [`walk_forward`] repeats the search season by season: each season is
//! scored with a factor chosen on earlier seasons only.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::data::{HistoricalGame, StandingsBook};
use crate::model::config::validate_scaling_factor;
use crate::model::EngineConfig;
use crate::training::backtest::evaluate;
use crate::training::metrics::{AtsRecord, BacktestRecord, Metrics, MetricsSummary};
use crate::{EngineError, Result};

/// Fraction of weeks assigned to each split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        SplitRatios {
            train: 0.70,
            validation: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    fn validate(&self) -> Result<()> {
        let errors: Vec<String> = [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ]
        .iter()
        .filter(|(_, value)| !value.is_finite() || *value <= 0.0)
        .map(|(name, value)| format!("{} split ratio must be positive (got {})", name, value))
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(errors))
        }
    }
}

/// Held-out games. Not clonable and not readable; the only thing to do with
/// it is pass it to [`evaluate_test`].
#[derive(Debug)]
pub struct TestSet {
    games: Vec<HistoricalGame>,
    weeks: Vec<(u16, u8)>,
}

impl TestSet {
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn weeks(&self) -> &[(u16, u8)] {
        &self.weeks
    }
}

/// Games split into train, validation and test by week
#[derive(Debug)]
pub struct SplitGames {
    pub train: Vec<HistoricalGame>,
    pub validation: Vec<HistoricalGame>,
    pub test: TestSet,
    pub train_weeks: Vec<(u16, u8)>,
    pub validation_weeks: Vec<(u16, u8)>,
}

pub struct WeekSplit;

impl WeekSplit {
    /// Split by distinct (season, week) in chronological order. Train takes the
    /// earliest weeks, then validation, then test. Every split gets at least
    /// one week, so at least three distinct weeks are needed.
    pub fn chronological(games: Vec<HistoricalGame>, ratios: SplitRatios) -> Result<SplitGames> {
        ratios.validate()?;

        let weeks: Vec<(u16, u8)> = games
            .iter()
            .map(HistoricalGame::week_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let n = weeks.len();
        if n < 3 {
            return Err(EngineError::InsufficientData(format!(
                "need at least 3 distinct weeks to split, found {}",
                n
            )));
        }

        let sum = ratios.train + ratios.validation + ratios.test;
        let n_train = ((n as f64 * ratios.train / sum).round() as usize).clamp(1, n - 2);
        let n_val = ((n as f64 * ratios.validation / sum).round() as usize).clamp(1, n - 1 - n_train);

        let validation_start = weeks[n_train];
        let test_start = weeks[n_train + n_val];
        Self::by_weeks(games, validation_start, test_start)
    }

    /// Split at explicit boundaries: train is everything before
    /// `validation_start`, validation runs up to `test_start`, test is the rest
    pub fn by_weeks(
        games: Vec<HistoricalGame>,
        validation_start: (u16, u8),
        test_start: (u16, u8),
    ) -> Result<SplitGames> {
        if validation_start >= test_start {
            return Err(EngineError::InvalidConfig(vec![format!(
                "validation start {:?} must be before test start {:?}",
                validation_start, test_start
            )]));
        }

        let mut train = Vec::new();
        let mut validation = Vec::new();
        let mut test = Vec::new();
        for game in games {
            let key = game.week_key();
            if key < validation_start {
                train.push(game);
            } else if key < test_start {
                validation.push(game);
            } else {
                test.push(game);
            }
        }

        if validation.is_empty() || test.is_empty() {
            return Err(EngineError::InsufficientData(format!(
                "split left {} validation and {} test games",
                validation.len(),
                test.len()
            )));
        }

        let split = SplitGames {
            train_weeks: distinct_weeks(&train),
            validation_weeks: distinct_weeks(&validation),
            test: TestSet {
                weeks: distinct_weeks(&test),
                games: test,
            },
            train,
            validation,
        };

        log::info!(
            "Split games: train={} ({} weeks), validation={} ({} weeks), test={} ({} weeks)",
            split.train.len(),
            split.train_weeks.len(),
            split.validation.len(),
            split.validation_weeks.len(),
            split.test.len(),
            split.test.weeks.len()
        );
        Ok(split)
    }
}

fn distinct_weeks(games: &[HistoricalGame]) -> Vec<(u16, u8)> {
    games
        .iter()
        .map(HistoricalGame::week_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A scaling factor chosen on validation data. Only [`grid_search`] makes one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFactor {
    value: f64,
    validation_error: f64,
}

impl SelectedFactor {
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Validation spread MAE at this factor
    pub fn validation_error(&self) -> f64 {
        self.validation_error
    }
}

/// Validation result for one candidate factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub factor: f64,
    pub games: usize,
    pub skipped: usize,
    pub spread_mae: f64,
    pub total_mae: f64,
    pub winner_accuracy: f64,
    pub ats_accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub factor: SelectedFactor,
    /// Every candidate in the order given
    pub candidates: Vec<CandidateScore>,
}

/// Choose the scaling factor with the lowest validation spread MAE.
///
/// Candidates are evaluated in parallel; ties go to the smaller factor.
pub fn grid_search(
    validation: &[HistoricalGame],
    book: &StandingsBook,
    config: &EngineConfig,
    candidates: &[f64],
) -> Result<Selection> {
    if candidates.is_empty() {
        return Err(EngineError::InsufficientData(
            "no candidate scaling factors".to_string(),
        ));
    }
    if validation.is_empty() {
        return Err(EngineError::InsufficientData(
            "no validation games".to_string(),
        ));
    }
    let errors: Vec<String> = candidates
        .iter()
        .filter_map(|&c| validate_scaling_factor(c))
        .collect();
    if !errors.is_empty() {
        return Err(EngineError::InvalidConfig(errors));
    }

    let scores: Vec<CandidateScore> = candidates
        .par_iter()
        .map(|&factor| {
            let evaluation = evaluate(validation, book, config, factor);
            let metrics = &evaluation.metrics;
            CandidateScore {
                factor,
                games: metrics.games,
                skipped: evaluation.skipped.len(),
                spread_mae: metrics.spread_mae(),
                total_mae: metrics.total_mae(),
                winner_accuracy: metrics.winner_accuracy() * 100.0,
                ats_accuracy: metrics.ats_accuracy() * 100.0,
            }
        })
        .collect();

    for score in &scores {
        log::info!(
            "  factor {:.2}: spread MAE {:.3}, winner {:.1}%, ATS {:.1}% ({} games)",
            score.factor,
            score.spread_mae,
            score.winner_accuracy,
            score.ats_accuracy,
            score.games
        );
    }

    let best = scores
        .iter()
        .filter(|s| s.games > 0)
        .min_by(|a, b| {
            a.spread_mae
                .total_cmp(&b.spread_mae)
                .then(a.factor.total_cmp(&b.factor))
        })
        .ok_or_else(|| {
            EngineError::InsufficientData("every validation game was skipped".to_string())
        })?;

    log::info!(
        "Selected scaling factor {:.2} (validation spread MAE {:.3})",
        best.factor,
        best.spread_mae
    );

    Ok(Selection {
        factor: SelectedFactor {
            value: best.factor,
            validation_error: best.spread_mae,
        },
        candidates: scores,
    })
}

/// Final calibration report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub best_factor: f64,
    pub baseline_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_error: Option<f64>,
    pub validation_error: f64,
    pub test_error: f64,
    pub baseline_error: f64,
    /// Test error reduction against the baseline factor (percent)
    pub improvement_pct: f64,
    pub test_metrics: MetricsSummary,
    pub baseline_metrics: MetricsSummary,
    pub test_ats: AtsRecord,
    pub test_weeks: Vec<(u16, u8)>,
    pub test_skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateScore>,
}

/// Score the held-out games once with the selected factor and the baseline.
///
/// Consumes the test set.
pub fn evaluate_test(
    test: TestSet,
    factor: SelectedFactor,
    baseline_factor: f64,
    book: &StandingsBook,
    config: &EngineConfig,
) -> Result<CalibrationResult> {
    if let Some(error) = validate_scaling_factor(baseline_factor) {
        return Err(EngineError::InvalidConfig(vec![error]));
    }

    let TestSet { games, weeks } = test;
    let tuned = evaluate(&games, book, config, factor.value);
    let baseline = evaluate(&games, book, config, baseline_factor);

    if tuned.records.is_empty() {
        return Err(EngineError::InsufficientData(
            "every test game was skipped".to_string(),
        ));
    }

    let test_error = tuned.metrics.spread_mae();
    let baseline_error = baseline.metrics.spread_mae();
    let improvement_pct = if baseline_error > 0.0 {
        (baseline_error - test_error) / baseline_error * 100.0
    } else {
        0.0
    };

    log::info!(
        "Test spread MAE {:.3} at factor {:.2} vs {:.3} at baseline {:.2} ({:+.1}%)",
        test_error,
        factor.value,
        baseline_error,
        baseline_factor,
        improvement_pct
    );

    Ok(CalibrationResult {
        best_factor: factor.value,
        baseline_factor,
        train_error: None,
        validation_error: factor.validation_error,
        test_error,
        baseline_error,
        improvement_pct,
        test_metrics: tuned.metrics.summary(),
        baseline_metrics: baseline.metrics.summary(),
        test_ats: AtsRecord::from_records(&tuned.records),
        test_weeks: weeks,
        test_skipped: tuned.skipped.len(),
        candidates: Vec::new(),
    })
}

/// Calibration settings from the application config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Scaling factors to try
    pub candidates: Vec<f64>,
    /// Factor the tuned result is compared against
    pub baseline_factor: f64,
    pub split: SplitRatios,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        CalibrationSettings {
            candidates: (0..=25)
                .map(|i| ((0.25 + i as f64 * 0.05) * 100.0).round() / 100.0)
                .collect(),
            baseline_factor: 0.55,
            split: SplitRatios::default(),
        }
    }
}

/// Split, search on validation, then score the test set once
pub fn calibrate(
    games: Vec<HistoricalGame>,
    book: &StandingsBook,
    config: &EngineConfig,
    settings: &CalibrationSettings,
) -> Result<CalibrationResult> {
    let SplitGames {
        train,
        validation,
        test,
        ..
    } = WeekSplit::chronological(games, settings.split.clone())?;

    let selection = grid_search(&validation, book, config, &settings.candidates)?;

    let train_error = if train.is_empty() {
        None
    } else {
        let reference = evaluate(&train, book, config, selection.factor.value());
        (reference.metrics.games > 0).then(|| reference.metrics.spread_mae())
    };

    let mut result = evaluate_test(test, selection.factor, settings.baseline_factor, book, config)?;
    result.train_error = train_error;
    result.candidates = selection.candidates;
    Ok(result)
}

/// One out-of-sample season in a walk-forward run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkForwardSeason {
    pub season: u16,
    /// Seasons the factor was searched on, all earlier than `season`
    pub fitted_on: Vec<u16>,
    pub factor: SelectedFactor,
    pub metrics: MetricsSummary,
    pub ats_record: AtsRecord,
    pub p_value: f64,
    pub skipped: usize,
}

/// Walk-forward results per season and pooled over every scored season
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkForwardReport {
    pub seasons: Vec<WalkForwardSeason>,
    pub overall: MetricsSummary,
    pub ats_record: AtsRecord,
    pub p_value: f64,
}

/// Score each season with a factor grid-searched on all earlier seasons.
///
/// The first season has no history and is never scored. A season whose
/// history yields no usable games is skipped with a warning; bad candidates
/// are an error.
pub fn walk_forward(
    games: &[HistoricalGame],
    book: &StandingsBook,
    config: &EngineConfig,
    candidates: &[f64],
) -> Result<WalkForwardReport> {
    let mut by_season: BTreeMap<u16, Vec<HistoricalGame>> = BTreeMap::new();
    for game in games {
        by_season.entry(game.season).or_default().push(game.clone());
    }
    if by_season.len() < 2 {
        return Err(EngineError::InsufficientData(format!(
            "walk-forward needs at least 2 seasons, found {}",
            by_season.len()
        )));
    }

    let mut history: Vec<HistoricalGame> = Vec::new();
    let mut fitted_on: Vec<u16> = Vec::new();
    let mut seasons = Vec::new();
    let mut pooled: Vec<BacktestRecord> = Vec::new();

    for (season, season_games) in by_season {
        if !history.is_empty() {
            match grid_search(&history, book, config, candidates) {
                Ok(selection) => {
                    let factor = selection.factor;
                    let evaluation = evaluate(&season_games, book, config, factor.value());
                    let ats_record = AtsRecord::from_records(&evaluation.records);
                    log::info!(
                        "Season {}: factor {:.2} from {:?}, spread MAE {:.3}, ATS {}",
                        season,
                        factor.value(),
                        fitted_on,
                        evaluation.metrics.spread_mae(),
                        ats_record
                    );
                    seasons.push(WalkForwardSeason {
                        season,
                        fitted_on: fitted_on.clone(),
                        factor,
                        metrics: evaluation.metrics.summary(),
                        ats_record,
                        p_value: ats_record.p_value(),
                        skipped: evaluation.skipped.len(),
                    });
                    pooled.extend(evaluation.records);
                }
                Err(EngineError::InsufficientData(reason)) => {
                    log::warn!("Season {} not scored: {}", season, reason);
                }
                Err(e) => return Err(e),
            }
        }
        history.extend(season_games);
        fitted_on.push(season);
    }

    if pooled.is_empty() {
        return Err(EngineError::InsufficientData(
            "no season could be scored out of sample".to_string(),
        ));
    }

    let ats_record = AtsRecord::from_records(&pooled);
    log::info!("Walk-forward overall ATS {}", ats_record);
    Ok(WalkForwardReport {
        seasons,
        overall: Metrics::from_records(&pooled).summary(),
        ats_record,
        p_value: ats_record.p_value(),
    })
}
