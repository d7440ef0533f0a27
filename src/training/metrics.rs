//! Backtest metrics and evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ScoreLine, Side};

/// Games within this many points of the line are pushes
pub const PUSH_TOLERANCE: f64 = 0.5;
/// Win rate needed to break even at -110 pricing (percent)
pub const BREAKEVEN_WIN_RATE: f64 = 52.38;
/// Profit per winning unit bet at -110
pub const WIN_PAYOUT: f64 = 100.0;
/// Amount risked per unit bet at -110
pub const RISK_PER_BET: f64 = 110.0;
/// One-sided significance threshold for ATS records
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Model beats the closing line when its miss is no larger than the market's.
/// All three values share one spread convention.
pub fn ats_correct(predicted_spread: f64, actual_spread: f64, market_spread: f64) -> bool {
    (predicted_spread - actual_spread).abs() <= (market_spread - actual_spread).abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoverResult {
    Win,
    Loss,
    Push,
}

/// Result of backing the side the model prefers against the market margin.
///
/// None when the model agrees with the market exactly and makes no pick.
pub fn cover_result(predicted_spread: f64, actual_spread: f64, market_spread: f64) -> Option<CoverResult> {
    let pick = if predicted_spread > market_spread {
        Side::Home
    } else if predicted_spread < market_spread {
        Side::Away
    } else {
        return None;
    };

    if (actual_spread - market_spread).abs() < PUSH_TOLERANCE {
        return Some(CoverResult::Push);
    }
    let home_covered = actual_spread > market_spread;
    Some(match (pick, home_covered) {
        (Side::Home, true) | (Side::Away, false) => CoverResult::Win,
        _ => CoverResult::Loss,
    })
}

/// One replayed game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRecord {
    pub season: u16,
    pub week: u8,
    pub home_team: String,
    pub away_team: String,
    pub home_rating: f64,
    pub away_rating: f64,
    pub predicted_spread: f64,
    pub predicted_total: f64,
    pub predicted_score: ScoreLine,
    pub confidence: f64,
    pub actual_spread: f64,
    pub actual_total: f64,
    pub actual_score: ScoreLine,
    /// Closing margin (home minus away)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_spread: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_total: Option<f64>,
    pub spread_error: f64,
    pub total_error: f64,
    pub winner_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ats_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<CoverResult>,
}

impl BacktestRecord {
    /// Model's disagreement with the closing margin, if there was one
    pub fn market_edge(&self) -> Option<f64> {
        self.market_spread
            .map(|market| (self.predicted_spread - market).abs())
    }
}

/// Running totals over backtest records
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub games: usize,
    pub correct_winners: usize,
    /// Games with a market line
    pub ats_games: usize,
    pub ats_correct: usize,
    pub spread_error_sum: f64,
    pub total_error_sum: f64,
    pub confidence_sum: f64,
    /// Sum of |market margin - actual| over games with a line
    pub market_error_sum: f64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a, I: IntoIterator<Item = &'a BacktestRecord>>(records: I) -> Self {
        let mut metrics = Metrics::new();
        for record in records {
            metrics.update(record);
        }
        metrics
    }

    /// Add one record
    pub fn update(&mut self, record: &BacktestRecord) {
        self.games += 1;
        if record.winner_correct {
            self.correct_winners += 1;
        }
        self.spread_error_sum += record.spread_error;
        self.total_error_sum += record.total_error;
        self.confidence_sum += record.confidence;

        if let (Some(market), Some(correct)) = (record.market_spread, record.ats_correct) {
            self.ats_games += 1;
            if correct {
                self.ats_correct += 1;
            }
            self.market_error_sum += (market - record.actual_spread).abs();
        }
    }

    fn ratio(numerator: f64, denominator: usize) -> f64 {
        if denominator == 0 {
            0.0
        } else {
            numerator / denominator as f64
        }
    }

    /// Straight-up winner accuracy (0-1)
    pub fn winner_accuracy(&self) -> f64 {
        Self::ratio(self.correct_winners as f64, self.games)
    }

    /// Share of lined games where the model beat the close (0-1)
    pub fn ats_accuracy(&self) -> f64 {
        Self::ratio(self.ats_correct as f64, self.ats_games)
    }

    /// Mean absolute spread error in points
    pub fn spread_mae(&self) -> f64 {
        Self::ratio(self.spread_error_sum, self.games)
    }

    pub fn total_mae(&self) -> f64 {
        Self::ratio(self.total_error_sum, self.games)
    }

    pub fn mean_confidence(&self) -> f64 {
        Self::ratio(self.confidence_sum, self.games)
    }

    /// Closing line's own mean absolute spread error
    pub fn market_mae(&self) -> Option<f64> {
        (self.ats_games > 0).then(|| Self::ratio(self.market_error_sum, self.ats_games))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Merge another metrics instance
    pub fn merge(&mut self, other: &Metrics) {
        self.games += other.games;
        self.correct_winners += other.correct_winners;
        self.ats_games += other.ats_games;
        self.ats_correct += other.ats_correct;
        self.spread_error_sum += other.spread_error_sum;
        self.total_error_sum += other.total_error_sum;
        self.confidence_sum += other.confidence_sum;
        self.market_error_sum += other.market_error_sum;
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            games: self.games,
            winner_accuracy: self.winner_accuracy() * 100.0,
            ats_games: self.ats_games,
            ats_accuracy: self.ats_accuracy() * 100.0,
            spread_mae: self.spread_mae(),
            total_mae: self.total_mae(),
            mean_confidence: self.mean_confidence(),
            market_spread_mae: self.market_mae(),
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Games: {} | Winner: {:.1}% | ATS: {:.1}% ({} lined) | Spread MAE: {:.2} | Total MAE: {:.2} | Conf: {:.1}",
            self.games,
            self.winner_accuracy() * 100.0,
            self.ats_accuracy() * 100.0,
            self.ats_games,
            self.spread_mae(),
            self.total_mae(),
            self.mean_confidence()
        )
    }
}

/// Serializable snapshot of [`Metrics`], accuracies in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub games: usize,
    pub winner_accuracy: f64,
    pub ats_games: usize,
    pub ats_accuracy: f64,
    pub spread_mae: f64,
    pub total_mae: f64,
    pub mean_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_spread_mae: Option<f64>,
}

/// Side-pick record against the spread at -110
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsRecord {
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
}

impl AtsRecord {
    pub fn from_records<'a, I: IntoIterator<Item = &'a BacktestRecord>>(records: I) -> Self {
        let mut ats = AtsRecord::default();
        for record in records {
            ats.add(record.cover);
        }
        ats
    }

    pub fn add(&mut self, cover: Option<CoverResult>) {
        match cover {
            Some(CoverResult::Win) => self.wins += 1,
            Some(CoverResult::Loss) => self.losses += 1,
            Some(CoverResult::Push) => self.pushes += 1,
            None => {}
        }
    }

    /// Bets with a winner or loser
    pub fn decided(&self) -> usize {
        self.wins + self.losses
    }

    /// Win rate over decided bets (percent)
    pub fn win_rate(&self) -> f64 {
        match self.decided() {
            0 => 0.0,
            n => self.wins as f64 / n as f64 * 100.0,
        }
    }

    /// Profit in dollars staking to win 100 per bet
    pub fn profit(&self) -> f64 {
        self.wins as f64 * WIN_PAYOUT - self.losses as f64 * RISK_PER_BET
    }

    /// Return on amount risked (percent)
    pub fn roi(&self) -> f64 {
        match self.decided() {
            0 => 0.0,
            n => self.profit() / (n as f64 * RISK_PER_BET) * 100.0,
        }
    }

    /// Percentage points above break-even
    pub fn edge(&self) -> f64 {
        self.win_rate() - BREAKEVEN_WIN_RATE
    }

    pub fn is_profitable(&self) -> bool {
        self.decided() > 0 && self.win_rate() > BREAKEVEN_WIN_RATE
    }

    /// One-sided binomial p-value that picks beat a coin flip.
    ///
    /// `P(X >= wins)` for `X ~ Binomial(decided, 0.5)`, summed in log space.
    /// Pushes are not bets. 1.0 with no decided bets.
    pub fn p_value(&self) -> f64 {
        let n = self.decided();
        if n == 0 {
            return 1.0;
        }

        // ln C(n, k) for k = wins..=n
        let mut ln_choose = 0.0;
        for k in 1..=self.wins {
            ln_choose += ((n - k + 1) as f64 / k as f64).ln();
        }
        let mut terms = Vec::with_capacity(n - self.wins + 1);
        terms.push(ln_choose);
        for k in self.wins + 1..=n {
            ln_choose += ((n - k + 1) as f64 / k as f64).ln();
            terms.push(ln_choose);
        }

        let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = terms.iter().map(|t| (t - max).exp()).sum();
        let ln_tail = max + sum.ln() - n as f64 * std::f64::consts::LN_2;
        ln_tail.exp().min(1.0)
    }

    /// Better than a coin flip at the 5% level
    pub fn is_significant(&self) -> bool {
        self.p_value() < SIGNIFICANCE_LEVEL
    }
}

impl fmt::Display for AtsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} ({:.1}%, ROI {:+.1}%, edge {:+.1}, p={:.3})",
            self.wins,
            self.losses,
            self.pushes,
            self.win_rate(),
            self.roi(),
            self.edge(),
            self.p_value()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub season: u16,
    pub week: u8,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStats {
    pub season: u16,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
    pub ats_record: AtsRecord,
}
