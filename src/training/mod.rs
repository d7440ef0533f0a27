//! Backtesting and calibration
//!
//! Historical replay, metrics aggregation, and the scaling factor search.

pub mod backtest;
pub mod calibration;
pub mod metrics;

pub use backtest::{backtest, evaluate, BacktestReport, Evaluation};
pub use calibration::{
    calibrate, evaluate_test, grid_search, walk_forward, CalibrationResult, CalibrationSettings,
    SelectedFactor, SplitRatios, TestSet, WalkForwardReport, WeekSplit,
};
pub use metrics::{AtsRecord, BacktestRecord, Metrics};
