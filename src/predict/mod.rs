//! Prediction
//!
//! Edge detection, ensemble consensus, volatility scoring, stake sizing and
//! the predictor that runs them together.

pub mod edge;
pub mod ensemble;
pub mod inference;
pub mod staking;
pub mod volatility;

pub use inference::{format_prediction, Matchup, Predictor};
