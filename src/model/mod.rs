//! Forecast model
//!
//! Engine configuration and the spread/total/score projection.

pub mod config;
pub mod forecast;

pub use config::EngineConfig;
pub use forecast::{confidence, forecast, Forecast};
