//! Data ingestion
//!
//! Standings snapshots, market lines, completed games, team name resolution
//! and the file loaders that read them.

pub mod history;
pub mod loader;
pub mod market;
pub mod resolver;
pub mod standings;

pub use history::HistoricalGame;
pub use market::{Market, MarketLine};
pub use resolver::TeamResolver;
pub use standings::{StandingsBook, StandingsSnapshot, WeekStandings};
