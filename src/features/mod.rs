//! Feature engineering
//!
//! League scoring context and per-team strength ratings.

pub mod league;
pub mod strength;

pub use league::LeagueAverages;
pub use strength::{StrengthComponents, TeamStrength, Venue};
