//! File loading for standings and historical games
//!
//! All I/O lives here; everything downstream works on already-loaded values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::data::history::HistoricalGame;
use crate::data::market::MarketLine;
use crate::data::standings::{StandingsBook, StandingsSnapshot, WeekStandings};
use crate::model::EngineConfig;
use crate::{EngineError, Result};

/// One week of standings as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsWeekFile {
    pub season: u16,
    pub week: u8,
    #[serde(alias = "standings")]
    pub teams: Vec<StandingsSnapshot>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StandingsFile {
    Many(Vec<StandingsWeekFile>),
    One(StandingsWeekFile),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GamesFile {
    Wrapped {
        #[serde(alias = "data")]
        games: Vec<HistoricalGame>,
    },
    List(Vec<HistoricalGame>),
}

/// Load standings from a JSON file, or from every `.json` file in a directory
pub fn load_standings<P: AsRef<Path>>(path: P) -> Result<StandingsBook> {
    let path = path.as_ref();
    let mut book = StandingsBook::new();

    let files = if path.is_dir() {
        let mut files: Vec<_> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    for file in &files {
        log::debug!("Loading standings from {}", file.display());
        let content = fs::read_to_string(file)?;
        let weeks = match serde_json::from_str::<StandingsFile>(&content)? {
            StandingsFile::Many(weeks) => weeks,
            StandingsFile::One(week) => vec![week],
        };
        for week in weeks {
            book.insert(WeekStandings::new(week.season, week.week, week.teams));
        }
    }

    if book.is_empty() {
        return Err(EngineError::InsufficientData(format!(
            "no standings weeks found in {}",
            path.display()
        )));
    }

    log::info!("Loaded {} standings weeks from {}", book.len(), path.display());
    Ok(book)
}

/// Load completed games from `{"games": [...]}`, `{"data": [...]}` or a bare list
pub fn load_games<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalGame>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let games = match serde_json::from_str::<GamesFile>(&content)? {
        GamesFile::Wrapped { games } => games,
        GamesFile::List(games) => games,
    };
    log::info!("Loaded {} games from {}", games.len(), path.display());
    Ok(games)
}

pub fn load_market<P: AsRef<Path>>(path: P) -> Result<MarketLine> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a custom engine config. The result is not yet validated.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gridiron-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_standings_directory() {
        let dir = scratch_dir("standings");
        fs::write(
            dir.join("2024-w01.json"),
            r#"{"season": 2024, "week": 1, "teams": [{"team": "A", "wins": 1, "pointsFor": 24, "pointsAgainst": 17}]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("2024-more.json"),
            r#"[{"season": 2024, "week": 2, "standings": [{"team": "A", "wins": 2}]},
                {"season": 2024, "week": 3, "teams": []}]"#,
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let book = load_standings(&dir).unwrap();
        assert_eq!(book.len(), 3);
        let week1 = book.get(2024, 1).unwrap();
        assert_eq!(week1.snapshots()[0].points_for, 24.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_games_wrapped_and_bare() {
        let dir = scratch_dir("games");
        let wrapped = dir.join("wrapped.json");
        let bare = dir.join("bare.json");
        let game = r#"{"season": 2023, "week": 9, "homeTeam": "A", "awayTeam": "B", "homeScore": 21, "awayScore": 14}"#;
        fs::write(&wrapped, format!(r#"{{"data": [{}]}}"#, game)).unwrap();
        fs::write(&bare, format!("[{}, {}]", game, game)).unwrap();

        assert_eq!(load_games(&wrapped).unwrap().len(), 1);
        assert_eq!(load_games(&bare).unwrap().len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_standings_is_error() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            load_standings(&dir),
            Err(EngineError::InsufficientData(_))
        ));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_json_creates_parent() {
        let dir = scratch_dir("write");
        let out = dir.join("nested/out.json");
        write_json(&out, &vec![1, 2, 3]).unwrap();
        assert!(fs::read_to_string(&out).unwrap().contains('2'));
        fs::remove_dir_all(&dir).ok();
    }
}
