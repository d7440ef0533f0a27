//! Gridiron prediction CLI
//!
//! Rates teams from weekly standings, forecasts games against market lines,
//! and backtests and calibrates the engine on completed games.

use clap::{Parser, Subcommand};
use gridiron::data::loader;
use gridiron::data::{Market, MarketLine, StandingsBook, WeekStandings};
use gridiron::model::EngineConfig;
use gridiron::predict::volatility::{GameContext, Weather};
use gridiron::predict::{format_prediction, Matchup, Predictor};
use gridiron::training::backtest::{backtest, BacktestReport};
use gridiron::training::calibration::{calibrate, walk_forward, CalibrationResult, WalkForwardReport};
use gridiron::{Config, EngineError, GamePrediction, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "Standings-driven game forecasts, market edges and calibration", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "gridiron.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Predict a single game
    Predict {
        /// Home team name or abbreviation
        home: String,
        /// Away team name or abbreviation
        away: String,
        /// Season of the standings to rate from (defaults to the latest)
        #[arg(long)]
        season: Option<u16>,
        /// Standings week to rate from (defaults to the latest in the season)
        #[arg(long)]
        week: Option<u8>,
        /// Home spread in bookmaker convention, e.g. -3.5
        #[arg(long, allow_hyphen_values = true, requires = "total")]
        spread: Option<f64>,
        /// Total points line
        #[arg(long, requires = "spread")]
        total: Option<f64>,
        /// Market line JSON file (overrides --spread/--total)
        #[arg(long)]
        market: Option<String>,
        /// Engine preset (overrides config)
        #[arg(long)]
        preset: Option<String>,
        /// Wind speed in mph
        #[arg(long)]
        wind: Option<f64>,
        /// Chance of precipitation in percent
        #[arg(long)]
        precip: Option<f64>,
        /// Temperature in Fahrenheit
        #[arg(long, allow_hyphen_values = true)]
        temp: Option<f64>,
        /// Played indoors
        #[arg(long)]
        dome: bool,
        /// Force the divisional flag (otherwise derived from standings)
        #[arg(long)]
        divisional: Option<bool>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Replay completed games and report accuracy
    Backtest {
        /// Games file (overrides config)
        #[arg(long)]
        games: Option<String>,
        /// Standings file or directory (overrides config)
        #[arg(long)]
        standings: Option<String>,
        /// Engine preset (overrides config)
        #[arg(long)]
        preset: Option<String>,
        /// Write the full report as JSON
        #[arg(long)]
        output: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Grid-search the scaling factor on validation weeks, then score the test weeks once
    Calibrate {
        /// Games file (overrides config)
        #[arg(long)]
        games: Option<String>,
        /// Standings file or directory (overrides config)
        #[arg(long)]
        standings: Option<String>,
        /// Write the calibration result as JSON
        #[arg(long)]
        output: Option<String>,
    },
    /// Score each season with a factor searched on earlier seasons only
    WalkForward {
        /// Games file (overrides config)
        #[arg(long)]
        games: Option<String>,
        /// Standings file or directory (overrides config)
        #[arg(long)]
        standings: Option<String>,
        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },
    /// Engine configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active engine weights
    Show,
    /// Validate an engine config JSON file
    Validate {
        /// Path to the JSON file
        file: String,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Predict {
            home,
            away,
            season,
            week,
            spread,
            total,
            market,
            preset,
            wind,
            precip,
            temp,
            dome,
            divisional,
            format,
        } => {
            let weather = (wind.is_some() || precip.is_some() || temp.is_some() || dome).then(|| {
                Weather {
                    wind_mph: wind,
                    precipitation_pct: precip,
                    temperature_f: temp,
                    is_dome: dome,
                }
            });
            let matchup = Matchup::new(&home, &away).with_context(GameContext {
                weather,
                is_divisional: divisional,
            });
            let line = match (spread, total) {
                (Some(spread), Some(total)) => Some(MarketLine::new(spread, total)),
                _ => None,
            };
            commands::predict(&config, matchup, season, week, line, market, preset, format)
        }
        Commands::Backtest {
            games,
            standings,
            preset,
            output,
            format,
        } => commands::backtest(&config, games, standings, preset, output, format),
        Commands::Calibrate {
            games,
            standings,
            output,
        } => commands::calibrate(&config, games, standings, output),
        Commands::WalkForward {
            games,
            standings,
            output,
        } => commands::walk_forward(&config, games, standings, output),
        Commands::Config { action } => match action {
            ConfigCommands::Show => commands::config_show(&config),
            ConfigCommands::Validate { file } => commands::config_validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.standings_path)?;
        println!("Created {}/", config.data.standings_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!(
            "  2. Put weekly standings JSON in {} and completed games in {}",
            config.data.standings_path, config.data.games_path
        );
        println!("  3. Run 'gridiron backtest' to check accuracy");
        println!("  4. Run 'gridiron predict \"KC\" \"BUF\" --spread -2.5 --total 47.5'");

        Ok(())
    }

    fn engine_config(config: &Config, preset: Option<String>) -> Result<EngineConfig> {
        match preset {
            Some(name) => EngineConfig::preset(&name).ok_or_else(|| {
                EngineError::Config(format!(
                    "Unknown preset '{}'. Available: {}",
                    name,
                    EngineConfig::PRESETS.join(", ")
                ))
            }),
            None => config.engine_config(),
        }
    }

    fn select_week(book: &StandingsBook, season: Option<u16>, week: Option<u8>) -> Result<&WeekStandings> {
        let season = match season {
            Some(season) => season,
            None => book
                .iter()
                .map(|w| w.season())
                .max()
                .ok_or_else(|| EngineError::InsufficientData("no standings loaded".to_string()))?,
        };
        let found = match week {
            Some(week) => book.get(season, week),
            None => book.latest(season),
        };
        found.ok_or_else(|| {
            EngineError::InsufficientData(format!(
                "no standings for season {}{}",
                season,
                week.map(|w| format!(" week {}", w)).unwrap_or_default()
            ))
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn predict(
        config: &Config,
        matchup: Matchup,
        season: Option<u16>,
        week: Option<u8>,
        line: Option<MarketLine>,
        market_file: Option<String>,
        preset: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let engine = engine_config(config, preset)?;
        let predictor = Predictor::new(engine)?.with_staking(config.staking.clone());

        let book = loader::load_standings(&config.data.standings_path)?;
        let standings = select_week(&book, season, week)?;

        let market: Market = match market_file {
            Some(path) => loader::load_market(path)?.into(),
            None => line.into(),
        };

        let prediction = predictor.predict(standings, &matchup, &market)?;
        print_prediction(&prediction, format)
    }

    fn print_prediction(prediction: &GamePrediction, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(prediction));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(prediction)?);
            }
            OutputFormat::Csv => {
                println!("home,away,spread,total,home_score,away_score,confidence,recommendation");
                println!(
                    "{},{},{:.1},{:.1},{},{},{:.1},{}",
                    prediction.home_team,
                    prediction.away_team,
                    prediction.predicted_spread,
                    prediction.predicted_total,
                    prediction.predicted_score.home,
                    prediction.predicted_score.away,
                    prediction.confidence,
                    prediction.recommendation
                );
            }
        }
        Ok(())
    }

    pub fn backtest(
        config: &Config,
        games_path: Option<String>,
        standings_path: Option<String>,
        preset: Option<String>,
        output: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let engine = engine_config(config, preset)?;
        let games = loader::load_games(games_path.as_deref().unwrap_or(&config.data.games_path))?;
        let book = loader::load_standings(
            standings_path
                .as_deref()
                .unwrap_or(&config.data.standings_path),
        )?;

        let report = super::backtest(&games, &book, &engine);

        if let Some(path) = &output {
            loader::write_json(path, &report)?;
            println!("Report written to {}", path);
        }

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Csv => print_records_csv(&report),
            OutputFormat::Table => print_report(&report),
        }
        Ok(())
    }

    fn print_report(report: &BacktestReport) {
        let overall = &report.overall;
        println!("\nBacktest (scaling factor {:.2})", report.scaling_factor);
        println!("───────────────────────────────");
        println!("  Games:          {}", overall.games);
        println!("  Skipped:        {}", report.skipped.len());
        println!("  Winner:         {:.1}%", overall.winner_accuracy);
        println!("  Spread MAE:     {:.2}", overall.spread_mae);
        println!("  Total MAE:      {:.2}", overall.total_mae);
        if let Some(market_mae) = overall.market_spread_mae {
            println!("  Market MAE:     {:.2}", market_mae);
            println!("  Beat close:     {:.1}% of {} lined games", overall.ats_accuracy, overall.ats_games);
            println!("  ATS picks:      {}", report.ats_record);
        }

        if !report.seasons.is_empty() {
            println!("\n  Season   Games  Winner  Spread MAE  ATS");
            for season in &report.seasons {
                println!(
                    "  {:<8} {:>5}  {:>5.1}%  {:>10.2}  {}",
                    season.season,
                    season.metrics.games,
                    season.metrics.winner_accuracy,
                    season.metrics.spread_mae,
                    season.ats_record
                );
            }
        }

        if report.thresholds.iter().any(|t| t.games > 0) {
            println!("\n  Edge >=  Games  Record");
            for t in &report.thresholds {
                println!("  {:>7.1}  {:>5}  {}", t.threshold, t.games, t.ats_record);
            }
        }
    }

    fn print_records_csv(report: &BacktestReport) {
        println!("season,week,home,away,predicted_spread,actual_spread,market_spread,spread_error,winner_correct");
        for r in &report.records {
            println!(
                "{},{},{},{},{:.1},{:.1},{},{:.1},{}",
                r.season,
                r.week,
                r.home_team,
                r.away_team,
                r.predicted_spread,
                r.actual_spread,
                r.market_spread.map(|m| format!("{:.1}", m)).unwrap_or_default(),
                r.spread_error,
                r.winner_correct
            );
        }
    }

    pub fn calibrate(
        config: &Config,
        games_path: Option<String>,
        standings_path: Option<String>,
        output: Option<String>,
    ) -> Result<()> {
        let engine = config.engine_config()?;
        let games = loader::load_games(games_path.as_deref().unwrap_or(&config.data.games_path))?;
        let book = loader::load_standings(
            standings_path
                .as_deref()
                .unwrap_or(&config.data.standings_path),
        )?;

        println!(
            "Calibrating over {} candidates (baseline {:.2})...",
            config.calibration.candidates.len(),
            config.calibration.baseline_factor
        );
        let result = super::calibrate(games, &book, &engine, &config.calibration)?;
        print_calibration(&result);

        if let Some(path) = &output {
            loader::write_json(path, &result)?;
            println!("\nResult written to {}", path);
        }
        Ok(())
    }

    pub fn walk_forward(
        config: &Config,
        games_path: Option<String>,
        standings_path: Option<String>,
        output: Option<String>,
    ) -> Result<()> {
        let engine = config.engine_config()?;
        let games = loader::load_games(games_path.as_deref().unwrap_or(&config.data.games_path))?;
        let book = loader::load_standings(
            standings_path
                .as_deref()
                .unwrap_or(&config.data.standings_path),
        )?;

        let report = super::walk_forward(&games, &book, &engine, &config.calibration.candidates)?;
        print_walk_forward(&report);

        if let Some(path) = &output {
            loader::write_json(path, &report)?;
            println!("\nReport written to {}", path);
        }
        Ok(())
    }

    fn print_walk_forward(report: &WalkForwardReport) {
        println!("\nWalk-forward validation");
        println!("───────────────────────────────");
        println!("  Season  Factor  Games  Spread MAE  ATS");
        for season in &report.seasons {
            println!(
                "  {:<6}  {:>6.2}  {:>5}  {:>10.2}  {}",
                season.season,
                season.factor.value(),
                season.metrics.games,
                season.metrics.spread_mae,
                season.ats_record
            );
        }
        println!("\n  Overall:        {}", report.ats_record);
        println!("  Spread MAE:     {:.2}", report.overall.spread_mae);
        let verdict = if report.ats_record.is_significant() {
            "significant"
        } else {
            "not significant"
        };
        println!("  p-value:        {:.4} ({} at 5%)", report.p_value, verdict);
    }

    fn print_calibration(result: &CalibrationResult) {
        println!("\nCalibration");
        println!("───────────────────────────────");
        println!("  Best factor:      {:.2}", result.best_factor);
        if let Some(train) = result.train_error {
            println!("  Train MAE:        {:.3}", train);
        }
        println!("  Validation MAE:   {:.3}", result.validation_error);
        println!("  Test MAE:         {:.3}", result.test_error);
        println!(
            "  Baseline MAE:     {:.3} (factor {:.2})",
            result.baseline_error, result.baseline_factor
        );
        println!("  Improvement:      {:+.1}%", result.improvement_pct);
        println!("  Test winner:      {:.1}%", result.test_metrics.winner_accuracy);
        println!("  Test ATS picks:   {}", result.test_ats);
    }

    pub fn config_show(config: &Config) -> Result<()> {
        let engine = config.engine_config()?;
        let source = if config.engine.custom.is_some() {
            "custom".to_string()
        } else {
            format!("preset '{}'", config.engine.preset)
        };
        println!("Engine weights ({})", source);
        println!("───────────────────────────────");
        println!("{}", serde_json::to_string_pretty(&engine)?);
        println!(
            "\nStaking: decimal odds {:.2}, {:.0}% Kelly",
            config.staking.decimal_odds,
            config.staking.kelly_fraction * 100.0
        );
        Ok(())
    }

    pub fn config_validate(path: &str) -> Result<()> {
        let engine = loader::load_engine_config(path)?;
        let errors = engine.validate();
        if errors.is_empty() {
            println!("{} is valid", path);
            Ok(())
        } else {
            for error in &errors {
                println!("  - {}", error);
            }
            Err(EngineError::InvalidConfig(errors))
        }
    }
}
