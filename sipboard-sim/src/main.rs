mod reports;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sipboard_game::{Board, JsonTileSource, SimConfig, Simulation, SimulationReport, TileSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Markdown document with every table
    Markdown,
    /// Colored terminal summary
    Console,
    /// Machine-readable report
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sipboard-sim", version)]
#[command(about = "Monte Carlo simulator for the Sipboard drinking board game")]
struct Args {
    /// Board definition (`{"tiles": [...]}` JSON); defaults to the bundled Kanto board
    #[arg(long)]
    board: Option<PathBuf>,

    /// Simulation config JSON; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of games to simulate
    #[arg(long)]
    games: Option<u32>,

    /// Players per game
    #[arg(long)]
    players: Option<u32>,

    /// Seed for every random stream
    #[arg(long)]
    seed: Option<u64>,

    /// Precomputed combat outcomes per gym
    #[arg(long)]
    combat_samples: Option<u32>,

    /// Round cap per game
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();
    let board = load_board(args.board.as_deref())?;
    let config = resolve_config(&args)?;
    let simulation = Simulation::new(board, config).context("invalid simulation config")?;
    let report = simulation.report();
    log::info!("simulation finished in {:?}", start_time.elapsed());

    write_report(&args, &report, start_time.elapsed())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_board(path: Option<&Path>) -> Result<Board> {
    let source = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read board {}", path.display()))?;
            JsonTileSource::new(json)
        }
        None => JsonTileSource::bundled(),
    };
    let board = source.load_board().context("failed to load board")?;
    log::debug!(
        "board: {} tiles, {} gyms, {} optional stops",
        board.len(),
        board.gyms().len(),
        board.optional_stops().len()
    );
    Ok(board)
}

fn resolve_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimConfig::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    apply_overrides(&mut config, args);
    config.validate().context("invalid simulation config")?;
    Ok(config)
}

fn apply_overrides(config: &mut SimConfig, args: &Args) {
    if let Some(games) = args.games {
        config.games = games;
    }
    if let Some(players) = args.players {
        config.players = players;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(samples) = args.combat_samples {
        config.combat_samples = samples;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
}

fn write_report(args: &Args, report: &SimulationReport, elapsed: Duration) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;

    match args.report {
        ReportFormat::Json => reports::generate_json_report(out.as_mut(), report)?,
        ReportFormat::Markdown => reports::generate_markdown_report(out.as_mut(), report)?,
        ReportFormat::Console => reports::generate_console_report(out.as_mut(), report, elapsed)?,
    }
    out.flush().context("failed to flush report")?;

    if let Some(path) = &args.output {
        eprintln!(
            "{} {}",
            "Report written to".green(),
            path.display().to_string().bold()
        );
    }
    Ok(())
}

/// Buffered report sink: the `--output` file, or stdout.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(stdout().lock())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            board: None,
            config: None,
            games: Some(20),
            players: None,
            seed: None,
            combat_samples: Some(200),
            max_rounds: None,
            report: ReportFormat::Json,
            output: None,
            verbose: false,
        }
    }

    fn small_report() -> SimulationReport {
        let config = SimConfig {
            games: 20,
            combat_samples: 200,
            tile_probe_samples: 50,
            ..SimConfig::default()
        };
        Simulation::new(Board::bundled().unwrap(), config)
            .unwrap()
            .report()
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sipboard-{name}-{}", std::process::id()))
    }

    #[test]
    fn flags_override_config_file() {
        let path = temp_file("config.json");
        std::fs::write(&path, r#"{"games": 999, "players": 2, "seed": 7}"#).unwrap();
        let args = Args {
            config: Some(path),
            players: Some(3),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.games, 20);
        assert_eq!(config.players, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.combat_samples, 200);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args {
            players: Some(0),
            ..base_args()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn missing_board_file_is_an_error() {
        let err = load_board(Some(Path::new("/nonexistent/board.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read board"));
    }

    #[test]
    fn bundled_board_loads_by_default() {
        let board = load_board(None).unwrap();
        assert_eq!(board.gyms().len(), 10);
    }

    #[test]
    fn write_report_emits_each_format() {
        let report = small_report();
        for (format, needle) in [
            (ReportFormat::Json, "\"headline\""),
            (ReportFormat::Markdown, "# Sipboard Simulation Report"),
            (ReportFormat::Console, "Sipboard Simulation Summary"),
        ] {
            let path = temp_file(&format!("{format:?}.out"));
            let args = Args {
                report: format,
                output: Some(path.clone()),
                ..base_args()
            };
            write_report(&args, &report, Duration::from_millis(5)).unwrap();
            let content = std::fs::read_to_string(path).unwrap();
            assert!(content.contains(needle), "{format:?}");
        }
    }

    #[test]
    fn output_falls_back_to_stdout() {
        let mut out = open_output(None).unwrap();
        out.write_all(b"ok").unwrap();
        out.flush().unwrap();
    }

    #[test]
    fn unwritable_output_path_is_an_error() {
        let err = open_output(Some(Path::new("/nonexistent/dir/report.md"))).err().unwrap();
        assert!(err.to_string().contains("failed to create"));
    }
}
