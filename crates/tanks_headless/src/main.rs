//! Headless tank battle runner.
//!
//! Plays board files with built-in or RON-defined strategies, without any
//! interaction. Logs go to stderr; game logs and results go to files.
//!
//! # Usage
//!
//! ```bash
//! # Play one board, writing game_sentry_vs_shooter_<map>.txt into out/
//! cargo run -p tanks_headless -- run --map boards/duel.txt -s sentry -s shooter --output out
//!
//! # Play every board against every strategy pairing
//! cargo run -p tanks_headless -- batch --maps boards/*.txt -s sentry -s shooter -s rammer
//!
//! # Check a match plays out identically every time
//! cargo run -p tanks_headless -- verify --map boards/duel.txt --runs 10
//!
//! # Record and verify a replay
//! cargo run -p tanks_headless -- run --map boards/duel.txt --record duel.replay
//! cargo run -p tanks_headless -- replay --file duel.replay --verify
//! ```

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tanks_core::board::{LayoutOptions, TankPlacement};
use tanks_core::replay::Replay;
use tanks_headless::{
    ascii_visualizer::{initial_world, render_ascii, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    map_loader::MapFile,
    runner::{run_match, MatchSetup},
};

#[derive(Parser)]
#[command(name = "tanks_headless")]
#[command(about = "Headless tank battle runner for strategy matchups and determinism checks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single board
    Run {
        /// Board file
        #[arg(short, long)]
        map: PathBuf,

        /// Strategy per player, player 1 first (built-in name or RON file)
        #[arg(short, long = "strategy", default_values = ["sentry", "sentry"])]
        strategies: Vec<String>,

        /// Directory for the game log and input errors
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Save a replay of the game
        #[arg(long)]
        record: Option<PathBuf>,

        /// Steps without shells before the game is a tie
        #[arg(long, default_value = "40")]
        no_shells_steps: usize,

        /// Place a tank for every player marker instead of the first only
        #[arg(long)]
        all_tanks: bool,

        /// Print the final board
        #[arg(long)]
        show: bool,
    },

    /// Play every board against every strategy pairing
    Batch {
        /// Board files
        #[arg(short, long, num_args = 1.., required = true)]
        maps: Vec<PathBuf>,

        /// Strategies to pair up
        #[arg(short, long = "strategy", default_values = ["sentry", "shooter"])]
        strategies: Vec<String>,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Write a game log per match
        #[arg(long)]
        logs: bool,
    },

    /// Verify determinism by playing the same match several times
    Verify {
        /// Board file
        #[arg(short, long)]
        map: PathBuf,

        /// Strategy per player, player 1 first
        #[arg(short, long = "strategy", default_values = ["sentry", "sentry"])]
        strategies: Vec<String>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play back a recorded game
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Fail unless the replay reaches the recorded final state
        #[arg(long)]
        verify: bool,

        /// Print the game log
        #[arg(long)]
        show_log: bool,
    },

    /// Print a board file
    Render {
        /// Board file
        #[arg(short, long)]
        map: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            map,
            strategies,
            output,
            record,
            no_shells_steps,
            all_tanks,
            show,
        } => cmd_run(RunArgs {
            map,
            strategies,
            output,
            record,
            no_shells_steps,
            all_tanks,
            show,
        }),
        Commands::Batch {
            maps,
            strategies,
            parallel,
            output,
            logs,
        } => cmd_batch(maps, strategies, parallel, output, logs),
        Commands::Verify {
            map,
            strategies,
            runs,
        } => cmd_verify(map, &strategies, runs),
        Commands::Replay {
            file,
            verify,
            show_log,
        } => cmd_replay(file, verify, show_log),
        Commands::Render { map, no_color } => cmd_render(map, no_color),
    }
}

/// Print `message` and exit with a failure code.
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn load_map(path: &Path) -> MapFile {
    MapFile::load(path).unwrap_or_else(|e| fail(format!("Failed to load board: {e}")))
}

fn load_setup(strategies: &[String]) -> MatchSetup {
    MatchSetup::from_names(strategies).unwrap_or_else(|e| fail(format!("Invalid strategy: {e}")))
}

struct RunArgs {
    map: PathBuf,
    strategies: Vec<String>,
    output: PathBuf,
    record: Option<PathBuf>,
    no_shells_steps: usize,
    all_tanks: bool,
    show: bool,
}

/// Play a single board
fn cmd_run(args: RunArgs) {
    let map = load_map(&args.map);
    let mut setup = load_setup(&args.strategies).with_no_shells_steps(args.no_shells_steps);
    if args.all_tanks {
        setup = setup.with_tank_placement(TankPlacement::All);
    }
    if args.record.is_some() {
        setup = setup.with_replay();
    }

    let report = run_match(&map, &setup).unwrap_or_else(|e| fail(format!("Game failed: {e}")));

    let log_path = report
        .write_log(&args.output)
        .unwrap_or_else(|e| fail(format!("Failed to write log: {e}")));

    if let (Some(path), Some(replay)) = (&args.record, &report.replay) {
        if let Err(e) = replay.save(path) {
            fail(format!("Failed to save replay: {e}"));
        }
        eprintln!("Replay saved to: {}", path.display());
    }

    if args.show {
        let title = format!("{} after {} steps", map.name, report.steps);
        println!("{}", render_ascii(&report.world, &title, &AsciiConfig::default()));
    }

    eprintln!("{}", report.outcome.result.message);
    eprintln!("Steps: {}", report.steps);
    eprintln!("Final state hash: {:016x}", report.final_hash);
    eprintln!("Log saved to: {}", log_path.display());
}

/// Run batch of games
fn cmd_batch(
    maps: Vec<PathBuf>,
    strategies: Vec<String>,
    parallel: u32,
    output: PathBuf,
    logs: bool,
) {
    if let Err(e) = std::fs::create_dir_all(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to create output directory");
        fail(format!(
            "FATAL: Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let mut config = BatchConfig::new(maps)
        .with_strategies(&strategies)
        .with_output(output.clone());
    config.parallel_games = parallel;
    if logs {
        config = config.with_logs();
    }

    tracing::info!(
        maps = config.maps.len(),
        strategies = ?config.strategies,
        parallel = parallel,
        output = %output.display(),
        "Batch configuration"
    );

    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        tracing::error!(error = %e, path = %results_path.display(), "Failed to save results");
        fail(format!("FATAL: Failed to save results: {e}"));
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Ties: {}", results.summary.ties);
    eprintln!("Average length: {:.1} steps", results.summary.avg_steps);
    eprintln!("\nWin Rates:");
    for (strategy, rate) in &results.summary.win_rates {
        eprintln!("  {}: {:.1}%", strategy, rate * 100.0);
    }

    if !results.errors.is_empty() {
        eprintln!("\nGAME FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Game {} ({}, {}): {}",
                error.game_index,
                error.map.display(),
                error.strategies.join(" vs "),
                error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Verify determinism
fn cmd_verify(map: PathBuf, strategies: &[String], runs: u32) {
    tracing::info!(
        "Verifying determinism: {} with {:?} ({} runs)",
        map.display(),
        strategies,
        runs
    );

    let map = load_map(&map);
    let setup = load_setup(strategies);
    match verify_determinism(&map, &setup, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => fail("FAIL: Non-determinism detected!"),
        Err(e) => fail(format!("FAIL: Error during verification: {e}")),
    }
}

/// Replay a recorded game
fn cmd_replay(file: PathBuf, verify: bool, show_log: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay =
        Replay::load(&file).unwrap_or_else(|e| fail(format!("Failed to load replay: {e}")));

    eprintln!("Loaded replay:");
    eprintln!("  Map: {}", replay.map_name);
    eprintln!("  Board: {}x{}", replay.width, replay.height);
    eprintln!("  Duration: {} steps", replay.duration());

    let (outcome, matches) = replay
        .play()
        .unwrap_or_else(|e| fail(format!("FAIL: Error during playback: {e}")));

    if show_log {
        for line in &outcome.log {
            println!("{line}");
        }
    }
    eprintln!("{}", outcome.result.message);

    if matches {
        eprintln!("Replay reached the recorded final state");
        eprintln!("  Expected hash: {:016x}", replay.final_hash);
    } else if verify {
        fail(format!(
            "FAIL: Replay diverged! Expected hash {:016x} at step {}",
            replay.final_hash, replay.final_step
        ));
    } else {
        eprintln!("Warning: replay diverged from the recorded final state");
    }
}

/// Print a board file
fn cmd_render(map: PathBuf, no_color: bool) {
    let map = load_map(&map);
    let options = LayoutOptions {
        tank_placement: TankPlacement::All,
        ..LayoutOptions::default()
    };
    let layout = map
        .layout(&options)
        .unwrap_or_else(|e| fail(format!("Invalid board: {e}")));
    for warning in &layout.warnings {
        tracing::warn!("{warning}");
    }
    let world = initial_world(layout, map.num_shells);

    let config = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    let title = format!(
        "{} ({}x{}, {} steps, {} shells)",
        map.name, map.cols, map.rows, map.max_steps, map.num_shells
    );
    println!("{}", render_ascii(&world, &title, &config));
}
