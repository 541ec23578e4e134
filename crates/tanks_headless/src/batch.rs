//! Batch match runner for comparing strategies.
//!
//! Plays every map against every ordered pair of strategies in parallel
//! using rayon and collects the outcomes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tanks_core::game::DEFAULT_NO_SHELLS_STEPS;
use tanks_core::result::EndReason;
use tracing::{debug, info, warn};

use crate::map_loader::MapFile;
use crate::runner::{run_match, MatchSetup, RunError};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Board files to play
    pub maps: Vec<PathBuf>,
    /// Strategy names or RON files; every ordered pair is played
    pub strategies: Vec<String>,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Write a turn log for every game
    pub write_logs: bool,
    /// Shell-less steps before a tie
    pub no_shells_steps: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            maps: Vec::new(),
            strategies: vec!["sentry".to_string(), "shooter".to_string()],
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            write_logs: false,
            no_shells_steps: DEFAULT_NO_SHELLS_STEPS,
        }
    }
}

impl BatchConfig {
    /// Create config for a set of maps
    pub fn new(maps: Vec<PathBuf>) -> Self {
        Self {
            maps,
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set strategies
    #[must_use]
    pub fn with_strategies<S: AsRef<str>>(mut self, strategies: &[S]) -> Self {
        self.strategies = strategies.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Write per-game logs into the output directory
    #[must_use]
    pub fn with_logs(mut self) -> Self {
        self.write_logs = true;
        self
    }

    /// Every (map, player 1 strategy, player 2 strategy) to play
    pub fn pairings(&self) -> Vec<(PathBuf, String, String)> {
        let mut pairings = Vec::new();
        for map in &self.maps {
            for first in &self.strategies {
                for second in &self.strategies {
                    pairings.push((map.clone(), first.clone(), second.clone()));
                }
            }
        }
        pairings
    }
}

/// Outcome of one game in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Game index
    pub game_index: u32,
    /// Map name
    pub map: String,
    /// Strategy names, player 1 first
    pub strategies: Vec<String>,
    /// Winning player
    pub winner: Option<u8>,
    /// How the game ended
    pub reason: EndReason,
    /// Steps played
    pub steps: usize,
    /// Live tanks per player at the end
    pub remaining_tanks: Vec<usize>,
    /// Final state hash
    pub final_hash: u64,
}

impl GameRecord {
    /// Strategy of the winning player
    pub fn winner_strategy(&self) -> Option<&str> {
        let index = usize::from(self.winner?).checked_sub(1)?;
        self.strategies.get(index).map(String::as_str)
    }
}

/// Aggregate over all games of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games completed
    pub total_games: u32,
    /// Wins by player slot
    pub wins_per_player: BTreeMap<u8, u32>,
    /// Wins by strategy
    pub wins_per_strategy: BTreeMap<String, u32>,
    /// Games without a winner
    pub ties: u32,
    /// Share of played games each strategy won
    pub win_rates: BTreeMap<String, f64>,
    /// Average game length in steps
    pub avg_steps: f64,
}

impl BatchSummary {
    /// Summarize completed games
    pub fn from_games(games: &[GameRecord]) -> Self {
        let mut summary = Self {
            total_games: games.len() as u32,
            ..Self::default()
        };
        let mut played: BTreeMap<String, u32> = BTreeMap::new();

        for game in games {
            for name in &game.strategies {
                *played.entry(name.clone()).or_insert(0) += 1;
            }
            match game.winner {
                Some(player) => {
                    *summary.wins_per_player.entry(player).or_insert(0) += 1;
                    if let Some(name) = game.winner_strategy() {
                        *summary.wins_per_strategy.entry(name.to_string()).or_insert(0) += 1;
                    }
                }
                None => summary.ties += 1,
            }
        }

        summary.win_rates = played
            .iter()
            .map(|(name, &count)| {
                let wins = summary.wins_per_strategy.get(name).copied().unwrap_or(0);
                (name.clone(), f64::from(wins) / f64::from(count.max(1)))
            })
            .collect();
        if !games.is_empty() {
            summary.avg_steps =
                games.iter().map(|g| g.steps as f64).sum::<f64>() / games.len() as f64;
        }
        summary
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game outcomes
    pub games: Vec<GameRecord>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Board file
    pub map: PathBuf,
    /// Strategy names, player 1 first
    pub strategies: Vec<String>,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games
    pub total: u32,
    /// Completed games
    pub completed: Arc<AtomicU32>,
    /// Start time
    pub start_time: Instant,
    /// Partial results for live stats
    partial_wins: Arc<Mutex<BTreeMap<String, u32>>>,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: Arc::new(AtomicU32::new(0)),
            start_time: Instant::now(),
            partial_wins: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Record a completed game
    pub fn record_completion(&self, winner: Option<&str>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(w) = winner {
            if let Ok(mut wins) = self.partial_wins.lock() {
                *wins.entry(w.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }

    /// Get current win counts by strategy
    pub fn current_wins(&self) -> BTreeMap<String, u32> {
        self.partial_wins
            .lock()
            .map(|wins| wins.clone())
            .unwrap_or_default()
    }

    /// Display progress to stderr
    pub fn display(&self) {
        let eta = self.eta();
        eprintln!(
            "Batch progress: {}/{} ({:.1}%), ETA {}m {}s",
            self.current(),
            self.total,
            self.percentage(),
            eta.as_secs() / 60,
            eta.as_secs() % 60
        );
        for (strategy, wins) in self.current_wins() {
            eprintln!("  {strategy:<12}: {wins} wins");
        }
    }
}

/// Play one pairing.
fn run_single_game(
    game_index: u32,
    map_path: &Path,
    strategies: &[String],
    config: &BatchConfig,
) -> Result<GameRecord, RunError> {
    let map = MapFile::load(map_path)?;
    let setup = MatchSetup::from_names(strategies)?.with_no_shells_steps(config.no_shells_steps);
    let report = run_match(&map, &setup)?;

    if config.write_logs {
        let dir = config.output_dir.join("logs").join(format!("game_{game_index}"));
        report.write_log(&dir)?;
    }

    Ok(GameRecord {
        game_index,
        map: report.map_name,
        strategies: report.strategy_names,
        winner: report.outcome.result.winner,
        reason: report.outcome.result.reason,
        steps: report.steps,
        remaining_tanks: report.outcome.result.remaining_tanks,
        final_hash: report.final_hash,
    })
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let pairings = config.pairings();
    let total = pairings.len() as u32;
    let progress = Arc::new(BatchProgress::new(total));

    info!(
        "Starting batch run: {} games over {} maps and {} strategies",
        total,
        config.maps.len(),
        config.strategies.len()
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<GameRecord, BatchError>> = pairings
        .into_par_iter()
        .enumerate()
        .map(|(i, (map, first, second))| {
            let game_index = i as u32;
            let strategies = vec![first, second];

            match run_single_game(game_index, &map, &strategies, &config) {
                Ok(record) => {
                    progress.record_completion(record.winner_strategy());

                    let completed = progress.current();
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, total);
                    }
                    if completed % 100 == 0 {
                        progress.display();
                    }

                    Ok(record)
                }
                Err(e) => {
                    warn!("Game {} failed: {}", i, e);
                    Err(BatchError {
                        game_index,
                        map,
                        strategies,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameRecord> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same match `runs` times and check every run ends identically
pub fn verify_determinism(map: &MapFile, setup: &MatchSetup, runs: u32) -> Result<bool, RunError> {
    let mut first: Option<(usize, u64, Vec<String>)> = None;
    for run in 0..runs {
        let report = run_match(map, setup)?;
        let fingerprint = (report.steps, report.final_hash, report.outcome.log);
        match &first {
            None => first = Some(fingerprint),
            Some(expected) if *expected != fingerprint => {
                warn!(run, "Run diverged from the first");
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::Strategy;

    fn write_map(dir: &Path, name: &str, grid: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(
            &path,
            format!("{name}\nMaxSteps = 60\nNumShells = 4\nRows = 3\nCols = 7\n{grid}"),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert!(config.maps.is_empty());
        assert_eq!(config.strategies.len(), 2);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")])
            .with_output(PathBuf::from("/tmp/results"))
            .with_strategies(&["idle", "shooter", "rammer"]);

        assert_eq!(config.output_dir, PathBuf::from("/tmp/results"));
        assert_eq!(config.pairings().len(), 18);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_completion(Some("sentry"));
        progress.record_completion(None);
        progress.record_completion(Some("sentry"));

        assert_eq!(progress.current(), 3);
        assert_eq!(progress.current_wins()["sentry"], 2);
    }

    #[test]
    fn test_summary_counts() {
        let record = |winner, strategies: [&str; 2]| GameRecord {
            game_index: 0,
            map: "m".to_string(),
            strategies: strategies.iter().map(|s| (*s).to_string()).collect(),
            winner,
            reason: EndReason::AllTanksDead,
            steps: 10,
            remaining_tanks: vec![1, 0],
            final_hash: 0,
        };
        let games = vec![
            record(Some(1), ["shooter", "idle"]),
            record(Some(2), ["idle", "shooter"]),
            record(None, ["idle", "idle"]),
        ];
        let summary = BatchSummary::from_games(&games);

        assert_eq!(summary.total_games, 3);
        assert_eq!(summary.ties, 1);
        assert_eq!(summary.wins_per_player[&1], 1);
        assert_eq!(summary.wins_per_strategy["shooter"], 2);
        assert!((summary.win_rates["shooter"] - 1.0).abs() < f64::EPSILON);
        assert!(summary.win_rates["idle"].abs() < f64::EPSILON);
        assert!((summary.avg_steps - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_batch_small() {
        let dir = tempfile::tempdir().unwrap();
        let map = write_map(dir.path(), "lane", "2     1\n       \n #   # \n");
        let config = BatchConfig::new(vec![map])
            .with_strategies(&["idle", "shooter"])
            .with_output(dir.path().join("out"))
            .with_logs();

        let results = run_batch(config);
        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);

        let shooter_vs_idle = results
            .games
            .iter()
            .find(|g| g.strategies == ["shooter", "idle"])
            .unwrap();
        assert_eq!(shooter_vs_idle.winner, Some(1));
        assert!(dir
            .path()
            .join("out/logs")
            .read_dir()
            .unwrap()
            .next()
            .is_some());
    }

    #[test]
    fn test_run_batch_reports_bad_maps() {
        let config = BatchConfig::new(vec![PathBuf::from("/no/such/map.txt")])
            .with_strategies(&["idle"]);
        let results = run_batch(config);
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 1);
        assert!(results.errors[0].message.contains("not found"));
    }

    #[test]
    fn test_verify_determinism() {
        let map = MapFile::parse(
            "m\nMaxSteps = 80\nNumShells = 6\nRows = 3\nCols = 7\n2  #  1\n  @    \n #     \n",
        )
        .unwrap();
        let setup = MatchSetup::new(vec![Strategy::sentry(), Strategy::rammer()]);
        assert!(verify_determinism(&map, &setup, 4).unwrap());
    }

    #[test]
    fn test_batch_results_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let map = write_map(dir.path(), "lane", "2     1\n       \n       \n");
        let results = run_batch(BatchConfig::new(vec![map]).with_strategies(&["idle"]));

        let path = dir.path().join("results.json");
        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.strategies, vec!["idle"]);
    }
}
