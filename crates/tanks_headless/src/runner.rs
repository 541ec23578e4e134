//! Single match runner.
//!
//! Plays one board file with one strategy per player and writes the turn log
//! next to any board warnings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tanks_core::board::TankPlacement;
use tanks_core::error::GameError;
use tanks_core::game::{GameConfig, GameManager, GameOutcome, World, DEFAULT_NO_SHELLS_STEPS};
use tanks_core::replay::Replay;
use thiserror::Error;

use crate::map_loader::{MapError, MapFile};
use crate::strategies::{Strategy, StrategyError, StrategyFactory};

/// File that collects board warnings.
pub const INPUT_ERRORS_FILE: &str = "input_errors.txt";

/// Characters not allowed in log file names.
const FORBIDDEN_FILE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Error type for running a match.
#[derive(Error, Debug)]
pub enum RunError {
    /// Board file problem.
    #[error(transparent)]
    Map(#[from] MapError),
    /// Strategy could not be resolved.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    /// Game could not be set up.
    #[error("Failed to set up game: {0}")]
    Game(#[from] GameError),
    /// Output could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// A match needs at least one player.
    #[error("No strategies given")]
    NoPlayers,
}

/// Everything about a match besides the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    /// One strategy per player, player 1 first.
    pub strategies: Vec<Strategy>,
    /// Shell-less steps before a tie.
    pub no_shells_steps: usize,
    /// Treatment of repeated tank markers.
    pub tank_placement: TankPlacement,
    /// Keep a replay of the match.
    pub record_replay: bool,
}

impl MatchSetup {
    /// Setup for the given strategies with default rules.
    #[must_use]
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self {
            strategies,
            no_shells_steps: DEFAULT_NO_SHELLS_STEPS,
            tank_placement: TankPlacement::FirstOnly,
            record_replay: false,
        }
    }

    /// Resolve each name as a built-in strategy or a RON file.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, RunError> {
        let strategies = names
            .iter()
            .map(|name| Strategy::resolve(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(strategies))
    }

    /// Keep a replay.
    #[must_use]
    pub fn with_replay(mut self) -> Self {
        self.record_replay = true;
        self
    }

    /// Set the shell-less step limit.
    #[must_use]
    pub fn with_no_shells_steps(mut self, steps: usize) -> Self {
        self.no_shells_steps = steps;
        self
    }

    /// Set repeated tank marker handling.
    #[must_use]
    pub fn with_tank_placement(mut self, placement: TankPlacement) -> Self {
        self.tank_placement = placement;
        self
    }

    /// Game rules for `map` under this setup.
    pub fn game_config(&self, map: &MapFile) -> Result<GameConfig, RunError> {
        if self.strategies.is_empty() {
            return Err(RunError::NoPlayers);
        }
        let players = u8::try_from(self.strategies.len()).map_err(|_| {
            GameError::InvalidConfig(format!("too many players: {}", self.strategies.len()))
        })?;
        Ok(GameConfig {
            max_steps: map.max_steps,
            num_shells: map.num_shells,
            no_shells_steps: self.no_shells_steps,
            players,
            tank_placement: self.tank_placement,
        })
    }

    /// Build a ready-to-run game on `map`.
    pub fn manager(&self, map: &MapFile) -> Result<GameManager, RunError> {
        let config = self.game_config(map)?;
        let layout = map.layout(&config.layout_options())?;
        let factory = StrategyFactory::new(self.strategies.clone());
        Ok(GameManager::with_basic_players(layout, config, &factory)?)
    }
}

/// A finished match.
#[derive(Debug, Clone)]
pub struct MatchReport {
    /// Map name from the board file.
    pub map_name: String,
    /// Strategy names, player 1 first.
    pub strategy_names: Vec<String>,
    /// Result, log and warnings.
    pub outcome: GameOutcome,
    /// Steps played.
    pub steps: usize,
    /// State hash after the last step.
    pub final_hash: u64,
    /// Battlefield after the last step.
    pub world: World,
    /// Replay, when recording was requested.
    pub replay: Option<Replay>,
}

impl MatchReport {
    /// `game_<p1>_vs_<p2>_<map>.txt`, with unsafe characters replaced.
    #[must_use]
    pub fn log_file_name(&self) -> String {
        let players = self.strategy_names.join("_vs_");
        sanitize_file_name(&format!("game_{players}_{}.txt", self.map_name))
    }

    /// Turn log followed by the summary, one entry per line.
    #[must_use]
    pub fn log_text(&self) -> String {
        let mut text = self.outcome.log.join("\n");
        text.push('\n');
        text
    }

    /// Write the log into `dir`, plus an input errors file if the board had
    /// warnings. Returns the log path.
    pub fn write_log(&self, dir: &Path) -> Result<PathBuf, RunError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.log_file_name());
        std::fs::write(&path, self.log_text())?;

        if !self.outcome.warnings.is_empty() {
            let mut warnings = self.outcome.warnings.join("\n");
            warnings.push('\n');
            std::fs::write(dir.join(INPUT_ERRORS_FILE), warnings)?;
        }

        tracing::debug!(path = %path.display(), "Wrote game log");
        Ok(path)
    }
}

/// Replace characters that are not allowed in file names.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_FILE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Play `map` to the end under `setup`.
pub fn run_match(map: &MapFile, setup: &MatchSetup) -> Result<MatchReport, RunError> {
    let mut game = setup.manager(map)?;
    let strategy_names: Vec<String> = setup.strategies.iter().map(|s| s.name.clone()).collect();

    tracing::info!(
        map = %map.name,
        strategies = ?strategy_names,
        "Starting match"
    );

    let (outcome, replay) = if setup.record_replay {
        let (replay, outcome) = Replay::record(map.name.clone(), map.grid.clone(), &mut game);
        (outcome, Some(replay))
    } else {
        (game.run(), None)
    };

    Ok(MatchReport {
        map_name: map.name.clone(),
        strategy_names,
        outcome,
        steps: game.step_count(),
        final_hash: game.state_hash(),
        world: game.world().clone(),
        replay,
    })
}
