//! Replay system for recording and playing back games.
//!
//! A replay stores the board the game started from, its config and the
//! action every tank requested on every turn. Since the simulation is
//! deterministic, feeding those actions back reproduces the game exactly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;

use crate::action::ActionRequest;
use crate::algorithm::{BattleInfo, TankAlgorithm, TankAlgorithmFactory};
use crate::board::{BoardLayout, GameBoard};
use crate::error::{GameError, Result};
use crate::game::{GameConfig, GameManager, GameOutcome};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Name of the map played.
    pub map_name: String,
    /// Board width.
    pub width: usize,
    /// Board height.
    pub height: usize,
    /// Board rows as read from the map, tank markers included.
    pub grid: Vec<String>,
    /// Rules the game ran with.
    pub config: GameConfig,
    /// Requested actions per turn, one per tank in creation order.
    pub turns: Vec<Vec<ActionRequest>>,
    /// Step on which the game ended.
    pub final_step: usize,
    /// State hash after the final step.
    pub final_hash: u64,
}

impl Replay {
    /// Start an empty replay for a game on `grid`.
    #[must_use]
    pub fn new(
        map_name: impl Into<String>,
        width: usize,
        height: usize,
        grid: Vec<String>,
        config: GameConfig,
    ) -> Self {
        Self {
            version: REPLAY_VERSION,
            map_name: map_name.into(),
            width,
            height,
            grid,
            config,
            turns: Vec::new(),
            final_step: 0,
            final_hash: 0,
        }
    }

    /// Record the actions of one turn.
    pub fn record_turn(&mut self, actions: Vec<ActionRequest>) {
        self.turns.push(actions);
    }

    /// Finalize the replay with end-game state.
    pub fn finalize(&mut self, final_step: usize, final_hash: u64) {
        self.final_step = final_step;
        self.final_hash = final_hash;
    }

    /// Play `game` to the end, recording every turn into a new replay.
    pub fn record(
        map_name: impl Into<String>,
        grid: Vec<String>,
        game: &mut GameManager,
    ) -> (Self, GameOutcome) {
        let board = &game.world().board;
        let mut replay = Self::new(
            map_name,
            board.width(),
            board.height(),
            grid,
            game.config().clone(),
        );
        while game.step().is_none() {
            replay.record_turn(game.last_turn_actions());
        }
        replay.record_turn(game.last_turn_actions());
        replay.finalize(game.step_count(), game.state_hash());

        let outcome = game.run();
        (replay, outcome)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Rebuild the starting board.
    ///
    /// # Errors
    /// Returns an error if the stored grid no longer parses.
    pub fn layout(&self) -> Result<BoardLayout> {
        GameBoard::from_lines(
            self.width,
            self.height,
            self.grid.as_slice(),
            &self.config.layout_options(),
        )
    }

    /// Set up a game that replays the recorded actions.
    ///
    /// # Errors
    /// Returns an error if the board or config is unusable.
    pub fn manager(&self) -> Result<GameManager> {
        let layout = self.layout()?;
        let factory = ReplayFactory::new(self, &layout);
        GameManager::with_basic_players(layout, self.config.clone(), &factory)
    }

    /// Play the replay to the end.
    ///
    /// Returns the outcome and whether the final state matched the recording.
    ///
    /// # Errors
    /// Returns an error if the game cannot be set up.
    pub fn play(&self) -> Result<(GameOutcome, bool)> {
        let mut game = self.manager()?;
        let outcome = game.run();
        let matches = game.step_count() == self.final_step && game.state_hash() == self.final_hash;
        if !matches {
            tracing::warn!(
                expected_step = self.final_step,
                actual_step = game.step_count(),
                "Replay diverged from recording"
            );
        }
        Ok((outcome, matches))
    }

    /// Number of recorded turns.
    #[must_use]
    pub fn duration(&self) -> usize {
        self.turns.len()
    }
}

/// Builds algorithms that repeat a replay's recorded actions.
#[derive(Debug, Clone)]
pub struct ReplayFactory {
    turns: Rc<Vec<Vec<ActionRequest>>>,
    /// `(player_id, tank_index)` for each tank in creation order.
    tanks: Vec<(u8, usize)>,
}

impl ReplayFactory {
    /// Factory for `replay` played on `layout`.
    #[must_use]
    pub fn new(replay: &Replay, layout: &BoardLayout) -> Self {
        let mut tanks: Vec<(u8, usize)> = Vec::with_capacity(layout.tank_positions.len());
        for &(player_id, _) in &layout.tank_positions {
            let index = tanks.iter().filter(|(p, _)| *p == player_id).count();
            tanks.push((player_id, index));
        }
        Self {
            turns: Rc::new(replay.turns.clone()),
            tanks,
        }
    }
}

impl TankAlgorithmFactory for ReplayFactory {
    fn create(&self, player_id: u8, tank_index: usize) -> Box<dyn TankAlgorithm> {
        let slot = self
            .tanks
            .iter()
            .position(|&tank| tank == (player_id, tank_index))
            .unwrap_or(usize::MAX);
        Box::new(ReplayAlgorithm {
            turns: Rc::clone(&self.turns),
            slot,
            turn: 0,
        })
    }
}

/// Plays back one tank's recorded actions.
#[derive(Debug)]
struct ReplayAlgorithm {
    turns: Rc<Vec<Vec<ActionRequest>>>,
    slot: usize,
    turn: usize,
}

impl TankAlgorithm for ReplayAlgorithm {
    fn get_action(&mut self) -> ActionRequest {
        let action = self
            .turns
            .get(self.turn)
            .and_then(|turn| turn.get(self.slot))
            .copied()
            .unwrap_or(ActionRequest::DoNothing);
        self.turn += 1;
        action
    }

    fn update_battle_info(&mut self, _info: &BattleInfo) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recorded() -> (Replay, GameOutcome) {
        let grid = vec!["1 #  ".to_string(), "  @ 2".to_string()];
        let config = GameConfig {
            max_steps: 30,
            ..GameConfig::default()
        };
        let layout = GameBoard::from_lines(5, 2, grid.as_slice(), &config.layout_options()).unwrap();
        let factory = |player: u8, _index: usize| -> Box<dyn TankAlgorithm> {
            let script = if player == 1 {
                [ActionRequest::Shoot, ActionRequest::RotateRight45, ActionRequest::MoveForward]
            } else {
                [ActionRequest::MoveBackward, ActionRequest::Shoot, ActionRequest::RotateLeft90]
            };
            Box::new(Cycle { script, at: 0 })
        };
        let mut game = GameManager::with_basic_players(layout, config, &factory).unwrap();
        Replay::record("two_rows", grid, &mut game)
    }

    struct Cycle {
        script: [ActionRequest; 3],
        at: usize,
    }

    impl TankAlgorithm for Cycle {
        fn get_action(&mut self) -> ActionRequest {
            let action = self.script[self.at % self.script.len()];
            self.at += 1;
            action
        }

        fn update_battle_info(&mut self, _info: &BattleInfo) {}
    }

    #[test]
    fn test_record_and_play() {
        let (replay, outcome) = recorded();
        assert_eq!(replay.duration(), replay.final_step);
        assert_eq!(outcome.result.rounds, replay.final_step);

        let (played, matches) = replay.play().unwrap();
        assert!(matches);
        assert_eq!(played.log, outcome.log);
    }

    #[test]
    fn test_save_and_load() {
        let (replay, _) = recorded();
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.replay");
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded, replay);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let (mut replay, _) = recorded();
        replay.version = REPLAY_VERSION + 1;
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.replay");
        replay.save(&path).unwrap();
        assert!(matches!(
            Replay::load(&path),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_tampered_replay_diverges() {
        let (mut replay, _) = recorded();
        replay.final_hash ^= 1;
        let (_, matches) = replay.play().unwrap();
        assert!(!matches);
    }
}
