//! Turn orchestration.
//!
//! [`GameManager`] owns the [`World`] for the whole game and advances it one
//! turn per [`GameManager::step`]. Every turn runs the same sequence:
//!
//! 1. snapshot the world for battle info and settle tanks,
//! 2. collect one action per live tank,
//! 3. move shells a half-step, then resolve collisions,
//! 4. apply tank actions in creation order,
//! 5. move shells the second half-step, then resolve collisions,
//! 6. drop destroyed shells and count down firing cooldowns,
//! 7. log the turn and check whether the game is over.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action::{self, ActionRequest, ActionStatus, TankTurn};
use crate::algorithm::{BasicPlayer, Player, TankAlgorithm, TankAlgorithmFactory};
use crate::board::{
    BoardLayout, GameBoard, LayoutOptions, TankPlacement, MAX_PLAYERS, MIN_PLAYERS,
};
use crate::collision::{self, CollisionReport};
use crate::direction::Direction;
use crate::error::{GameError, Result};
use crate::result::{self, EndReason, GameResult};
use crate::satellite::BattleSnapshot;
use crate::shell::Shell;
use crate::tank::{Tank, TankEffect, DEFAULT_SHELLS};

/// Consecutive shell-less steps before a game is called a tie.
pub const DEFAULT_NO_SHELLS_STEPS: usize = 40;

/// Step limit used when none is given.
pub const DEFAULT_MAX_STEPS: usize = 1000;

/// Game rules that vary between matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// The game is a tie once this many steps have been played.
    pub max_steps: usize,
    /// Shells each tank starts with.
    pub num_shells: u32,
    /// Steps without any shells left before the game is a tie.
    pub no_shells_steps: usize,
    /// Number of players; each needs at least one tank on the board.
    pub players: u8,
    /// How repeated tank markers are handled.
    pub tank_placement: TankPlacement,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            num_shells: DEFAULT_SHELLS,
            no_shells_steps: DEFAULT_NO_SHELLS_STEPS,
            players: 2,
            tank_placement: TankPlacement::FirstOnly,
        }
    }
}

impl GameConfig {
    /// Board parsing options implied by this config.
    #[must_use]
    pub const fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            players: self.players,
            tank_placement: self.tank_placement,
        }
    }

    /// Check the config for values no game can run with.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(GameError::InvalidConfig(
                "max_steps must be positive".to_string(),
            ));
        }
        if self.no_shells_steps == 0 {
            return Err(GameError::InvalidConfig(
                "no_shells_steps must be positive".to_string(),
            ));
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players) {
            return Err(GameError::InvalidConfig(format!(
                "players must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {}",
                self.players
            )));
        }
        Ok(())
    }
}

/// Everything on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct World {
    /// Terrain.
    pub board: GameBoard,
    /// Tanks in creation order. Destroyed tanks stay in place.
    pub tanks: Vec<Tank>,
    /// Shells in flight.
    pub shells: Vec<Shell>,
}

impl World {
    /// Value copy for battle info.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            board: self.board.clone(),
            tanks: self.tanks.clone(),
            shells: self.shells.clone(),
        }
    }

    /// Live tanks per player, index 0 being player 1.
    #[must_use]
    pub fn live_tanks_per_player(&self, players: u8) -> Vec<usize> {
        let mut counts = vec![0; usize::from(players)];
        for tank in self.tanks.iter().filter(|t| !t.is_destroyed()) {
            if let Some(count) = usize::from(tank.player_id())
                .checked_sub(1)
                .and_then(|i| counts.get_mut(i))
            {
                *count += 1;
            }
        }
        counts
    }

    /// Whether any live tank still has a shell.
    #[must_use]
    pub fn any_shells_left(&self) -> bool {
        self.tanks
            .iter()
            .any(|tank| !tank.is_destroyed() && tank.shells() > 0)
    }

    fn move_shells(&mut self) {
        let (width, height) = (self.board.width(), self.board.height());
        for shell in self.shells.iter_mut().filter(|s| !s.is_destroyed()) {
            shell.advance(width, height);
        }
    }

    fn resolve_collisions(&mut self) -> CollisionReport {
        collision::resolve_all_collisions(&mut self.tanks, &mut self.shells, &mut self.board)
    }
}

/// Final state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// How the game ended.
    pub result: GameResult,
    /// Turn lines followed by the two summary lines.
    pub log: Vec<String>,
    /// Board warnings collected before the game started.
    pub warnings: Vec<String>,
}

/// Runs a game turn by turn.
pub struct GameManager {
    world: World,
    config: GameConfig,
    players: Vec<Box<dyn Player>>,
    algorithms: Vec<Box<dyn TankAlgorithm>>,
    step: usize,
    shells_countdown: usize,
    log: Vec<String>,
    warnings: Vec<String>,
    last_turn: Vec<TankTurn>,
    result: Option<GameResult>,
}

impl std::fmt::Debug for GameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameManager")
            .field("step", &self.step)
            .field("tanks", &self.world.tanks.len())
            .field("shells", &self.world.shells.len())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl GameManager {
    /// Set up a game from a parsed board.
    ///
    /// `players` holds one [`Player`] per player id, player 1 first. Every
    /// tank gets its own algorithm from `factory`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid config, a player count that does not match
    /// `players`, or a board whose tanks do not fit the config.
    pub fn new(
        layout: BoardLayout,
        config: GameConfig,
        players: Vec<Box<dyn Player>>,
        factory: &dyn TankAlgorithmFactory,
    ) -> Result<Self> {
        config.validate()?;
        if players.len() != usize::from(config.players) {
            return Err(GameError::InvalidConfig(format!(
                "expected {} players, got {}",
                config.players,
                players.len()
            )));
        }

        let BoardLayout {
            board,
            tank_positions,
            warnings,
        } = layout;

        let mut tanks: Vec<Tank> = Vec::with_capacity(tank_positions.len());
        for (player_id, position) in tank_positions {
            if player_id == 0 || player_id > config.players {
                return Err(GameError::InvalidConfig(format!(
                    "tank for player {player_id} in a {}-player game",
                    config.players
                )));
            }
            let tank_index = tanks.iter().filter(|t| t.player_id() == player_id).count();
            tanks.push(Tank::new(
                player_id,
                tank_index,
                board.wrap_position(position),
                Direction::initial_for_player(player_id),
                config.num_shells,
            ));
        }
        for player_id in 1..=config.players {
            if !tanks.iter().any(|t| t.player_id() == player_id) {
                return Err(GameError::MissingTank(player_id));
            }
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        let algorithms = tanks
            .iter()
            .map(|tank| factory.create(tank.player_id(), tank.tank_index()))
            .collect();

        tracing::info!(
            width = board.width(),
            height = board.height(),
            tanks = tanks.len(),
            players = config.players,
            max_steps = config.max_steps,
            "Game created"
        );

        Ok(Self {
            world: World {
                board,
                tanks,
                shells: Vec::new(),
            },
            shells_countdown: config.no_shells_steps,
            config,
            players,
            algorithms,
            step: 0,
            log: Vec::new(),
            warnings,
            last_turn: Vec::new(),
            result: None,
        })
    }

    /// Set up a game where every player is a [`BasicPlayer`].
    ///
    /// # Errors
    ///
    /// Same as [`GameManager::new`].
    pub fn with_basic_players(
        layout: BoardLayout,
        config: GameConfig,
        factory: &dyn TankAlgorithmFactory,
    ) -> Result<Self> {
        let (width, height) = (layout.board.width(), layout.board.height());
        let players = (1..=config.players)
            .map(|id| Box::new(BasicPlayer::new(id, width, height)) as Box<dyn Player>)
            .collect();
        Self::new(layout, config, players, factory)
    }

    /// Play one turn.
    ///
    /// Returns the result once the game is over. Calling this on a finished
    /// game does nothing.
    pub fn step(&mut self) -> Option<&GameResult> {
        if self.result.is_some() {
            return self.result.as_ref();
        }
        self.step += 1;

        let snapshot = self.world.snapshot();
        for tank in &mut self.world.tanks {
            tank.settle();
        }

        let was_dead: Vec<bool> = self.world.tanks.iter().map(Tank::is_destroyed).collect();
        let actions: Vec<ActionRequest> = self
            .world
            .tanks
            .iter()
            .zip(self.algorithms.iter_mut())
            .map(|(tank, algorithm)| {
                if tank.is_destroyed() {
                    ActionRequest::DoNothing
                } else {
                    algorithm.get_action()
                }
            })
            .collect();

        self.world.move_shells();
        self.world.resolve_collisions();

        let applied = self.apply_actions(&actions, &snapshot);

        self.world.move_shells();
        self.world.resolve_collisions();

        self.world.shells.retain(|shell| !shell.is_destroyed());
        for tank in &mut self.world.tanks {
            tank.update_cooldowns();
        }

        self.last_turn = self
            .world
            .tanks
            .iter()
            .enumerate()
            .map(|(i, tank)| {
                let status = if was_dead[i] {
                    ActionStatus::Dead
                } else if tank.is_destroyed() {
                    ActionStatus::Killed
                } else if applied[i] {
                    ActionStatus::Applied
                } else {
                    ActionStatus::Ignored
                };
                TankTurn {
                    action: actions[i],
                    status,
                }
            })
            .collect();
        let line = action::format_turn(&self.last_turn);
        tracing::debug!(step = self.step, shells = self.world.shells.len(), "{line}");
        self.log.push(line);

        if !self.world.any_shells_left() {
            self.shells_countdown = self.shells_countdown.saturating_sub(1);
        }

        if let Some(result) = self.evaluate() {
            tracing::info!(
                steps = self.step,
                winner = ?result.winner,
                reason = ?result.reason,
                "Game over: {}",
                result.message
            );
            self.log.push(format!("Game ended after {} steps", self.step));
            self.log.push(format!("Result: {}", result.message));
            self.result = Some(result);
        }
        self.result.as_ref()
    }

    /// Apply each live tank's action in creation order. Returns which
    /// actions were honored.
    fn apply_actions(&mut self, actions: &[ActionRequest], snapshot: &BattleSnapshot) -> Vec<bool> {
        let mut applied = vec![false; actions.len()];
        for (i, &request) in actions.iter().enumerate() {
            let tank = &mut self.world.tanks[i];
            if tank.is_destroyed() {
                continue;
            }
            let response = tank.apply_action(request, &self.world.board);
            applied[i] = response.applied;

            match response.effect {
                TankEffect::None => {}
                TankEffect::Fire => {
                    let shell = Shell::new(tank.player_id(), tank.position(), tank.direction());
                    self.world.shells.push(shell);
                }
                TankEffect::BattleInfo => {
                    let view = snapshot.view_for(tank.position());
                    let player = usize::from(tank.player_id()) - 1;
                    self.players[player]
                        .update_tank_with_battle_info(self.algorithms[i].as_mut(), &view);
                }
            }
        }
        applied
    }

    fn evaluate(&self) -> Option<GameResult> {
        let remaining = self.world.live_tanks_per_player(self.config.players);
        let players = usize::from(self.config.players);
        let alive: Vec<(usize, usize)> = remaining
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, n)| n > 0)
            .collect();

        let (winner, reason, message) = match alive.as_slice() {
            [(index, tanks)] => {
                let id = u8::try_from(index + 1).unwrap_or(u8::MAX);
                (Some(id), EndReason::AllTanksDead, result::win_message(id, *tanks))
            }
            [] => (None, EndReason::AllTanksDead, result::no_tanks_message(players)),
            _ if self.shells_countdown == 0 => (
                None,
                EndReason::ZeroShells,
                result::no_shells_message(players, self.config.no_shells_steps),
            ),
            _ if self.step >= self.config.max_steps => (
                None,
                EndReason::MaxSteps,
                result::max_steps_message(self.config.max_steps, &remaining),
            ),
            _ => return None,
        };

        Some(GameResult {
            winner,
            reason,
            remaining_tanks: remaining,
            rounds: self.step,
            message,
        })
    }

    /// Play until the game ends.
    pub fn run(&mut self) -> GameOutcome {
        loop {
            if let Some(result) = self.step() {
                return GameOutcome {
                    result: result.clone(),
                    log: self.log.clone(),
                    warnings: self.warnings.clone(),
                };
            }
        }
    }

    /// Deterministic hash of the world and the turn counters.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.step.hash(&mut hasher);
        self.shells_countdown.hash(&mut hasher);
        self.world.hash(&mut hasher);
        hasher.finish()
    }

    /// Current world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Rules in effect.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Steps played so far.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.step
    }

    /// Result, once the game is over.
    #[must_use]
    pub const fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Log lines so far.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Board warnings.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Per-tank entries of the last turn.
    #[must_use]
    pub fn last_turn(&self) -> &[TankTurn] {
        &self.last_turn
    }

    /// Actions requested in the last turn, one per tank.
    #[must_use]
    pub fn last_turn_actions(&self) -> Vec<ActionRequest> {
        self.last_turn.iter().map(|turn| turn.action).collect()
    }
}
