//! Tank strategies for headless matches.
//!
//! A [`Strategy`] names a behavior for every tank of one player. Strategies
//! come from a built-in name (`"sentry"`, `"shooter"`, ...) or a RON file:
//!
//! ```ron
//! (
//!     name: "Zigzag",
//!     description: "Advance while weaving",
//!     behavior: Scripted(
//!         actions: [MoveForward, RotateLeft45, MoveForward, RotateRight45, Shoot],
//!         repeat: true,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tanks_core::action::ActionRequest;
use tanks_core::algorithm::{BattleInfo, TankAlgorithm, TankAlgorithmFactory};
use tanks_core::direction::Direction;
use tanks_core::geometry::Point;
use thiserror::Error;

/// Battle info refresh interval for the built-in sentry.
pub const DEFAULT_SCAN_INTERVAL: usize = 4;

/// Error type for strategy operations.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// File not found.
    #[error("Strategy file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse strategy: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Neither a built-in name nor an existing file.
    #[error("Unknown strategy '{0}'")]
    Unknown(String),
}

/// How each tank of a player behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategySpec {
    /// Never act.
    DoNothing,
    /// Fire every turn.
    AlwaysShoot,
    /// Drive forward every turn.
    AlwaysForward,
    /// Play a fixed list of actions, then idle or start over.
    Scripted {
        /// Actions in order.
        actions: Vec<ActionRequest>,
        /// Start over after the last action.
        repeat: bool,
    },
    /// Hold position, scan with battle info and fire at enemies in line.
    Sentry {
        /// Turns between battle info requests.
        scan_interval: usize,
    },
}

/// A named strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy name, used in log file names.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tank behavior.
    pub behavior: StrategySpec,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::sentry()
    }
}

impl Strategy {
    /// Names accepted by [`Strategy::builtin`].
    pub const BUILTIN_NAMES: [&'static str; 4] = ["idle", "shooter", "rammer", "sentry"];

    /// Load a strategy from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StrategyError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let strategy: Strategy = ron::from_str(&contents)?;
        Ok(strategy)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, StrategyError> {
        let strategy: Strategy = ron::from_str(ron)?;
        Ok(strategy)
    }

    /// Look up a built-in strategy by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "idle" | "do_nothing" => Some(Self::idle()),
            "shooter" | "always_shoot" => Some(Self::shooter()),
            "rammer" | "always_forward" => Some(Self::rammer()),
            "sentry" => Some(Self::sentry()),
            _ => None,
        }
    }

    /// A built-in name, or else a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, StrategyError> {
        if let Some(strategy) = Self::builtin(name_or_path) {
            return Ok(strategy);
        }
        if Path::new(name_or_path).exists() {
            return Self::load(name_or_path);
        }
        Err(StrategyError::Unknown(name_or_path.to_string()))
    }

    /// Tanks that never act.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            description: "Sits still for the whole game".to_string(),
            behavior: StrategySpec::DoNothing,
        }
    }

    /// Tanks that fire every turn in their starting direction.
    #[must_use]
    pub fn shooter() -> Self {
        Self {
            name: "shooter".to_string(),
            description: "Fires every turn without moving".to_string(),
            behavior: StrategySpec::AlwaysShoot,
        }
    }

    /// Tanks that drive straight ahead.
    #[must_use]
    pub fn rammer() -> Self {
        Self {
            name: "rammer".to_string(),
            description: "Drives forward every turn".to_string(),
            behavior: StrategySpec::AlwaysForward,
        }
    }

    /// Tanks that scan and fire at enemies in line.
    #[must_use]
    pub fn sentry() -> Self {
        Self {
            name: "sentry".to_string(),
            description: "Holds position, turns toward enemies and fires".to_string(),
            behavior: StrategySpec::Sentry {
                scan_interval: DEFAULT_SCAN_INTERVAL,
            },
        }
    }

    /// Algorithm for one tank of `player_id`.
    #[must_use]
    pub fn algorithm(&self, player_id: u8) -> Box<dyn TankAlgorithm> {
        match &self.behavior {
            StrategySpec::DoNothing => Box::new(ScriptAlgorithm::new(Vec::new(), false)),
            StrategySpec::AlwaysShoot => {
                Box::new(ScriptAlgorithm::new(vec![ActionRequest::Shoot], true))
            }
            StrategySpec::AlwaysForward => {
                Box::new(ScriptAlgorithm::new(vec![ActionRequest::MoveForward], true))
            }
            StrategySpec::Scripted { actions, repeat } => {
                Box::new(ScriptAlgorithm::new(actions.clone(), *repeat))
            }
            StrategySpec::Sentry { scan_interval } => Box::new(SentryAlgorithm::new(
                player_id,
                (*scan_interval).max(1),
            )),
        }
    }
}

/// Builds algorithms from one strategy per player, player 1 first.
#[derive(Debug, Clone)]
pub struct StrategyFactory {
    strategies: Vec<Strategy>,
}

impl StrategyFactory {
    /// Factory over `strategies`; players beyond the list sit idle.
    #[must_use]
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Strategy assigned to `player_id`.
    #[must_use]
    pub fn strategy_for(&self, player_id: u8) -> Option<&Strategy> {
        usize::from(player_id)
            .checked_sub(1)
            .and_then(|i| self.strategies.get(i))
    }
}

impl TankAlgorithmFactory for StrategyFactory {
    fn create(&self, player_id: u8, tank_index: usize) -> Box<dyn TankAlgorithm> {
        match self.strategy_for(player_id) {
            Some(strategy) => {
                tracing::debug!(player_id, tank_index, strategy = %strategy.name, "Creating tank algorithm");
                strategy.algorithm(player_id)
            }
            None => Strategy::idle().algorithm(player_id),
        }
    }
}

/// Plays a fixed list of actions.
#[derive(Debug, Clone)]
struct ScriptAlgorithm {
    actions: Vec<ActionRequest>,
    cursor: usize,
    repeat: bool,
}

impl ScriptAlgorithm {
    fn new(actions: Vec<ActionRequest>, repeat: bool) -> Self {
        Self {
            actions,
            cursor: 0,
            repeat,
        }
    }
}

impl TankAlgorithm for ScriptAlgorithm {
    fn get_action(&mut self) -> ActionRequest {
        if self.actions.is_empty() {
            return ActionRequest::DoNothing;
        }
        if self.cursor >= self.actions.len() {
            if !self.repeat {
                return ActionRequest::DoNothing;
            }
            self.cursor = 0;
        }
        let action = self.actions[self.cursor];
        self.cursor += 1;
        action
    }

    fn update_battle_info(&mut self, _info: &BattleInfo) {}
}

/// Stationary tank that turns toward enemies it can see and fires.
///
/// The sentry never moves, so its own heading is tracked from the rotations
/// it issues, which are never refused for a tank without a pending reverse.
#[derive(Debug, Clone)]
struct SentryAlgorithm {
    direction: Direction,
    scan_interval: usize,
    since_scan: usize,
    info: Option<BattleInfo>,
}

impl SentryAlgorithm {
    fn new(player_id: u8, scan_interval: usize) -> Self {
        Self {
            direction: Direction::initial_for_player(player_id),
            scan_interval,
            since_scan: 0,
            info: None,
        }
    }

    /// First tank met looking from `from` along `direction`, if any.
    ///
    /// Walls block the line. Returns `Some(true)` for an enemy and
    /// `Some(false)` for a friendly tank.
    fn first_tank_in_line(info: &BattleInfo, from: Point, direction: Direction) -> Option<bool> {
        let reach = info.board.width().max(info.board.height());
        for distance in 1..=reach {
            let cell = info
                .board
                .wrap_position(from + direction.delta_by(distance as i32));
            if cell == from || info.board.is_wall(cell) {
                return None;
            }
            if info.enemy_tanks.contains(&cell) {
                return Some(true);
            }
            if info.friendly_tanks.contains(&cell) {
                return Some(false);
            }
        }
        None
    }

    /// Rotation bringing the heading closest to `target`.
    fn turn_toward(&self, target: Direction) -> ActionRequest {
        let right = (0..8)
            .position(|steps| {
                (0..steps).fold(self.direction, |dir, _| dir.rotate_right(false)) == target
            })
            .unwrap_or(0);
        match right {
            1 => ActionRequest::RotateRight45,
            2..=4 => ActionRequest::RotateRight90,
            5 | 6 => ActionRequest::RotateLeft90,
            _ => ActionRequest::RotateLeft45,
        }
    }

    fn rotate(&mut self, action: ActionRequest) -> ActionRequest {
        self.direction = match action {
            ActionRequest::RotateLeft45 => self.direction.rotate_left(false),
            ActionRequest::RotateLeft90 => self.direction.rotate_left(true),
            ActionRequest::RotateRight45 => self.direction.rotate_right(false),
            ActionRequest::RotateRight90 => self.direction.rotate_right(true),
            _ => self.direction,
        };
        action
    }
}

impl TankAlgorithm for SentryAlgorithm {
    fn get_action(&mut self) -> ActionRequest {
        if self.info.is_none() || self.since_scan >= self.scan_interval {
            self.since_scan = 0;
            return ActionRequest::GetBattleInfo;
        }
        self.since_scan += 1;

        let Some(info) = &self.info else {
            return ActionRequest::DoNothing;
        };
        let Some(own) = info.own_position else {
            return ActionRequest::DoNothing;
        };

        if Self::first_tank_in_line(info, own, self.direction) == Some(true) {
            return ActionRequest::Shoot;
        }
        let target = Direction::ALL
            .into_iter()
            .find(|&dir| Self::first_tank_in_line(info, own, dir) == Some(true));
        let action = match target {
            Some(dir) => self.turn_toward(dir),
            None => ActionRequest::RotateRight45,
        };
        self.rotate(action)
    }

    fn update_battle_info(&mut self, info: &BattleInfo) {
        self.info = Some(info.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanks_core::board::{GameBoard, LayoutOptions, TankPlacement};

    fn info_for(rows: &[&str], player: u8) -> BattleInfo {
        let width = rows.iter().map(|r| r.len()).max().unwrap();
        let options = LayoutOptions {
            tank_placement: TankPlacement::All,
            ..LayoutOptions::default()
        };
        let layout = GameBoard::from_lines(width, rows.len(), rows, &options).unwrap();
        let mut info = BattleInfo {
            board: layout.board,
            own_position: None,
            friendly_tanks: Vec::new(),
            enemy_tanks: Vec::new(),
            shells: Vec::new(),
        };
        for (owner, pos) in layout.tank_positions {
            if owner == player && info.own_position.is_none() {
                info.own_position = Some(pos);
            } else if owner == player {
                info.friendly_tanks.push(pos);
            } else {
                info.enemy_tanks.push(pos);
            }
        }
        info
    }

    #[test]
    fn test_builtin_lookup() {
        for name in Strategy::BUILTIN_NAMES {
            assert_eq!(Strategy::builtin(name).unwrap().name, name);
        }
        assert!(Strategy::builtin("kamikaze").is_none());
    }

    #[test]
    fn test_from_ron_str() {
        let strategy = Strategy::from_ron_str(
            r#"(
                name: "Zigzag",
                behavior: Scripted(actions: [MoveForward, Shoot], repeat: false),
            )"#,
        )
        .unwrap();
        assert_eq!(strategy.name, "Zigzag");
        assert!(strategy.description.is_empty());

        let mut algorithm = strategy.algorithm(1);
        assert_eq!(algorithm.get_action(), ActionRequest::MoveForward);
        assert_eq!(algorithm.get_action(), ActionRequest::Shoot);
        assert_eq!(algorithm.get_action(), ActionRequest::DoNothing);
    }

    #[test]
    fn test_load_and_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spin.ron");
        std::fs::write(
            &path,
            "(name: \"spin\", behavior: Scripted(actions: [RotateLeft90], repeat: true))",
        )
        .unwrap();

        let strategy = Strategy::resolve(path.to_str().unwrap()).unwrap();
        let mut algorithm = strategy.algorithm(2);
        for _ in 0..3 {
            assert_eq!(algorithm.get_action(), ActionRequest::RotateLeft90);
        }
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(matches!(
            Strategy::resolve("no_such_strategy"),
            Err(StrategyError::Unknown(_))
        ));
        assert!(matches!(
            Strategy::load("/no/such/strategy.ron"),
            Err(StrategyError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_factory_uses_player_strategy() {
        let factory = StrategyFactory::new(vec![Strategy::shooter(), Strategy::rammer()]);
        assert_eq!(factory.create(1, 0).get_action(), ActionRequest::Shoot);
        assert_eq!(factory.create(2, 3).get_action(), ActionRequest::MoveForward);
        assert_eq!(factory.create(3, 0).get_action(), ActionRequest::DoNothing);
    }

    #[test]
    fn test_sentry_scans_first() {
        let mut sentry = SentryAlgorithm::new(1, 3);
        assert_eq!(sentry.get_action(), ActionRequest::GetBattleInfo);
        // Without info it keeps asking.
        assert_eq!(sentry.get_action(), ActionRequest::GetBattleInfo);
    }

    #[test]
    fn test_sentry_fires_at_enemy_in_line() {
        // Player 1 faces left toward player 2.
        let mut sentry = SentryAlgorithm::new(1, 10);
        sentry.get_action();
        sentry.update_battle_info(&info_for(&["2   1"], 1));
        assert_eq!(sentry.get_action(), ActionRequest::Shoot);
    }

    #[test]
    fn test_sentry_turns_toward_enemy() {
        // The enemy is both below and, across the edge, above; up is checked first.
        let mut sentry = SentryAlgorithm::new(1, 10);
        sentry.get_action();
        sentry.update_battle_info(&info_for(&["#1#", "# #", "#2#"], 1));
        assert_eq!(sentry.get_action(), ActionRequest::RotateRight90);
        assert_eq!(sentry.direction, Direction::Up);
    }

    #[test]
    fn test_sentry_does_not_fire_through_walls_or_friends() {
        let mut sentry = SentryAlgorithm::new(1, 10);
        sentry.get_action();
        sentry.update_battle_info(&info_for(&["#2#1#"], 1));
        assert_eq!(sentry.get_action(), ActionRequest::RotateRight45);
        assert_eq!(sentry.direction, Direction::UpLeft);

        let info = info_for(&["2 1 1"], 1);
        assert_eq!(
            SentryAlgorithm::first_tank_in_line(&info, Point::new(2, 0), Direction::Right),
            Some(false)
        );
    }

    #[test]
    fn test_sentry_rescans_on_interval() {
        let mut sentry = SentryAlgorithm::new(1, 2);
        sentry.get_action();
        sentry.update_battle_info(&info_for(&["2   1"], 1));
        assert_eq!(sentry.get_action(), ActionRequest::Shoot);
        assert_eq!(sentry.get_action(), ActionRequest::Shoot);
        assert_eq!(sentry.get_action(), ActionRequest::GetBattleInfo);
    }
}
