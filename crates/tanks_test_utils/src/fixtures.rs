//! Test fixtures and helpers.
//!
//! Boards drawn as ASCII, scripted tank algorithms and ready-made games
//! for consistent testing.

use std::collections::BTreeMap;

use tanks_core::action::ActionRequest;
use tanks_core::algorithm::{BattleInfo, TankAlgorithm, TankAlgorithmFactory};
use tanks_core::board::{BoardLayout, GameBoard, LayoutOptions};
use tanks_core::game::{GameConfig, GameManager};

/// Parse an ASCII board whose size is taken from the rows themselves.
///
/// # Panics
///
/// Panics if the rows do not form a valid board.
#[must_use]
pub fn board_from_ascii(rows: &[&str]) -> BoardLayout {
    board_from_ascii_with(rows, &LayoutOptions::default())
}

/// Like [`board_from_ascii`] with explicit layout options.
///
/// # Panics
///
/// Panics if the rows do not form a valid board.
#[must_use]
pub fn board_from_ascii_with(rows: &[&str], options: &LayoutOptions) -> BoardLayout {
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    GameBoard::from_lines(width, rows.len(), rows, options).expect("fixture board should parse")
}

/// An empty board with no walls or mines.
///
/// # Panics
///
/// Panics on a zero dimension.
#[must_use]
pub fn open_board(width: usize, height: usize) -> GameBoard {
    GameBoard::new(width, height).expect("fixture dimensions should be valid")
}

/// Plays a fixed list of actions, then either repeats it or idles.
#[derive(Debug, Clone)]
pub struct ScriptedAlgorithm {
    script: Vec<ActionRequest>,
    repeat: bool,
    next: usize,
    /// Battle info received so far.
    pub received: Vec<BattleInfo>,
}

impl ScriptedAlgorithm {
    /// Play `script` once, then `DoNothing` forever.
    #[must_use]
    pub fn once(script: Vec<ActionRequest>) -> Self {
        Self {
            script,
            repeat: false,
            next: 0,
            received: Vec::new(),
        }
    }

    /// Play `script` in a loop.
    #[must_use]
    pub fn repeating(script: Vec<ActionRequest>) -> Self {
        Self {
            repeat: true,
            ..Self::once(script)
        }
    }
}

impl TankAlgorithm for ScriptedAlgorithm {
    fn get_action(&mut self) -> ActionRequest {
        if self.script.is_empty() {
            return ActionRequest::DoNothing;
        }
        let index = if self.repeat {
            self.next % self.script.len()
        } else {
            self.next
        };
        self.next += 1;
        self.script
            .get(index)
            .copied()
            .unwrap_or(ActionRequest::DoNothing)
    }

    fn update_battle_info(&mut self, info: &BattleInfo) {
        self.received.push(info.clone());
    }
}

/// Hands out per-player scripts to every tank of that player.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    scripts: BTreeMap<u8, (Vec<ActionRequest>, bool)>,
}

impl ScriptedFactory {
    /// Factory where every tank idles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Play `script` once for `player_id`'s tanks.
    #[must_use]
    pub fn with_script(mut self, player_id: u8, script: Vec<ActionRequest>) -> Self {
        self.scripts.insert(player_id, (script, false));
        self
    }

    /// Loop `script` for `player_id`'s tanks.
    #[must_use]
    pub fn with_repeating(mut self, player_id: u8, script: Vec<ActionRequest>) -> Self {
        self.scripts.insert(player_id, (script, true));
        self
    }
}

impl TankAlgorithmFactory for ScriptedFactory {
    fn create(&self, player_id: u8, _tank_index: usize) -> Box<dyn TankAlgorithm> {
        match self.scripts.get(&player_id) {
            Some((script, true)) => Box::new(ScriptedAlgorithm::repeating(script.clone())),
            Some((script, false)) => Box::new(ScriptedAlgorithm::once(script.clone())),
            None => Box::new(ScriptedAlgorithm::once(Vec::new())),
        }
    }
}

/// A game on an ASCII board with basic players.
///
/// # Panics
///
/// Panics if the board or config is invalid.
#[must_use]
pub fn manager_from_ascii(
    rows: &[&str],
    config: GameConfig,
    factory: &dyn TankAlgorithmFactory,
) -> GameManager {
    let layout = board_from_ascii_with(rows, &config.layout_options());
    GameManager::with_basic_players(layout, config, factory).expect("fixture game should build")
}

/// Two tanks facing each other across an open row, five cells apart.
#[must_use]
pub fn duel_rows() -> Vec<&'static str> {
    vec!["      ", "2    1", "      "]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_from_ascii_sizes_to_rows() {
        let layout = board_from_ascii(&["1 #", "  2"]);
        assert_eq!(layout.board.width(), 3);
        assert_eq!(layout.board.height(), 2);
        assert_eq!(layout.tank_positions.len(), 2);
    }

    #[test]
    fn test_scripted_algorithm() {
        let mut once = ScriptedAlgorithm::once(vec![ActionRequest::Shoot]);
        assert_eq!(once.get_action(), ActionRequest::Shoot);
        assert_eq!(once.get_action(), ActionRequest::DoNothing);

        let mut looping =
            ScriptedAlgorithm::repeating(vec![ActionRequest::Shoot, ActionRequest::MoveForward]);
        assert_eq!(looping.get_action(), ActionRequest::Shoot);
        assert_eq!(looping.get_action(), ActionRequest::MoveForward);
        assert_eq!(looping.get_action(), ActionRequest::Shoot);
    }
}
