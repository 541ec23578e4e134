//! Terminal game results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// At most one player has tanks left.
    AllTanksDead,
    /// Nobody had shells for the configured number of steps.
    ZeroShells,
    /// The step limit was reached.
    MaxSteps,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Winning player, or `None` for a tie.
    pub winner: Option<u8>,
    /// What ended the game.
    pub reason: EndReason,
    /// Live tanks per player, index 0 being player 1.
    pub remaining_tanks: Vec<usize>,
    /// Steps played.
    pub rounds: usize,
    /// Result line as written to the log.
    pub message: String,
}

impl GameResult {
    /// Whether the game ended without a winner.
    #[must_use]
    pub const fn is_tie(&self) -> bool {
        self.winner.is_none()
    }

    /// Live tanks left to `player_id`.
    #[must_use]
    pub fn tanks_left(&self, player_id: u8) -> usize {
        usize::from(player_id)
            .checked_sub(1)
            .and_then(|i| self.remaining_tanks.get(i))
            .copied()
            .unwrap_or(0)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result message for a game won by `player_id`.
#[must_use]
pub fn win_message(player_id: u8, tanks: usize) -> String {
    format!("Player {player_id} won with {tanks} tanks still alive")
}

fn everyone(players: usize) -> &'static str {
    if players == 2 {
        "both"
    } else {
        "all"
    }
}

/// Result message when no tanks survived.
#[must_use]
pub fn no_tanks_message(players: usize) -> String {
    format!("Tie, {} players have zero tanks", everyone(players))
}

/// Result message when shells ran out for `steps` steps.
#[must_use]
pub fn no_shells_message(players: usize, steps: usize) -> String {
    format!(
        "Tie, {} players have zero shells for {steps} steps",
        everyone(players)
    )
}

/// Result message at the step limit.
///
/// Two-player games always name both players; larger games list only the
/// players that still have tanks.
#[must_use]
pub fn max_steps_message(max_steps: usize, remaining_tanks: &[usize]) -> String {
    let mut message = format!("Tie, reached max steps = {max_steps}");
    let two_players = remaining_tanks.len() == 2;
    for (i, &tanks) in remaining_tanks.iter().enumerate() {
        if two_players || tanks > 0 {
            message.push_str(&format!(", player {} has {tanks} tanks", i + 1));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_player_wording() {
        assert_eq!(win_message(2, 1), "Player 2 won with 1 tanks still alive");
        assert_eq!(no_tanks_message(2), "Tie, both players have zero tanks");
        assert_eq!(
            no_shells_message(2, 40),
            "Tie, both players have zero shells for 40 steps"
        );
        assert_eq!(
            max_steps_message(100, &[1, 0]),
            "Tie, reached max steps = 100, player 1 has 1 tanks, player 2 has 0 tanks"
        );
    }

    #[test]
    fn test_multi_player_wording() {
        assert_eq!(no_tanks_message(3), "Tie, all players have zero tanks");
        assert_eq!(
            max_steps_message(50, &[2, 0, 1]),
            "Tie, reached max steps = 50, player 1 has 2 tanks, player 3 has 1 tanks"
        );
    }

    #[test]
    fn test_tanks_left() {
        let result = GameResult {
            winner: Some(1),
            reason: EndReason::AllTanksDead,
            remaining_tanks: vec![3, 0],
            rounds: 12,
            message: win_message(1, 3),
        };
        assert_eq!(result.tanks_left(1), 3);
        assert_eq!(result.tanks_left(2), 0);
        assert_eq!(result.tanks_left(0), 0);
        assert!(!result.is_tie());
    }
}
