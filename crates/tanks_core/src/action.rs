//! Tank actions and how their outcomes are reported in the turn log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An action a tank algorithm may request for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionRequest {
    /// Step one cell in the facing direction.
    MoveForward,
    /// Reverse one cell, after the backward delay.
    MoveBackward,
    /// Turn 45 degrees counter-clockwise.
    RotateLeft45,
    /// Turn 45 degrees clockwise.
    RotateRight45,
    /// Turn 90 degrees counter-clockwise.
    RotateLeft90,
    /// Turn 90 degrees clockwise.
    RotateRight90,
    /// Fire a shell in the facing direction.
    Shoot,
    /// Ask the player for a fresh view of the battlefield.
    GetBattleInfo,
    /// Stay put.
    DoNothing,
}

impl ActionRequest {
    /// Every action, in declaration order.
    pub const ALL: [ActionRequest; 9] = [
        ActionRequest::MoveForward,
        ActionRequest::MoveBackward,
        ActionRequest::RotateLeft45,
        ActionRequest::RotateRight45,
        ActionRequest::RotateLeft90,
        ActionRequest::RotateRight90,
        ActionRequest::Shoot,
        ActionRequest::GetBattleInfo,
        ActionRequest::DoNothing,
    ];

    /// Name used in logs and strategy files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ActionRequest::MoveForward => "MoveForward",
            ActionRequest::MoveBackward => "MoveBackward",
            ActionRequest::RotateLeft45 => "RotateLeft45",
            ActionRequest::RotateRight45 => "RotateRight45",
            ActionRequest::RotateLeft90 => "RotateLeft90",
            ActionRequest::RotateRight90 => "RotateRight90",
            ActionRequest::Shoot => "Shoot",
            ActionRequest::GetBattleInfo => "GetBattleInfo",
            ActionRequest::DoNothing => "DoNothing",
        }
    }

    /// Look an action up by its log name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a tank's turn went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    /// The action took effect.
    Applied,
    /// The action was rejected.
    Ignored,
    /// The tank was destroyed during this turn.
    Killed,
    /// The tank was destroyed on an earlier turn.
    Dead,
}

/// One tank's entry in a turn log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TankTurn {
    /// Requested action (`DoNothing` for tanks that were already dead).
    pub action: ActionRequest,
    /// What became of it.
    pub status: ActionStatus,
}

impl fmt::Display for TankTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ActionStatus::Applied => write!(f, "{}", self.action),
            ActionStatus::Ignored => write!(f, "{} (ignored)", self.action),
            ActionStatus::Killed => write!(f, "{} (killed)", self.action),
            ActionStatus::Dead => f.write_str("Killed"),
        }
    }
}

/// Join a turn's entries into a log line.
#[must_use]
pub fn format_turn(turns: &[TankTurn]) -> String {
    turns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
