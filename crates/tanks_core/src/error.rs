//! Error types for the game simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
///
/// Only initialization and replay handling can fail. Once a game is running,
/// rejected actions are reported through the turn log, never as errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// The board input contained no rows at all.
    #[error("Board input is empty")]
    EmptyBoard,

    /// Board dimensions are zero or do not fit the coordinate range.
    #[error("Invalid board dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// A player required by the game has no tank on the board.
    #[error("No tank found for player {0}")]
    MissingTank(u8),

    /// Game configuration is unusable.
    #[error("Invalid game configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
