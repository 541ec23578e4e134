//! # Tanks Core
//!
//! Deterministic simulation core for the tank battle game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO outside replay files
//! - No randomness
//! - No floating-point math (crossings use half-cell flags)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`geometry`] - Points, toroidal wrapping and segment midpoints
//! - [`board`] - Terrain grid with wall health and mines
//! - [`tank`] / [`shell`] - Entities and the tank movement state machine
//! - [`collision`] - Per half-step collision resolution
//! - [`game`] - Turn orchestration and terminal conditions
//! - [`algorithm`] - Contracts for tank algorithms and players

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod algorithm;
pub mod board;
pub mod collision;
pub mod direction;
pub mod error;
pub mod game;
pub mod geometry;
pub mod replay;
pub mod result;
pub mod satellite;
pub mod shell;
pub mod tank;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{ActionRequest, ActionStatus, TankTurn};
    pub use crate::algorithm::{
        BasicPlayer, BattleInfo, Player, TankAlgorithm, TankAlgorithmFactory,
    };
    pub use crate::board::{BoardLayout, CellType, GameBoard, LayoutOptions, TankPlacement};
    pub use crate::collision::{resolve_all_collisions, CollisionReport};
    pub use crate::direction::Direction;
    pub use crate::error::{GameError, Result};
    pub use crate::game::{GameConfig, GameManager, GameOutcome, World};
    pub use crate::geometry::{MidPoint, Point};
    pub use crate::replay::{Replay, ReplayFactory};
    pub use crate::result::{EndReason, GameResult};
    pub use crate::satellite::{BattleSnapshot, SatelliteView};
    pub use crate::shell::Shell;
    pub use crate::tank::{BackwardState, Tank};
}
