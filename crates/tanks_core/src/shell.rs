//! Shells in flight.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::geometry::{self, Point};

/// A shell. Moves one cell per half-step and never turns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shell {
    owner: u8,
    position: Point,
    previous_position: Point,
    direction: Direction,
    destroyed: bool,
}

impl Shell {
    /// Spawn a shell at `position`. It has not moved yet.
    #[must_use]
    pub const fn new(owner: u8, position: Point, direction: Direction) -> Self {
        Self {
            owner,
            position,
            previous_position: position,
            direction,
            destroyed: false,
        }
    }

    /// Player who fired the shell.
    #[must_use]
    pub const fn owner(&self) -> u8 {
        self.owner
    }

    /// Current cell.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Cell before the last half-step.
    #[must_use]
    pub const fn previous_position(&self) -> Point {
        self.previous_position
    }

    /// Direction of travel.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the shell has exploded.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark the shell destroyed.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Move one cell on a `width` x `height` torus.
    pub fn advance(&mut self, width: usize, height: usize) {
        self.previous_position = self.position;
        self.position =
            geometry::wrap_point(self.position + self.direction.delta(), width, height);
    }
}
