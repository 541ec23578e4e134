//! Eight-way facing directions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Facing direction, clockwise from north.
///
/// The board's y axis grows downward, so `Up` is a negative y step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// North.
    Up,
    /// North-east.
    UpRight,
    /// East.
    Right,
    /// South-east.
    DownRight,
    /// South.
    Down,
    /// South-west.
    DownLeft,
    /// West.
    Left,
    /// North-west.
    UpLeft,
}

impl Direction {
    /// All directions in clockwise order.
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::UpRight => 1,
            Direction::Right => 2,
            Direction::DownRight => 3,
            Direction::Down => 4,
            Direction::DownLeft => 5,
            Direction::Left => 6,
            Direction::UpLeft => 7,
        }
    }

    /// Rotate counter-clockwise by 45 degrees, or 90 when `quarter_turn`.
    #[must_use]
    pub const fn rotate_left(self, quarter_turn: bool) -> Self {
        let step = if quarter_turn { 2 } else { 1 };
        Self::ALL[(self.index() + 8 - step) % 8]
    }

    /// Rotate clockwise by 45 degrees, or 90 when `quarter_turn`.
    #[must_use]
    pub const fn rotate_right(self, quarter_turn: bool) -> Self {
        let step = if quarter_turn { 2 } else { 1 };
        Self::ALL[(self.index() + step) % 8]
    }

    /// The direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self.index() + 4) % 8]
    }

    /// Offset of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> Point {
        self.delta_by(1)
    }

    /// Offset of `magnitude` steps in this direction.
    #[must_use]
    pub const fn delta_by(self, magnitude: i32) -> Point {
        let m = magnitude;
        match self {
            Direction::Up => Point::new(0, -m),
            Direction::UpRight => Point::new(m, -m),
            Direction::Right => Point::new(m, 0),
            Direction::DownRight => Point::new(m, m),
            Direction::Down => Point::new(0, m),
            Direction::DownLeft => Point::new(-m, m),
            Direction::Left => Point::new(-m, 0),
            Direction::UpLeft => Point::new(-m, -m),
        }
    }

    /// The direction of a single unbounded step from `from` to `to`, if any.
    #[must_use]
    pub fn between(from: Point, to: Point) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| from + dir.delta() == to)
    }

    /// Starting direction for a player's tanks.
    ///
    /// Players 1 and 2 face each other across the board; the rest fan out.
    #[must_use]
    pub const fn initial_for_player(player_id: u8) -> Self {
        match player_id {
            2 => Direction::Right,
            3 => Direction::Up,
            4 => Direction::Down,
            5 => Direction::DownLeft,
            6 => Direction::DownRight,
            7 => Direction::UpLeft,
            8 => Direction::UpRight,
            _ => Direction::Left,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "Up",
            Direction::UpRight => "UpRight",
            Direction::Right => "Right",
            Direction::DownRight => "DownRight",
            Direction::Down => "Down",
            Direction::DownLeft => "DownLeft",
            Direction::Left => "Left",
            Direction::UpLeft => "UpLeft",
        };
        f.write_str(name)
    }
}
