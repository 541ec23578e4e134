//! Read-only battlefield views handed to players.
//!
//! A [`BattleSnapshot`] is an owned copy of the world taken at the start of a
//! step. Players only ever see that copy, so nothing applied later in the
//! same step leaks into what an algorithm observes.

use serde::{Deserialize, Serialize};

use crate::board::{CellType, GameBoard};
use crate::geometry::Point;
use crate::shell::Shell;
use crate::tank::Tank;

/// Character for a wall.
pub const WALL_CHAR: char = '#';
/// Character for a mine.
pub const MINE_CHAR: char = '@';
/// Character for a shell.
pub const SHELL_CHAR: char = '*';
/// Character for the tank that asked for the view.
pub const REQUESTER_CHAR: char = '%';
/// Character for empty ground.
pub const EMPTY_CHAR: char = ' ';
/// Character for coordinates outside the board.
pub const OUT_OF_BOUNDS_CHAR: char = '&';

/// Character-level access to the battlefield.
pub trait SatelliteView {
    /// Object at `(x, y)`.
    ///
    /// Unlike the board itself, this does not wrap: coordinates outside the
    /// board report [`OUT_OF_BOUNDS_CHAR`].
    fn object_at(&self, x: usize, y: usize) -> char;
}

/// Owned copy of the board and all entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Terrain.
    pub board: GameBoard,
    /// Tanks, destroyed ones included.
    pub tanks: Vec<Tank>,
    /// Shells in flight.
    pub shells: Vec<Shell>,
}

impl BattleSnapshot {
    /// View of this snapshot as seen by the tank at `requester`.
    #[must_use]
    pub fn view_for(&self, requester: Point) -> SnapshotView<'_> {
        SnapshotView {
            snapshot: self,
            requester: Some(requester),
        }
    }

    /// Neutral view with no requesting tank.
    #[must_use]
    pub fn overview(&self) -> SnapshotView<'_> {
        SnapshotView {
            snapshot: self,
            requester: None,
        }
    }
}

/// [`SatelliteView`] over a [`BattleSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    snapshot: &'a BattleSnapshot,
    requester: Option<Point>,
}

impl SatelliteView for SnapshotView<'_> {
    fn object_at(&self, x: usize, y: usize) -> char {
        let board = &self.snapshot.board;
        if x >= board.width() || y >= board.height() {
            return OUT_OF_BOUNDS_CHAR;
        }
        let cell = Point::new(x as i32, y as i32);

        if self.requester == Some(cell) {
            return REQUESTER_CHAR;
        }

        let tank = self
            .snapshot
            .tanks
            .iter()
            .find(|tank| !tank.is_destroyed() && tank.position() == cell);
        if let Some(tank) = tank {
            return char::from_digit(u32::from(tank.player_id()), 10).unwrap_or(EMPTY_CHAR);
        }

        if self
            .snapshot
            .shells
            .iter()
            .any(|shell| !shell.is_destroyed() && shell.position() == cell)
        {
            return SHELL_CHAR;
        }

        match board.cell_type(cell) {
            CellType::Wall => WALL_CHAR,
            CellType::Mine => MINE_CHAR,
            CellType::Empty => EMPTY_CHAR,
        }
    }
}
