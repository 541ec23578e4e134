//! Toroidal game board.
//!
//! The board stores static terrain only: walls (with hit points) and mines.
//! Tanks and shells live in the world's entity lists, never in the grid.
//! Every coordinate passed in is wrapped first, so callers may hand in
//! positions that stepped off an edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::geometry::{self, Point};

/// Hit points of a freshly placed wall.
pub const WALL_STARTING_HEALTH: u8 = 2;

/// Fewest players a game can have.
pub const MIN_PLAYERS: u8 = 2;

/// Highest player id a board marker can name.
pub const MAX_PLAYERS: u8 = 9;

/// Terrain of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Open ground.
    #[default]
    Empty,
    /// Blocks movement; absorbs shells.
    Wall,
    /// Destroys the first tank that stops on it.
    Mine,
}

impl CellType {
    /// Character used in board files and renders.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            CellType::Empty => ' ',
            CellType::Wall => '#',
            CellType::Mine => '@',
        }
    }
}

/// How repeated tank markers for the same player are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TankPlacement {
    /// Keep the first marker per player, warn about the rest.
    #[default]
    FirstOnly,
    /// Every marker becomes a tank.
    All,
}

/// Options for turning a character grid into a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Number of players that must each own at least one tank.
    pub players: u8,
    /// Treatment of repeated markers.
    pub tank_placement: TankPlacement,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            players: 2,
            tank_placement: TankPlacement::FirstOnly,
        }
    }
}

/// A parsed board together with the tank start positions found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    /// Terrain.
    pub board: GameBoard,
    /// `(player_id, position)` in reading order.
    pub tank_positions: Vec<(u8, Point)>,
    /// Recoverable problems found while reading the grid.
    pub warnings: Vec<String>,
}

/// The toroidal arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameBoard {
    width: usize,
    height: usize,
    /// Row-major cells.
    cells: Vec<CellType>,
    /// Remaining hit points of each wall, keyed by canonical position.
    wall_health: BTreeMap<Point, u8>,
}

impl GameBoard {
    /// Create an empty board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidDimensions`] for a zero dimension or one
    /// that does not fit the signed coordinate range.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let fits = |n: usize| n > 0 && i32::try_from(n).is_ok();
        if !fits(width) || !fits(height) || width.checked_mul(height).is_none() {
            return Err(GameError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![CellType::Empty; width * height],
            wall_health: BTreeMap::new(),
        })
    }

    /// Build a board from a character grid.
    ///
    /// `'#'` is a wall, `'@'` a mine, `' '` empty and `'1'..='9'` a tank
    /// start for that player (the cell itself stays empty). Anything else is
    /// read as empty ground. Short or missing rows are padded, long or extra
    /// rows truncated; each of those produces a warning.
    ///
    /// # Errors
    ///
    /// Fails on an empty grid, invalid dimensions, or when one of the first
    /// `options.players` players has no tank.
    pub fn from_lines<S: AsRef<str>>(
        width: usize,
        height: usize,
        lines: &[S],
        options: &LayoutOptions,
    ) -> Result<BoardLayout> {
        if lines.is_empty() {
            return Err(GameError::EmptyBoard);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&options.players) {
            return Err(GameError::InvalidConfig(format!(
                "player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {}",
                options.players
            )));
        }

        let mut board = Self::new(width, height)?;
        let mut tank_positions: Vec<(u8, Point)> = Vec::new();
        let mut warnings = Vec::new();

        if lines.len() < height {
            warnings.push(format!(
                "Board has {} rows, expected {height}; missing rows filled with empty cells",
                lines.len()
            ));
        } else if lines.len() > height {
            warnings.push(format!(
                "Board has {} rows, expected {height}; extra rows ignored",
                lines.len()
            ));
        }

        for (y, line) in lines.iter().take(height).enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len < width {
                warnings.push(format!(
                    "Row {y} has {len} columns, expected {width}; padded with empty cells"
                ));
            } else if len > width {
                warnings.push(format!(
                    "Row {y} has {len} columns, expected {width}; extra columns ignored"
                ));
            }

            for (x, ch) in line.chars().take(width).enumerate() {
                let pos = Point::new(x as i32, y as i32);
                match ch {
                    '#' => board.set_cell_type(pos, CellType::Wall),
                    '@' => board.set_cell_type(pos, CellType::Mine),
                    ' ' => {}
                    '1'..='9' => {
                        let player = ch as u8 - b'0';
                        if player > options.players {
                            warnings.push(format!(
                                "Tank marker for player {player} at {pos} ignored; only {} players in this game",
                                options.players
                            ));
                        } else if options.tank_placement == TankPlacement::FirstOnly
                            && tank_positions.iter().any(|(p, _)| *p == player)
                        {
                            warnings.push(format!(
                                "Duplicate tank for player {player} at {pos} ignored"
                            ));
                        } else {
                            tank_positions.push((player, pos));
                        }
                    }
                    other => warnings.push(format!(
                        "Unrecognized character '{other}' at {pos} treated as empty"
                    )),
                }
            }
        }

        for player in 1..=options.players {
            if !tank_positions.iter().any(|(p, _)| *p == player) {
                return Err(GameError::MissingTank(player));
            }
        }

        Ok(BoardLayout {
            board,
            tank_positions,
            warnings,
        })
    }

    /// Board width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Board height in cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Map any point into canonical board bounds.
    #[must_use]
    pub fn wrap_position(&self, position: Point) -> Point {
        geometry::wrap_point(position, self.width, self.height)
    }

    /// Wrap-aware Chebyshev distance on this board.
    #[must_use]
    pub fn step_distance(&self, a: Point, b: Point) -> i32 {
        geometry::step_distance(a, b, self.width, self.height)
    }

    fn index(&self, position: Point) -> (Point, usize) {
        let wrapped = self.wrap_position(position);
        let idx = wrapped.y as usize * self.width + wrapped.x as usize;
        (wrapped, idx)
    }

    /// Terrain at a (wrapped) position.
    #[must_use]
    pub fn cell_type(&self, position: Point) -> CellType {
        let (_, idx) = self.index(position);
        self.cells[idx]
    }

    /// Replace the terrain at a (wrapped) position.
    ///
    /// Turning a non-wall into a wall gives it full health; replacing a wall
    /// with anything else forgets its health.
    pub fn set_cell_type(&mut self, position: Point, cell: CellType) {
        let (wrapped, idx) = self.index(position);
        let previous = self.cells[idx];
        match (previous, cell) {
            (CellType::Wall, CellType::Wall) => {}
            (_, CellType::Wall) => {
                self.wall_health.insert(wrapped, WALL_STARTING_HEALTH);
            }
            (CellType::Wall, _) => {
                self.wall_health.remove(&wrapped);
            }
            _ => {}
        }
        self.cells[idx] = cell;
    }

    /// Whether the cell holds a wall.
    #[must_use]
    pub fn is_wall(&self, position: Point) -> bool {
        self.cell_type(position) == CellType::Wall
    }

    /// Whether the cell holds a mine.
    #[must_use]
    pub fn is_mine(&self, position: Point) -> bool {
        self.cell_type(position) == CellType::Mine
    }

    /// Take one hit off the wall at `position`.
    ///
    /// Returns `true` only when this hit brought the wall down. Hitting a
    /// cell without a wall does nothing.
    pub fn damage_wall(&mut self, position: Point) -> bool {
        let (wrapped, idx) = self.index(position);
        if self.cells[idx] != CellType::Wall {
            return false;
        }

        let health = self
            .wall_health
            .entry(wrapped)
            .or_insert(WALL_STARTING_HEALTH);
        *health = health.saturating_sub(1);

        if *health == 0 {
            self.wall_health.remove(&wrapped);
            self.cells[idx] = CellType::Empty;
            return true;
        }
        false
    }

    /// Remaining hit points of the wall at `position`, or 0 if none.
    #[must_use]
    pub fn wall_health(&self, position: Point) -> u8 {
        let wrapped = self.wrap_position(position);
        self.wall_health.get(&wrapped).copied().unwrap_or(0)
    }

    /// Whether a tank may enter the cell.
    ///
    /// Only walls block. Mines and occupied cells are enterable; what happens
    /// there is decided by collision resolution.
    #[must_use]
    pub fn can_move_to(&self, position: Point) -> bool {
        !self.is_wall(position)
    }

    /// Render terrain as lines of `'#'`, `'@'` and `' '`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width) {
            for cell in row {
                out.push(cell.symbol());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: &[&str], width: usize, height: usize) -> BoardLayout {
        GameBoard::from_lines(width, height, rows, &LayoutOptions::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert!(matches!(
            GameBoard::new(0, 5),
            Err(GameError::InvalidDimensions { .. })
        ));
        assert!(GameBoard::new(3, 3).is_ok());
    }

    #[test]
    fn test_cell_access_wraps() {
        let mut board = GameBoard::new(5, 4).unwrap();
        board.set_cell_type(Point::new(-1, -1), CellType::Mine);
        assert_eq!(board.cell_type(Point::new(4, 3)), CellType::Mine);
        assert!(board.is_mine(Point::new(9, 7)));
    }

    #[test]
    fn test_wall_takes_two_hits() {
        let mut board = GameBoard::new(5, 5).unwrap();
        let wall = Point::new(2, 2);
        board.set_cell_type(wall, CellType::Wall);
        assert_eq!(board.wall_health(wall), 2);

        assert!(!board.damage_wall(wall));
        assert_eq!(board.cell_type(wall), CellType::Wall);
        assert_eq!(board.wall_health(wall), 1);

        assert!(board.damage_wall(wall));
        assert_eq!(board.cell_type(wall), CellType::Empty);
        assert_eq!(board.wall_health(wall), 0);
        assert!(!board.damage_wall(wall));
    }

    #[test]
    fn test_damage_wall_through_wrapped_coordinate() {
        let mut board = GameBoard::new(4, 4).unwrap();
        board.set_cell_type(Point::new(0, 0), CellType::Wall);
        board.damage_wall(Point::new(4, -4));
        assert_eq!(board.wall_health(Point::new(0, 0)), 1);
    }

    #[test]
    fn test_can_move_to_only_blocks_walls() {
        let mut board = GameBoard::new(3, 3).unwrap();
        board.set_cell_type(Point::new(1, 1), CellType::Wall);
        board.set_cell_type(Point::new(2, 2), CellType::Mine);
        assert!(!board.can_move_to(Point::new(1, 1)));
        assert!(board.can_move_to(Point::new(2, 2)));
        assert!(board.can_move_to(Point::new(0, 0)));
    }

    #[test]
    fn test_from_lines_reads_cells_and_tanks() {
        let parsed = layout(&["#1 @", "  2#"], 4, 2);
        assert!(parsed.warnings.is_empty());
        assert_eq!(
            parsed.tank_positions,
            vec![(1, Point::new(1, 0)), (2, Point::new(2, 1))]
        );
        assert_eq!(parsed.board.cell_type(Point::new(0, 0)), CellType::Wall);
        assert_eq!(parsed.board.wall_health(Point::new(3, 1)), 2);
        assert_eq!(parsed.board.cell_type(Point::new(3, 0)), CellType::Mine);
        assert_eq!(parsed.board.cell_type(Point::new(1, 0)), CellType::Empty);
    }

    #[test]
    fn test_from_lines_pads_and_warns() {
        let parsed = layout(&["1x", "2"], 3, 3);
        // short row 0, short row 1, unknown char, missing row
        assert_eq!(parsed.warnings.len(), 4);
        assert_eq!(parsed.board.cell_type(Point::new(1, 0)), CellType::Empty);
    }

    #[test]
    fn test_from_lines_truncates_extra_content() {
        let parsed = layout(&["1  #", "2   ", "####"], 3, 2);
        assert_eq!(parsed.warnings.len(), 3);
        assert_eq!(parsed.board.cell_type(Point::new(0, 1)), CellType::Empty);
    }

    #[test]
    fn test_duplicate_markers_keep_first() {
        let parsed = layout(&["1 1", "2  "], 3, 2);
        assert_eq!(
            parsed.tank_positions,
            vec![(1, Point::new(0, 0)), (2, Point::new(0, 1))]
        );
        assert_eq!(parsed.warnings.len(), 1);

        let options = LayoutOptions {
            tank_placement: TankPlacement::All,
            ..LayoutOptions::default()
        };
        let all = GameBoard::from_lines(3, 2, &["1 1", "2  "], &options).unwrap();
        assert_eq!(all.tank_positions.len(), 3);
        assert!(all.warnings.is_empty());
    }

    #[test]
    fn test_missing_player_is_fatal() {
        let err = GameBoard::from_lines(3, 1, &["1  "], &LayoutOptions::default());
        assert!(matches!(err, Err(GameError::MissingTank(2))));
    }

    #[test]
    fn test_empty_grid_is_fatal() {
        let rows: Vec<String> = Vec::new();
        let err = GameBoard::from_lines(3, 3, &rows, &LayoutOptions::default());
        assert!(matches!(err, Err(GameError::EmptyBoard)));
    }

    #[test]
    fn test_render() {
        let parsed = layout(&["#1@", "2  "], 3, 2);
        assert_eq!(parsed.board.render(), "# @\n   \n");
    }
}
