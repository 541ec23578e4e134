//! Collision resolution for one half-step.
//!
//! Everything moves at once, so checking only where objects end up would
//! miss two shells that fly through each other. Each mover's segment from
//! its previous to its current cell is reduced to a [`MidPoint`]; two movers
//! whose segments share a midpoint crossed paths and both explode.
//!
//! Resolution runs in a fixed phase order:
//!
//! 1. path collisions are detected over every pair of live movers,
//! 2. movers whose segment crosses a marked midpoint are destroyed,
//! 3. shells inside walls explode and damage the wall,
//! 4. cells holding two or more live movers are marked,
//! 5. movers on marked cells are destroyed and mines there are cleared,
//! 6. tanks standing on mines are destroyed along with the mine.
//!
//! Shells never set off mines on their own.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::{CellType, GameBoard};
use crate::geometry::{MidPoint, Point};
use crate::shell::Shell;
use crate::tank::Tank;

/// What a single resolution pass found and destroyed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Midpoints where two segments crossed.
    pub path_explosions: BTreeSet<MidPoint>,
    /// Cells where something exploded.
    pub position_explosions: BTreeSet<Point>,
    /// Indices of tanks destroyed during this pass.
    pub destroyed_tanks: BTreeSet<usize>,
    /// Indices of shells destroyed during this pass.
    pub destroyed_shells: BTreeSet<usize>,
}

impl CollisionReport {
    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path_explosions.is_empty()
            && self.position_explosions.is_empty()
            && self.destroyed_tanks.is_empty()
            && self.destroyed_shells.is_empty()
    }
}

/// A tank or shell, by index into its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mover {
    Tank(usize),
    Shell(usize),
}

/// Borrowed view over both entity lists while resolving.
struct Movers<'a> {
    tanks: &'a mut [Tank],
    shells: &'a mut [Shell],
}

impl Movers<'_> {
    /// Live movers in creation order, tanks first.
    fn live(&self) -> Vec<Mover> {
        let tanks = self
            .tanks
            .iter()
            .enumerate()
            .filter(|(_, tank)| !tank.is_destroyed())
            .map(|(i, _)| Mover::Tank(i));
        let shells = self
            .shells
            .iter()
            .enumerate()
            .filter(|(_, shell)| !shell.is_destroyed())
            .map(|(i, _)| Mover::Shell(i));
        tanks.chain(shells).collect()
    }

    fn segment(&self, mover: Mover) -> (Point, Point) {
        match mover {
            Mover::Tank(i) => (self.tanks[i].previous_position(), self.tanks[i].position()),
            Mover::Shell(i) => (
                self.shells[i].previous_position(),
                self.shells[i].position(),
            ),
        }
    }

    fn position(&self, mover: Mover) -> Point {
        self.segment(mover).1
    }

    fn destroy(&mut self, mover: Mover, report: &mut CollisionReport) {
        match mover {
            Mover::Tank(i) => {
                self.tanks[i].destroy();
                report.destroyed_tanks.insert(i);
            }
            Mover::Shell(i) => {
                self.shells[i].destroy();
                report.destroyed_shells.insert(i);
            }
        }
    }
}

/// Resolve every collision for the current half-step.
///
/// Marks tanks and shells destroyed in place, damages walls and clears mines.
/// Destroyed shells stay in the list; removing them is the caller's job.
pub fn resolve_all_collisions(
    tanks: &mut [Tank],
    shells: &mut [Shell],
    board: &mut GameBoard,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    let mut movers = Movers { tanks, shells };
    let (width, height) = (board.width(), board.height());

    detect_path_collisions(&movers, width, height, &mut report);
    apply_path_explosions(&mut movers, width, height, &mut report);
    check_shell_wall_collisions(&mut movers, board, &mut report);
    detect_position_collisions(&movers, &mut report);
    apply_position_explosions(&mut movers, board, &mut report);
    check_tank_mine_collisions(&mut movers, board, &mut report);

    if !report.is_empty() {
        tracing::debug!(
            path = report.path_explosions.len(),
            position = report.position_explosions.len(),
            tanks = report.destroyed_tanks.len(),
            shells = report.destroyed_shells.len(),
            "Collisions resolved"
        );
    }
    report
}

fn detect_path_collisions(
    movers: &Movers<'_>,
    width: usize,
    height: usize,
    report: &mut CollisionReport,
) {
    let segments: Vec<(Point, Point)> = movers
        .live()
        .into_iter()
        .map(|mover| movers.segment(mover))
        .collect();

    for (i, &(a1, a2)) in segments.iter().enumerate() {
        for &(b1, b2) in &segments[i + 1..] {
            if MidPoint::midpoints_match_wrapped(a1, a2, b1, b2, width, height) {
                report
                    .path_explosions
                    .insert(MidPoint::between_wrapped(a1, a2, width, height));
            }
        }
    }
}

fn apply_path_explosions(
    movers: &mut Movers<'_>,
    width: usize,
    height: usize,
    report: &mut CollisionReport,
) {
    if report.path_explosions.is_empty() {
        return;
    }
    for mover in movers.live() {
        let (from, to) = movers.segment(mover);
        let mid = MidPoint::between_wrapped(from, to, width, height);
        if mid.is_valid() && report.path_explosions.contains(&mid) {
            movers.destroy(mover, report);
        }
    }
}

fn check_shell_wall_collisions(
    movers: &mut Movers<'_>,
    board: &mut GameBoard,
    report: &mut CollisionReport,
) {
    for mover in movers.live() {
        let Mover::Shell(_) = mover else { continue };
        let at = movers.position(mover);
        if board.is_wall(at) {
            movers.destroy(mover, report);
            board.damage_wall(at);
            report.position_explosions.insert(board.wrap_position(at));
        }
    }
}

fn detect_position_collisions(movers: &Movers<'_>, report: &mut CollisionReport) {
    let mut occupancy: BTreeMap<Point, usize> = BTreeMap::new();
    for mover in movers.live() {
        *occupancy.entry(movers.position(mover)).or_default() += 1;
    }
    report.position_explosions.extend(
        occupancy
            .into_iter()
            .filter(|&(_, count)| count >= 2)
            .map(|(cell, _)| cell),
    );
}

fn apply_position_explosions(
    movers: &mut Movers<'_>,
    board: &mut GameBoard,
    report: &mut CollisionReport,
) {
    for mover in movers.live() {
        if report.position_explosions.contains(&movers.position(mover)) {
            movers.destroy(mover, report);
        }
    }
    for &cell in &report.position_explosions {
        if board.is_mine(cell) {
            board.set_cell_type(cell, CellType::Empty);
        }
    }
}

fn check_tank_mine_collisions(
    movers: &mut Movers<'_>,
    board: &mut GameBoard,
    report: &mut CollisionReport,
) {
    for mover in movers.live() {
        let Mover::Tank(_) = mover else { continue };
        let at = movers.position(mover);
        if board.is_mine(at) {
            movers.destroy(mover, report);
            board.set_cell_type(at, CellType::Empty);
            report.position_explosions.insert(board.wrap_position(at));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn board(width: usize, height: usize) -> GameBoard {
        GameBoard::new(width, height).unwrap()
    }

    fn moved_shell(from: Point, direction: Direction, width: usize, height: usize) -> Shell {
        let mut shell = Shell::new(1, from, direction);
        shell.advance(width, height);
        shell
    }

    #[test]
    fn test_diagonal_swap_explodes_once() {
        let mut board = board(10, 10);
        let mut shells = vec![
            moved_shell(Point::new(1, 1), Direction::DownRight, 10, 10),
            moved_shell(Point::new(2, 2), Direction::UpLeft, 10, 10),
        ];
        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);

        assert_eq!(report.path_explosions.len(), 1);
        assert!(report
            .path_explosions
            .contains(&MidPoint::new(1, 1, true, true)));
        assert!(shells.iter().all(Shell::is_destroyed));
    }

    #[test]
    fn test_swap_across_the_edge() {
        let mut board = board(10, 10);
        let mut shells = vec![
            moved_shell(Point::new(9, 0), Direction::Right, 10, 10),
            moved_shell(Point::new(0, 0), Direction::Left, 10, 10),
        ];
        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);

        assert_eq!(
            report.path_explosions.iter().copied().collect::<Vec<_>>(),
            vec![MidPoint::new(9, 0, true, false)]
        );
        assert!(shells.iter().all(Shell::is_destroyed));
    }

    #[test]
    fn test_crossing_diagonals_explode() {
        let mut board = board(10, 10);
        let mut shells = vec![
            moved_shell(Point::new(1, 1), Direction::DownRight, 10, 10),
            moved_shell(Point::new(1, 2), Direction::UpRight, 10, 10),
        ];
        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);
        assert_eq!(report.destroyed_shells.len(), 2);
    }

    #[test]
    fn test_shell_hits_wall() {
        let mut board = board(5, 5);
        board.set_cell_type(Point::new(3, 2), CellType::Wall);
        let mut shells = vec![moved_shell(Point::new(2, 2), Direction::Right, 5, 5)];

        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);
        assert!(shells[0].is_destroyed());
        assert_eq!(board.wall_health(Point::new(3, 2)), 1);
        assert!(report.position_explosions.contains(&Point::new(3, 2)));
    }

    #[test]
    fn test_same_cell_destroys_everything_there() {
        let mut board = board(5, 5);
        let mut tanks = vec![Tank::new(1, 0, Point::new(2, 2), Direction::Left, 16)];
        let mut shells = vec![moved_shell(Point::new(1, 2), Direction::Right, 5, 5)];

        let report = resolve_all_collisions(&mut tanks, &mut shells, &mut board);
        assert!(tanks[0].is_destroyed());
        assert!(shells[0].is_destroyed());
        assert_eq!(
            report.position_explosions.iter().copied().collect::<Vec<_>>(),
            vec![Point::new(2, 2)]
        );
        assert!(report.path_explosions.is_empty());
    }

    #[test]
    fn test_tank_on_mine() {
        let mut board = board(5, 5);
        board.set_cell_type(Point::new(2, 2), CellType::Mine);
        let mut tanks = vec![Tank::new(1, 0, Point::new(2, 2), Direction::Left, 16)];

        let report = resolve_all_collisions(&mut tanks, &mut [], &mut board);
        assert!(tanks[0].is_destroyed());
        assert_eq!(board.cell_type(Point::new(2, 2)), CellType::Empty);
        assert_eq!(report.position_explosions.len(), 1);
        assert!(report.destroyed_tanks.contains(&0));
    }

    #[test]
    fn test_shell_on_mine_is_harmless() {
        let mut board = board(5, 5);
        board.set_cell_type(Point::new(3, 2), CellType::Mine);
        let mut shells = vec![moved_shell(Point::new(2, 2), Direction::Right, 5, 5)];

        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);
        assert!(!shells[0].is_destroyed());
        assert!(board.is_mine(Point::new(3, 2)));
        assert!(report.is_empty());
    }

    #[test]
    fn test_explosion_on_mine_clears_it() {
        let mut board = board(5, 5);
        board.set_cell_type(Point::new(2, 2), CellType::Mine);
        let mut shells = vec![
            moved_shell(Point::new(1, 2), Direction::Right, 5, 5),
            moved_shell(Point::new(2, 1), Direction::Down, 5, 5),
        ];

        let report = resolve_all_collisions(&mut [], &mut shells, &mut board);
        assert!(shells.iter().all(Shell::is_destroyed));
        assert_eq!(board.cell_type(Point::new(2, 2)), CellType::Empty);
        assert!(report.position_explosions.contains(&Point::new(2, 2)));
    }

    #[test]
    fn test_destroyed_objects_are_skipped() {
        let mut board = board(5, 5);
        let mut tanks = vec![Tank::new(1, 0, Point::new(2, 2), Direction::Left, 16)];
        tanks[0].destroy();
        let mut shells = vec![moved_shell(Point::new(1, 2), Direction::Right, 5, 5)];

        let report = resolve_all_collisions(&mut tanks, &mut shells, &mut board);
        assert!(!shells[0].is_destroyed());
        assert!(report.is_empty());
    }

    #[test]
    fn test_no_state_survives_between_calls() {
        let mut board = board(10, 10);
        let mut shells = vec![
            moved_shell(Point::new(1, 1), Direction::DownRight, 10, 10),
            moved_shell(Point::new(2, 2), Direction::UpLeft, 10, 10),
        ];
        resolve_all_collisions(&mut [], &mut shells, &mut board);

        let mut fresh = vec![moved_shell(Point::new(5, 5), Direction::Up, 10, 10)];
        let report = resolve_all_collisions(&mut [], &mut fresh, &mut board);
        assert!(report.is_empty());
        assert!(!fresh[0].is_destroyed());
    }
}
