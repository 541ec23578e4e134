//! Integer grid geometry for deterministic simulation.
//!
//! Every move in the game is exactly one cell along an axis or a diagonal,
//! so the point where two movers cross is always either a cell or a
//! half-integer position on one or both axes. [`MidPoint`] encodes that
//! crossing point exactly with an integer coordinate plus two "half" flags,
//! which keeps collision detection free of floating-point math.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An integer grid cell.
///
/// Ordering is lexicographic by `x`, then `y`, so ordered collections of
/// points iterate in a stable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row (grows downward).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Origin point.
    pub const ZERO: Self = Self { x: 0, y: 0 };
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for Point {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Convert a board dimension into the signed coordinate space.
pub(crate) fn dim(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Wrap a point onto a `width` x `height` torus.
///
/// Handles arbitrarily negative coordinates. A zero dimension has no valid
/// cells, so the point is returned unchanged on that axis.
#[must_use]
pub fn wrap_point(point: Point, width: usize, height: usize) -> Point {
    let (w, h) = (dim(width), dim(height));
    Point {
        x: if w > 0 { point.x.rem_euclid(w) } else { point.x },
        y: if h > 0 { point.y.rem_euclid(h) } else { point.y },
    }
}

/// Distance between two coordinates on one wrapping axis.
fn axis_distance(a: i32, b: i32, size: i32) -> i32 {
    let direct = (a - b).abs();
    if size > 0 {
        let direct = direct % size;
        direct.min(size - direct)
    } else {
        direct
    }
}

/// Wrap-aware Chebyshev distance between two cells.
///
/// Orthogonal and diagonal steps cost the same, and each axis may be
/// measured "the other way around" the torus.
#[must_use]
pub fn step_distance(a: Point, b: Point, width: usize, height: usize) -> i32 {
    let dx = axis_distance(a.x, b.x, dim(width));
    let dy = axis_distance(a.y, b.y, dim(height));
    dx.max(dy)
}

/// Whether two cells touch (including diagonally) on the torus.
#[must_use]
pub fn are_adjacent(a: Point, b: Point, width: usize, height: usize) -> bool {
    step_distance(a, b, width, height) == 1
}

/// The crossing point between two adjacent cells (or a cell itself).
///
/// Field order gives the derived ordering: `x`, `y`, then the half flags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct MidPoint {
    /// Integer part of the x coordinate.
    pub x: i32,
    /// Integer part of the y coordinate.
    pub y: i32,
    /// The x coordinate carries an extra `.5`.
    pub half_x: bool,
    /// The y coordinate carries an extra `.5`.
    pub half_y: bool,
}

/// Per-axis result of a midpoint computation: (coordinate, half flag).
type AxisMid = Option<(i32, bool)>;

impl MidPoint {
    /// Sentinel returned for points that are not adjacent.
    pub const INVALID: Self = Self {
        x: -1,
        y: -1,
        half_x: false,
        half_y: false,
    };

    /// Create a midpoint from raw parts.
    #[must_use]
    pub const fn new(x: i32, y: i32, half_x: bool, half_y: bool) -> Self {
        Self {
            x,
            y,
            half_x,
            half_y,
        }
    }

    /// A midpoint sitting exactly on a cell.
    #[must_use]
    pub const fn at(point: Point) -> Self {
        Self::new(point.x, point.y, false, false)
    }

    /// Whether this is a real crossing point rather than [`Self::INVALID`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Midpoint between two cells in a non-wrapping space.
    ///
    /// Only meaningful for identical or adjacent cells; anything further
    /// apart yields [`Self::INVALID`].
    #[must_use]
    pub fn between(a: Point, b: Point) -> Self {
        Self::from_axes(flat_axis(a.x, b.x), flat_axis(a.y, b.y))
    }

    /// Midpoint between two cells on a `width` x `height` torus.
    ///
    /// Symmetric in its arguments. When the crossing happens through the
    /// board edge, the coordinate is anchored to the last row/column so both
    /// directions of travel name the same crossing point.
    #[must_use]
    pub fn between_wrapped(a: Point, b: Point, width: usize, height: usize) -> Self {
        let a = wrap_point(a, width, height);
        let b = wrap_point(b, width, height);
        Self::from_axes(
            wrapped_axis(a.x, b.x, dim(width)),
            wrapped_axis(a.y, b.y, dim(height)),
        )
    }

    fn from_axes(x: AxisMid, y: AxisMid) -> Self {
        match (x, y) {
            (Some((x, half_x)), Some((y, half_y))) => Self::new(x, y, half_x, half_y),
            _ => Self::INVALID,
        }
    }

    /// Whether segments `a1 -> a2` and `b1 -> b2` cross at the same point.
    #[must_use]
    pub fn midpoints_match(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
        let first = Self::between(a1, a2);
        first.is_valid() && first == Self::between(b1, b2)
    }

    /// Wrap-aware variant of [`Self::midpoints_match`].
    #[must_use]
    pub fn midpoints_match_wrapped(
        a1: Point,
        a2: Point,
        b1: Point,
        b2: Point,
        width: usize,
        height: usize,
    ) -> bool {
        let first = Self::between_wrapped(a1, a2, width, height);
        first.is_valid() && first == Self::between_wrapped(b1, b2, width, height)
    }
}

fn flat_axis(a: i32, b: i32) -> AxisMid {
    match (b - a).abs() {
        0 => Some((a, false)),
        1 => Some((a.min(b), true)),
        _ => None,
    }
}

fn wrapped_axis(a: i32, b: i32, size: i32) -> AxisMid {
    let delta = (b - a).abs();
    if delta == 0 {
        Some((a, false))
    } else if delta == 1 {
        Some((a.min(b), true))
    } else if size > 2 && delta == size - 1 {
        Some((size - 1, true))
    } else {
        None
    }
}

impl fmt::Display for MidPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let half = |flag: bool| if flag { ".5" } else { "" };
        write!(
            f,
            "({}{},{}{})",
            self.x,
            half(self.half_x),
            self.y,
            half(self.half_y)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_point_handles_negatives() {
        assert_eq!(wrap_point(Point::new(-1, -1), 10, 5), Point::new(9, 4));
        assert_eq!(wrap_point(Point::new(10, 5), 10, 5), Point::new(0, 0));
        assert_eq!(wrap_point(Point::new(-21, 12), 10, 5), Point::new(9, 2));
    }

    #[test]
    fn test_step_distance_wraps() {
        assert_eq!(step_distance(Point::new(0, 0), Point::new(9, 0), 10, 10), 1);
        assert_eq!(step_distance(Point::new(0, 0), Point::new(9, 9), 10, 10), 1);
        assert_eq!(step_distance(Point::new(2, 2), Point::new(5, 3), 10, 10), 3);
        assert!(are_adjacent(Point::new(0, 4), Point::new(0, 0), 10, 5));
        assert!(!are_adjacent(Point::new(3, 3), Point::new(3, 3), 10, 10));
    }

    #[test]
    fn test_midpoint_same_point() {
        let mp = MidPoint::between_wrapped(Point::new(3, 4), Point::new(3, 4), 10, 10);
        assert_eq!(mp, MidPoint::new(3, 4, false, false));
        assert!(mp.is_valid());
    }

    #[test]
    fn test_midpoint_diagonal() {
        let mp = MidPoint::between(Point::new(2, 2), Point::new(1, 1));
        assert_eq!(mp, MidPoint::new(1, 1, true, true));
    }

    #[test]
    fn test_midpoint_wraparound_x() {
        let forward = MidPoint::between_wrapped(Point::new(9, 0), Point::new(0, 0), 10, 10);
        let back = MidPoint::between_wrapped(Point::new(0, 0), Point::new(9, 0), 10, 10);
        assert_eq!(forward, MidPoint::new(9, 0, true, false));
        assert_eq!(forward, back);
    }

    #[test]
    fn test_midpoint_wraparound_corner() {
        let mp = MidPoint::between_wrapped(Point::new(9, 9), Point::new(0, 0), 10, 10);
        assert_eq!(mp, MidPoint::new(9, 9, true, true));
    }

    #[test]
    fn test_midpoint_non_adjacent_is_invalid() {
        assert_eq!(
            MidPoint::between_wrapped(Point::new(0, 0), Point::new(2, 0), 10, 10),
            MidPoint::INVALID
        );
        // Adjacent on one axis only is still not adjacent.
        assert_eq!(
            MidPoint::between_wrapped(Point::new(0, 0), Point::new(5, 1), 10, 10),
            MidPoint::INVALID
        );
        assert_eq!(
            MidPoint::between(Point::new(0, 0), Point::new(9, 0)),
            MidPoint::INVALID
        );
    }

    #[test]
    fn test_midpoints_match_crossing_diagonals() {
        // (1,1)->(2,2) crosses (1,2)->(2,1) at (1.5,1.5)
        assert!(MidPoint::midpoints_match_wrapped(
            Point::new(1, 1),
            Point::new(2, 2),
            Point::new(1, 2),
            Point::new(2, 1),
            10,
            10
        ));
        assert!(!MidPoint::midpoints_match(
            Point::new(0, 0),
            Point::new(1, 1),
            Point::new(2, 2),
            Point::new(3, 3)
        ));
    }

    #[test]
    fn test_invalid_midpoints_never_match() {
        assert!(!MidPoint::midpoints_match(
            Point::new(0, 0),
            Point::new(5, 5),
            Point::new(0, 0),
            Point::new(5, 5)
        ));
    }

    #[test]
    fn test_midpoint_ordering() {
        let mut points = vec![
            MidPoint::new(1, 0, true, false),
            MidPoint::new(0, 1, false, false),
            MidPoint::new(0, 1, false, true),
            MidPoint::new(0, 0, true, true),
        ];
        points.sort();
        assert_eq!(
            points,
            vec![
                MidPoint::new(0, 0, true, true),
                MidPoint::new(0, 1, false, false),
                MidPoint::new(0, 1, false, true),
                MidPoint::new(1, 0, true, false),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Point::new(3, -2).to_string(), "(3,-2)");
        assert_eq!(MidPoint::new(9, 0, true, false).to_string(), "(9.5,0)");
    }
}
