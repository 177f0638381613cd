//! Grid coordinates on the CGRA board.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A cell coordinate on the board: `x` is the column, `y` the row.
///
/// Coordinates order row-major (`y` first, then `x`), which is the board's
/// enumeration order. A `BTreeSet<Coord>` therefore iterates cells in the
/// same order the board lists them. Serialized as an `[x, y]` pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Coord {
    /// Column index (0-based, left to right).
    pub x: u32,
    /// Row index (0-based, top to bottom).
    pub y: u32,
}

impl Coord {
    /// Creates a coordinate from a column and a row.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the Manhattan distance to `other`.
    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<(u32, u32)> for Coord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<Coord> for (u32, u32) {
    fn from(c: Coord) -> Self {
        (c.x, c.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
