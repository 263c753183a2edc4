//! Grid Coordinates
//!
//! Integer cell coordinates and the eight compass directions a player can move in.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A cell on the map grid.
///
/// `col` grows to the right, `row` grows downward, both zero-based.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    /// Column index
    pub col: i32,
    /// Row index
    pub row: i32,
}

impl GridPoint {
    /// Create a new point.
    #[inline]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Offset this point by one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            col: self.col + dx,
            row: self.row + dy,
        }
    }
}

impl fmt::Debug for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.col, self.row)
    }
}

/// One of the eight compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `h`
    West,
    /// `l`
    East,
    /// `k`
    North,
    /// `j`
    South,
    /// `y`
    NorthWest,
    /// `u`
    NorthEast,
    /// `b`
    SouthWest,
    /// `n`
    SouthEast,
}

impl Direction {
    /// All directions, in key order `h l k j y u b n`.
    pub const ALL: [Direction; 8] = [
        Direction::West,
        Direction::East,
        Direction::North,
        Direction::South,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Unit `(dx, dy)` vector.
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::NorthWest => (-1, -1),
            Direction::NorthEast => (1, -1),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (1, 1),
        }
    }

    /// Lower-case key for a single step.
    pub const fn key(self) -> char {
        match self {
            Direction::West => 'h',
            Direction::East => 'l',
            Direction::North => 'k',
            Direction::South => 'j',
            Direction::NorthWest => 'y',
            Direction::NorthEast => 'u',
            Direction::SouthWest => 'b',
            Direction::SouthEast => 'n',
        }
    }

    /// Direction for a lower-case movement key.
    pub fn from_key(key: char) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.key() == key)
    }
}

/// A decoded movement keystroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKey {
    /// Lower-case key: move one cell.
    Step(Direction),
    /// Upper-case key: keep moving until blocked.
    Slide(Direction),
}

impl MoveKey {
    /// Decode a keystroke; `None` for anything that is not a movement key.
    pub fn parse(key: char) -> Option<MoveKey> {
        if key.is_ascii_lowercase() {
            Direction::from_key(key).map(MoveKey::Step)
        } else if key.is_ascii_uppercase() {
            Direction::from_key(key.to_ascii_lowercase()).map(MoveKey::Slide)
        } else {
            None
        }
    }
}
