//! Map Grid
//!
//! Parses map text into a fixed grid of cells and answers passability and
//! transparency queries for movement and visibility.

use thiserror::Error;

use crate::core::grid::GridPoint;

/// Kind of a single map cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// `' '` outside the caves
    Rock,
    /// `'-'`
    HorizontalWall,
    /// `'|'`
    VerticalWall,
    /// `'+'`
    Corner,
    /// `'.'` open floor inside a room
    RoomSpot,
    /// `'#'` tunnel between rooms
    Passage,
}

impl Cell {
    /// Decode a map character.
    pub fn from_char(ch: char) -> Option<Cell> {
        match ch {
            ' ' => Some(Cell::Rock),
            '-' => Some(Cell::HorizontalWall),
            '|' => Some(Cell::VerticalWall),
            '+' => Some(Cell::Corner),
            '.' => Some(Cell::RoomSpot),
            '#' => Some(Cell::Passage),
            _ => None,
        }
    }

    /// Map character for this cell.
    pub fn glyph(self) -> char {
        match self {
            Cell::Rock => ' ',
            Cell::HorizontalWall => '-',
            Cell::VerticalWall => '|',
            Cell::Corner => '+',
            Cell::RoomSpot => '.',
            Cell::Passage => '#',
        }
    }

    /// Can a player stand here?
    #[inline]
    pub fn is_passable(self) -> bool {
        matches!(self, Cell::RoomSpot | Cell::Passage)
    }

    /// Can a player see through this cell?
    #[inline]
    pub fn is_transparent(self) -> bool {
        matches!(self, Cell::RoomSpot)
    }
}

/// Map parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The map text has no lines.
    #[error("map is empty")]
    Empty,

    /// A character outside the map alphabet.
    #[error("unknown map character {ch:?} at row {row}, column {col}")]
    UnknownCell {
        /// Zero-based line
        row: usize,
        /// Zero-based character offset
        col: usize,
        /// The offending character
        ch: char,
    },

    /// Nowhere to place gold or players.
    #[error("map has no room spots")]
    NoRoomSpots,
}

/// The authoritative, immutable cave grid.
#[derive(Clone, Debug)]
pub struct GameMap {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl GameMap {
    /// Parse map text.
    ///
    /// Lines shorter than the widest line are padded with rock.
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if lines.is_empty() {
            return Err(MapError::Empty);
        }

        let rows = lines.len();
        let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if cols == 0 {
            return Err(MapError::Empty);
        }

        let mut cells = vec![Cell::Rock; rows * cols];
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(MapError::UnknownCell { row, col, ch })?;
                cells[row * cols + col] = cell;
            }
        }

        if !cells.contains(&Cell::RoomSpot) {
            return Err(MapError::NoRoomSpots);
        }

        Ok(Self { rows, cols, cells })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a parsed map.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Is the point inside the grid?
    #[inline]
    pub fn in_bounds(&self, point: GridPoint) -> bool {
        point.col >= 0
            && point.row >= 0
            && (point.col as usize) < self.cols
            && (point.row as usize) < self.rows
    }

    /// Flat index of an in-bounds point.
    #[inline]
    pub fn index(&self, point: GridPoint) -> Option<usize> {
        if self.in_bounds(point) {
            Some(point.row as usize * self.cols + point.col as usize)
        } else {
            None
        }
    }

    /// Point for a flat index.
    #[inline]
    pub fn point(&self, index: usize) -> GridPoint {
        GridPoint::new((index % self.cols) as i32, (index / self.cols) as i32)
    }

    /// Cell at a point; out-of-bounds reads as rock.
    #[inline]
    pub fn cell(&self, point: GridPoint) -> Cell {
        self.index(point).map_or(Cell::Rock, |i| self.cells[i])
    }

    /// Can a player stand at this point?
    #[inline]
    pub fn is_passable(&self, point: GridPoint) -> bool {
        self.cell(point).is_passable()
    }

    /// Can a player see through this point?
    #[inline]
    pub fn is_transparent(&self, point: GridPoint) -> bool {
        self.cell(point).is_transparent()
    }

    /// All room spots, in row-major order.
    pub fn room_spots(&self) -> Vec<GridPoint> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::RoomSpot)
            .map(|(i, _)| self.point(i))
            .collect()
    }

    /// Terrain glyphs, one `Vec<char>` per row.
    pub fn glyph_rows(&self) -> Vec<Vec<char>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.glyph()).collect())
            .collect()
    }
}

/// Join glyph rows into grid text, each row terminated by a newline.
pub fn render_rows(rows: &[Vec<char>]) -> String {
    let mut out = String::with_capacity(rows.iter().map(|r| r.len() + 1).sum());
    for row in rows {
        out.extend(row.iter());
        out.push('\n');
    }
    out
}
