//! Visibility
//!
//! Line-of-sight between cells and the per-player view of the map.
//!
//! A cell is visible from a viewer when the straight segment between the two
//! cell centres only crosses transparent cells (room spots). Where the segment
//! passes exactly between two cells it is blocked only if both are opaque.
//! All arithmetic is exact: crossing rows and columns are computed as
//! rationals, never floats.

use crate::core::grid::GridPoint;
use crate::game::map::{GameMap, render_rows};

/// Something drawn over the terrain: a gold pile or a player letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    /// Where it is drawn
    pub at: GridPoint,
    /// What is drawn
    pub glyph: char,
}

impl Marker {
    /// Glyph used for gold piles.
    pub const GOLD: char = '*';

    /// Glyph a player sees for itself.
    pub const SELF: char = '@';

    /// Create a marker.
    pub const fn new(at: GridPoint, glyph: char) -> Self {
        Self { at, glyph }
    }
}

/// Is `to` visible from `from`?
pub fn line_of_sight(map: &GameMap, from: GridPoint, to: GridPoint) -> bool {
    let dx = to.col - from.col;
    let dy = to.row - from.row;

    // Columns strictly between the endpoints
    for step in 1..dx.abs() {
        let c = from.col + step * dx.signum();
        if blocked_at(dy * step, dx.abs(), |offset| {
            map.is_transparent(GridPoint::new(c, from.row + offset))
        }) {
            return false;
        }
    }

    // Rows strictly between the endpoints
    for step in 1..dy.abs() {
        let r = from.row + step * dy.signum();
        if blocked_at(dx * step, dy.abs(), |offset| {
            map.is_transparent(GridPoint::new(from.col + offset, r))
        }) {
            return false;
        }
    }

    true
}

/// Check the crossing at offset `num / den` (den > 0) along the minor axis.
fn blocked_at(num: i32, den: i32, transparent: impl Fn(i32) -> bool) -> bool {
    let whole = num.div_euclid(den);
    if num.rem_euclid(den) == 0 {
        !transparent(whole)
    } else {
        !transparent(whole) && !transparent(whole + 1)
    }
}

/// What one player currently sees and has seen before.
#[derive(Clone, Debug)]
pub struct PlayerView {
    seen: Vec<bool>,
    visible: Vec<bool>,
}

impl PlayerView {
    /// A view that has seen nothing yet.
    pub fn new(map: &GameMap) -> Self {
        Self {
            seen: vec![false; map.len()],
            visible: vec![false; map.len()],
        }
    }

    /// Recompute visibility from `position`; newly visible cells are remembered.
    pub fn refresh(&mut self, map: &GameMap, position: GridPoint) {
        for index in 0..map.len() {
            let now = line_of_sight(map, position, map.point(index));
            self.visible[index] = now;
            self.seen[index] |= now;
        }
    }

    /// Is the point visible right now?
    pub fn is_visible(&self, map: &GameMap, point: GridPoint) -> bool {
        map.index(point).is_some_and(|i| self.visible[i])
    }

    /// Has the point ever been visible?
    pub fn has_seen(&self, map: &GameMap, point: GridPoint) -> bool {
        map.index(point).is_some_and(|i| self.seen[i])
    }

    /// Render this player's map.
    ///
    /// Remembered cells show terrain only; markers appear only where
    /// currently visible. The viewer itself is drawn as `@`.
    pub fn render(&self, map: &GameMap, me: GridPoint, markers: &[Marker]) -> String {
        let mut rows = map.glyph_rows();
        for (index, seen) in self.seen.iter().enumerate() {
            if !seen {
                let p = map.point(index);
                rows[p.row as usize][p.col as usize] = ' ';
            }
        }
        for marker in markers {
            if self.is_visible(map, marker.at) {
                rows[marker.at.row as usize][marker.at.col as usize] = marker.glyph;
            }
        }
        if map.in_bounds(me) {
            rows[me.row as usize][me.col as usize] = Marker::SELF;
        }
        render_rows(&rows)
    }
}

/// Render the whole map with every marker, as the spectator sees it.
pub fn render_full(map: &GameMap, markers: &[Marker]) -> String {
    let mut rows = map.glyph_rows();
    for marker in markers {
        if map.in_bounds(marker.at) {
            rows[marker.at.row as usize][marker.at.col as usize] = marker.glyph;
        }
    }
    render_rows(&rows)
}
