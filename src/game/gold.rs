//! Gold Piles
//!
//! Deterministic pile generation from the session RNG: how many piles, how
//! the nuggets are split between them, and where they are dropped.

use serde::{Serialize, Deserialize};

use crate::config::GameConfig;
use crate::core::grid::GridPoint;
use crate::core::rng::SessionRng;

/// A pile of nuggets lying on a room spot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldPile {
    /// Where the pile lies
    pub position: GridPoint,
    /// Nuggets in the pile (always at least one)
    pub nuggets: u32,
}

impl GoldPile {
    /// Create a pile.
    pub const fn new(position: GridPoint, nuggets: u32) -> Self {
        Self { position, nuggets }
    }
}

/// Draw the number of piles for a session.
///
/// Uniform in `min_piles..=max_piles`, then capped so every pile holds at
/// least one nugget and sits on its own room spot.
pub fn draw_pile_count(rng: &mut SessionRng, config: &GameConfig, room_spots: usize) -> u32 {
    let drawn = rng.next_int_range(config.min_piles, config.max_piles);
    let spots = u32::try_from(room_spots).unwrap_or(u32::MAX);
    drawn.min(config.gold_total).min(spots).max(1)
}

/// Split `total` nuggets into `piles` positive parts.
///
/// Picks `piles - 1` distinct cut points in `1..total` and takes the gaps
/// between them, so the parts always sum to `total`.
pub fn partition(rng: &mut SessionRng, total: u32, piles: u32) -> Vec<u32> {
    if total == 0 || piles == 0 {
        return Vec::new();
    }
    let piles = piles.min(total);

    let mut cuts: Vec<u32> = (1..total).collect();
    rng.shuffle(&mut cuts);
    cuts.truncate((piles - 1) as usize);
    cuts.sort_unstable();

    let mut parts = Vec::with_capacity(piles as usize);
    let mut last = 0;
    for cut in cuts {
        parts.push(cut - last);
        last = cut;
    }
    parts.push(total - last);
    parts
}

/// Scatter the whole configured gold over distinct room spots.
pub fn scatter(rng: &mut SessionRng, config: &GameConfig, room_spots: &[GridPoint]) -> Vec<GoldPile> {
    if room_spots.is_empty() {
        return Vec::new();
    }

    let count = draw_pile_count(rng, config, room_spots.len());
    let amounts = partition(rng, config.gold_total, count);

    let mut spots = room_spots.to_vec();
    rng.shuffle(&mut spots);

    spots
        .into_iter()
        .zip(amounts)
        .map(|(position, nuggets)| GoldPile::new(position, nuggets))
        .collect()
}
