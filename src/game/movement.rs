//! Movement Resolution
//!
//! Turns a decoded keystroke into position changes: single steps, slides,
//! swaps with other players and gold pickups.

use crate::core::grid::{Direction, MoveKey};
use crate::game::state::Session;

/// Result of one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target cell is not passable; nothing changed.
    Invalid,
    /// Moved onto an empty cell.
    Moved,
    /// Moved onto a pile and took all of it.
    MovedOntoGold {
        /// Nuggets taken from the pile
        collected: u32,
    },
    /// Traded places with the player at this roster index.
    MovedOntoPlayer {
        /// Roster index of the other player
        other: usize,
    },
}

impl MoveOutcome {
    /// Did anything move?
    #[inline]
    pub fn is_success(self) -> bool {
        !matches!(self, MoveOutcome::Invalid)
    }
}

/// Take one step in `direction`.
pub fn step(session: &mut Session, player: usize, direction: Direction) -> MoveOutcome {
    let from = session.players[player].position;
    let to = from.step(direction);

    if !session.map.is_passable(to) {
        return MoveOutcome::Invalid;
    }

    if let Some(other) = session.player_at(to) {
        session.players[other].position = from;
        session.players[player].position = to;
        session.refresh_view(other);
        session.refresh_view(player);
        return MoveOutcome::MovedOntoPlayer { other };
    }

    session.players[player].position = to;
    let outcome = match session.pile_at(to) {
        Some(pile) => MoveOutcome::MovedOntoGold { collected: session.collect_pile(pile, player) },
        None => MoveOutcome::Moved,
    };
    session.refresh_view(player);
    outcome
}

/// Resolve a movement key for a player.
///
/// `on_step` runs after every successful step, including each step of a
/// slide, with visibility already recomputed. A slide stops at the first
/// blocked step, once all gold is gone, or after `max(rows, cols)` steps.
///
/// Returns the number of successful steps.
pub fn resolve(
    session: &mut Session,
    player: usize,
    key: MoveKey,
    mut on_step: impl FnMut(&Session, MoveOutcome),
) -> usize {
    match key {
        MoveKey::Step(direction) => {
            let outcome = step(session, player, direction);
            if outcome.is_success() {
                on_step(&*session, outcome);
                1
            } else {
                0
            }
        }
        MoveKey::Slide(direction) => {
            let limit = session.map.rows().max(session.map.cols());
            let mut taken = 0;
            while taken < limit {
                let outcome = step(session, player, direction);
                if !outcome.is_success() {
                    break;
                }
                taken += 1;
                on_step(&*session, outcome);
                if session.gold_remaining() == 0 {
                    break;
                }
            }
            taken
        }
    }
}
