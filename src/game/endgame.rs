//! Endgame Ranking
//!
//! Orders the roster by purse and formats the final summary.

use crate::game::state::PlayerState;

/// Players ranked by purse, richest first.
///
/// Disconnected players are included. Ties keep roster order.
pub fn rank(players: &[PlayerState]) -> Vec<&PlayerState> {
    let mut ranked: Vec<&PlayerState> = players.iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.purse.cmp(&a.purse));
    ranked
}

/// Summary body sent after `GAMEOVER`: `<rank>. <letter> <name> <purse>` per line.
pub fn summary(players: &[PlayerState]) -> String {
    rank(players)
        .into_iter()
        .enumerate()
        .map(|(i, player)| format!("{}. {} {} {}\n", i + 1, player.letter, player.name, player.purse))
        .collect()
}
