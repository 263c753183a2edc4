//! Broadcast Engine
//!
//! Fans the current world out to every connected client. Each recipient
//! gets its own rendering of the map and its own view of the gold.

use crate::game::state::Session;
use crate::network::outbox::Outbox;
use crate::network::protocol::ServerMessage;

/// Send every connected player its own map, and the spectator the full map.
pub fn broadcast_map(session: &Session, outbox: &mut Outbox) {
    for (index, player) in session.players().iter().enumerate() {
        if player.connected {
            outbox.send(player.addr, ServerMessage::Display(session.render_for_player(index)));
        }
    }
    if let Some(spectator) = session.spectator() {
        outbox.send(spectator.addr, ServerMessage::Display(session.render_for_spectator()));
    }
}

/// Announce a pickup.
///
/// The actor gets `(collected, purse, remaining)`; every other connected
/// player gets `(0, own purse, remaining)`; the spectator gets
/// `(0, 0, remaining)`.
pub fn broadcast_gold(session: &Session, actor: usize, collected: u32, outbox: &mut Outbox) {
    let remaining = session.gold_remaining();
    for (index, player) in session.players().iter().enumerate() {
        if !player.connected {
            continue;
        }
        let collected = if index == actor { collected } else { 0 };
        outbox.send(player.addr, ServerMessage::Gold { collected, purse: player.purse, remaining });
    }
    if let Some(spectator) = session.spectator() {
        outbox.send(spectator.addr, spectator_gold(session));
    }
}

/// Gold status as the spectator sees it.
pub fn spectator_gold(session: &Session) -> ServerMessage {
    ServerMessage::Gold { collected: 0, purse: 0, remaining: session.gold_remaining() }
}

/// Send the final ranking to every connected client.
pub fn send_summary(session: &Session, summary: &str, outbox: &mut Outbox) {
    for player in session.players().iter().filter(|p| p.connected) {
        outbox.send(player.addr, ServerMessage::GameOver(summary.to_string()));
    }
    if let Some(spectator) = session.spectator() {
        outbox.send(spectator.addr, ServerMessage::GameOver(summary.to_string()));
    }
}

/// Tell every connected client it is being disconnected.
pub fn broadcast_quit(session: &Session, reason: &str, outbox: &mut Outbox) {
    for player in session.players().iter().filter(|p| p.connected) {
        outbox.send(player.addr, ServerMessage::quit(reason));
    }
    if let Some(spectator) = session.spectator() {
        outbox.send(spectator.addr, ServerMessage::quit(reason));
    }
}
