//! Protocol Dispatcher
//!
//! One call per inbound datagram. Classifies the message, applies it to the
//! session, queues every reply and broadcast in order, then checks whether
//! the game is over.
//!
//! Ordering for anything that changes the map:
//! mutate, recompute visibility, broadcast, check termination.

use std::net::SocketAddr;

use tracing::{debug, error, info};

use crate::core::grid::MoveKey;
use crate::game::endgame;
use crate::game::movement::{self, MoveOutcome};
use crate::game::state::Session;
use crate::network::broadcast;
use crate::network::outbox::Outbox;
use crate::network::protocol::{
    ClientMessage, ServerMessage,
    NO_INVALID_KEY, NO_INVALID_MOVE, NO_NOT_IN_GAME, NO_PLAYER_SPECTATE, NO_SPECTATOR_MOVE,
    QUIT_PLAYING, QUIT_REPLACED, QUIT_WATCHING,
};

/// Key that leaves the game.
pub const QUIT_KEY: char = 'Q';

/// What the receive loop should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep receiving.
    Continue,
    /// All gold collected; the summary has been queued.
    GameOver,
}

/// Handle one inbound datagram.
///
/// # Panics
///
/// Panics if the session invariants no longer hold afterwards. That is a
/// bug in the game logic, not something a client can cause.
pub fn handle_message(session: &mut Session, from: SocketAddr, text: &str, outbox: &mut Outbox) -> Flow {
    if !session.is_playing() {
        debug!(%from, "Session over, message ignored");
        return Flow::GameOver;
    }

    match ClientMessage::parse(text) {
        Ok(ClientMessage::Spectate) => handle_spectate(session, from, outbox),
        Ok(ClientMessage::Play { name }) => handle_play(session, from, &name, outbox),
        Ok(ClientMessage::Key(key)) => handle_key(session, from, key, outbox),
        Err(e) => {
            debug!(%from, error = %e, "Rejected message");
            outbox.send(from, ServerMessage::no(e));
        }
    }

    if let Err(violation) = session.audit() {
        error!(%violation, "Session invariant violated");
        panic!("session invariant violated: {violation}");
    }

    check_termination(session, outbox)
}

fn handle_spectate(session: &mut Session, from: SocketAddr, outbox: &mut Outbox) {
    if session.find_player(from).is_some() {
        outbox.send(from, ServerMessage::no(NO_PLAYER_SPECTATE));
        return;
    }

    if let Some(previous) = session.install_spectator(from) {
        if previous.addr != from {
            outbox.send(previous.addr, ServerMessage::quit(QUIT_REPLACED));
        }
    }

    let map = session.map();
    outbox.send(from, ServerMessage::Grid { rows: map.rows(), cols: map.cols() });
    outbox.send(from, ServerMessage::Display(session.render_for_spectator()));
    outbox.send(from, broadcast::spectator_gold(session));
}

fn handle_play(session: &mut Session, from: SocketAddr, name: &str, outbox: &mut Outbox) {
    let letter = match session.admit_player(name, from) {
        Ok(letter) => letter,
        Err(e) => {
            info!(%from, reason = %e, "Player rejected");
            outbox.send(from, ServerMessage::no(e));
            return;
        }
    };

    let map = session.map();
    outbox.send(from, ServerMessage::Ok(letter));
    outbox.send(from, ServerMessage::Grid { rows: map.rows(), cols: map.cols() });
    broadcast::broadcast_map(session, outbox);
    outbox.send(from, ServerMessage::Gold { collected: 0, purse: 0, remaining: session.gold_remaining() });
}

fn handle_key(session: &mut Session, from: SocketAddr, key: char, outbox: &mut Outbox) {
    if session.is_spectator(from) {
        if key == QUIT_KEY {
            session.remove_spectator();
            outbox.send(from, ServerMessage::quit(QUIT_WATCHING));
        } else {
            outbox.send(from, ServerMessage::no(NO_SPECTATOR_MOVE));
        }
        return;
    }

    let Some(player) = session.find_player(from) else {
        outbox.send(from, ServerMessage::no(NO_NOT_IN_GAME));
        return;
    };

    if key == QUIT_KEY {
        session.disconnect_player(player);
        outbox.send(from, ServerMessage::quit(QUIT_PLAYING));
        broadcast::broadcast_map(session, outbox);
        return;
    }

    let Some(move_key) = MoveKey::parse(key) else {
        outbox.send(from, ServerMessage::no(NO_INVALID_KEY));
        return;
    };

    let steps = movement::resolve(session, player, move_key, |session, outcome| {
        if let MoveOutcome::MovedOntoGold { collected } = outcome {
            broadcast::broadcast_gold(session, player, collected, outbox);
        }
        broadcast::broadcast_map(session, outbox);
    });
    debug!(%from, %key, steps, "Move resolved");

    // A blocked slide is a no-op; a blocked single step is an error
    if steps == 0 && matches!(move_key, MoveKey::Step(_)) {
        outbox.send(from, ServerMessage::no(NO_INVALID_MOVE));
    }
}

/// End the game once the last nugget is gone.
fn check_termination(session: &mut Session, outbox: &mut Outbox) -> Flow {
    if session.gold_remaining() > 0 {
        return Flow::Continue;
    }
    let summary = endgame::summary(session.players());
    broadcast::send_summary(session, &summary, outbox);
    session.finish();
    Flow::GameOver
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::GameConfig;
    use crate::core::grid::GridPoint;
    use crate::core::rng::SessionRng;
    use crate::game::gold::GoldPile;
    use crate::game::map::{GameMap, fixtures::LONG_ROOM};
    use crate::game::state::SessionPhase;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn session_with(piles: Vec<GoldPile>, config: GameConfig) -> Session {
        let map = GameMap::parse(LONG_ROOM).unwrap();
        Session::with_gold(map, config, SessionRng::new(2024), piles).unwrap()
    }

    fn one_pile() -> Vec<GoldPile> {
        vec![GoldPile::new(GridPoint::new(14, 3), 10)]
    }

    fn send(session: &mut Session, from: SocketAddr, text: &str) -> (Flow, Outbox) {
        let mut outbox = Outbox::new();
        let flow = handle_message(session, from, text, &mut outbox);
        (flow, outbox)
    }

    fn kinds(messages: &[&ServerMessage]) -> Vec<&'static str> {
        messages.iter().map(|m| m.kind()).collect()
    }

    #[test]
    fn test_play_reply_order() {
        let mut s = session_with(one_pile(), GameConfig::default());
        let (flow, outbox) = send(&mut s, addr(1), "PLAY alice");

        assert_eq!(flow, Flow::Continue);
        assert_eq!(kinds(&outbox.to(addr(1))), vec!["OK", "GRID", "DISPLAY", "GOLD"]);
        assert_eq!(outbox.to(addr(1))[0], &ServerMessage::Ok('A'));
        assert_eq!(outbox.to(addr(1))[1], &ServerMessage::Grid { rows: 5, cols: 16 });
        assert_eq!(outbox.to(addr(1))[3], &ServerMessage::Gold { collected: 0, purse: 0, remaining: 10 });
    }

    #[test]
    fn test_new_player_is_broadcast_to_others() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(9), "SPECTATE");
        let (_, outbox) = send(&mut s, addr(2), "PLAY bob");

        assert_eq!(kinds(&outbox.to(addr(1))), vec!["DISPLAY"]);
        assert_eq!(kinds(&outbox.to(addr(9))), vec!["DISPLAY"]);
    }

    #[test]
    fn test_capacity_plus_one_rejected() {
        let config = GameConfig { max_players: 3, ..Default::default() };
        let mut s = session_with(one_pile(), config);
        for port in 1..=3 {
            send(&mut s, addr(port), &format!("PLAY p{port}"));
        }

        let (_, outbox) = send(&mut s, addr(4), "PLAY late");
        assert_eq!(outbox.to(addr(4)), vec![&ServerMessage::no("Maximum players reached")]);
        assert_eq!(outbox.len(), 1);
        assert_eq!(s.players().len(), 3);
    }

    #[test]
    fn test_play_without_name() {
        let mut s = session_with(one_pile(), GameConfig::default());
        let (_, outbox) = send(&mut s, addr(1), "PLAY   ");
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no("You must provide a player name")]);
        assert!(s.players().is_empty());
    }

    #[test]
    fn test_spectator_replacement_order() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(8), "SPECTATE");
        let (_, outbox) = send(&mut s, addr(9), "SPECTATE");

        assert_eq!(outbox.to(addr(8)), vec![&ServerMessage::quit(QUIT_REPLACED)]);
        assert_eq!(kinds(&outbox.to(addr(9))), vec!["GRID", "DISPLAY", "GOLD"]);
        // The old spectator is told first
        assert_eq!(outbox.iter().next().map(|e| e.to), Some(addr(8)));
        assert!(s.is_spectator(addr(9)));
    }

    #[test]
    fn test_player_cannot_spectate_or_rejoin() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");

        let (_, outbox) = send(&mut s, addr(1), "SPECTATE");
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no(NO_PLAYER_SPECTATE)]);

        let (_, outbox) = send(&mut s, addr(1), "PLAY again");
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no("Already connected")]);
        assert_eq!(s.players().len(), 1);
    }

    #[test]
    fn test_invalid_key_has_no_broadcast() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(2), "PLAY bob");
        send(&mut s, addr(9), "SPECTATE");

        let (flow, outbox) = send(&mut s, addr(1), "KEY x");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no(NO_INVALID_KEY)]);
    }

    #[test]
    fn test_blocked_step_is_rejected_to_mover_only() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(9), "SPECTATE");
        s.place_player('A', GridPoint::new(1, 1));

        let (flow, outbox) = send(&mut s, addr(1), "KEY h");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no(NO_INVALID_MOVE)]);
        assert_eq!(s.players()[0].position, GridPoint::new(1, 1));
    }

    #[test]
    fn test_blocked_slide_is_silent() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        s.place_player('A', GridPoint::new(1, 1));

        let (flow, outbox) = send(&mut s, addr(1), "KEY Y");
        assert_eq!(flow, Flow::Continue);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_key_from_stranger_is_rejected() {
        let mut s = session_with(one_pile(), GameConfig::default());
        let (_, outbox) = send(&mut s, addr(5), "KEY Q");
        assert_eq!(outbox.to(addr(5)), vec![&ServerMessage::no(NO_NOT_IN_GAME)]);

        let (_, outbox) = send(&mut s, addr(5), "KEY l");
        assert_eq!(outbox.len(), 1);
        assert!(s.players().is_empty());
        assert_eq!(s.gold_remaining(), 10);
    }

    #[test]
    fn test_unrecognized_message() {
        let mut s = session_with(one_pile(), GameConfig::default());
        let (_, outbox) = send(&mut s, addr(5), "DANCE");
        assert_eq!(outbox.to(addr(5)), vec![&ServerMessage::no("Unrecognized message")]);
    }

    #[test]
    fn test_player_quit() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(2), "PLAY bob");

        let (_, outbox) = send(&mut s, addr(1), "KEY Q");
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::quit(QUIT_PLAYING)]);
        assert_eq!(kinds(&outbox.to(addr(2))), vec!["DISPLAY"]);
        assert!(!s.players()[0].connected);

        // Gone for good: further keys are from a stranger
        let (_, outbox) = send(&mut s, addr(1), "KEY l");
        assert_eq!(outbox.to(addr(1)), vec![&ServerMessage::no(NO_NOT_IN_GAME)]);
    }

    #[test]
    fn test_spectator_quit_and_move() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(9), "SPECTATE");

        let (_, outbox) = send(&mut s, addr(9), "KEY h");
        assert_eq!(outbox.to(addr(9)), vec![&ServerMessage::no(NO_SPECTATOR_MOVE)]);

        let (_, outbox) = send(&mut s, addr(9), "KEY Q");
        assert_eq!(outbox.to(addr(9)), vec![&ServerMessage::quit(QUIT_WATCHING)]);
        assert_eq!(s.spectator(), None);
    }

    #[test]
    fn test_pickup_sends_gold_before_display() {
        let piles = vec![GoldPile::new(GridPoint::new(2, 1), 4), GoldPile::new(GridPoint::new(14, 3), 6)];
        let mut s = session_with(piles, GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(9), "SPECTATE");
        s.place_player('A', GridPoint::new(1, 1));

        let (_, outbox) = send(&mut s, addr(1), "KEY l");
        assert_eq!(kinds(&outbox.to(addr(1))), vec!["GOLD", "DISPLAY"]);
        assert_eq!(outbox.to(addr(1))[0], &ServerMessage::Gold { collected: 4, purse: 4, remaining: 6 });
        assert_eq!(outbox.to(addr(9))[0], &ServerMessage::Gold { collected: 0, purse: 0, remaining: 6 });
    }

    #[test]
    fn test_slide_broadcasts_each_step() {
        let mut s = session_with(one_pile(), GameConfig::default());
        send(&mut s, addr(1), "PLAY alice");
        send(&mut s, addr(9), "SPECTATE");
        s.place_player('A', GridPoint::new(1, 1));

        let (_, outbox) = send(&mut s, addr(1), "KEY L");
        // 13 steps along the top row, one DISPLAY each
        assert_eq!(outbox.to(addr(9)).len(), 13);
        assert_eq!(s.players()[0].position, GridPoint::new(14, 1));
    }

    #[test]
    fn test_scenario_collect_all_gold() {
        // 250 nuggets in 10 piles of 25 along the middle row
        let piles: Vec<GoldPile> = (2..=11).map(|c| GoldPile::new(GridPoint::new(c, 2), 25)).collect();
        let mut s = session_with(piles, GameConfig::default());
        assert_eq!(s.gold_total(), 250);

        send(&mut s, addr(1), "PLAY miner");
        send(&mut s, addr(9), "SPECTATE");
        s.place_player('A', GridPoint::new(1, 2));

        let mut game_overs = 0;
        let mut last_remaining = s.gold_remaining();
        for step in 1..=10 {
            let (flow, outbox) = send(&mut s, addr(1), "KEY l");
            assert!(s.gold_remaining() < last_remaining);
            last_remaining = s.gold_remaining();

            game_overs += outbox.iter().filter(|e| matches!(e.message, ServerMessage::GameOver(_))).count();
            if step < 10 {
                assert_eq!(flow, Flow::Continue);
            } else {
                assert_eq!(flow, Flow::GameOver);
                assert_eq!(
                    outbox.to(addr(1)).last(),
                    Some(&&ServerMessage::GameOver("1. A miner 250\n".into()))
                );
            }
        }

        // One summary each for the player and the spectator
        assert_eq!(game_overs, 2);
        assert_eq!(s.gold_remaining(), 0);
        assert_eq!(s.phase(), SessionPhase::Ended);

        let (flow, outbox) = send(&mut s, addr(1), "KEY h");
        assert_eq!(flow, Flow::GameOver);
        assert!(outbox.is_empty());
        assert_eq!(s.players()[0].position, GridPoint::new(11, 2));
    }

    #[test]
    fn test_summary_ranks_disconnected_players() {
        let piles = vec![GoldPile::new(GridPoint::new(2, 1), 5), GoldPile::new(GridPoint::new(2, 3), 7)];
        let mut s = session_with(piles, GameConfig::default());
        send(&mut s, addr(1), "PLAY ann");
        send(&mut s, addr(2), "PLAY bo");
        s.place_player('A', GridPoint::new(1, 1));
        s.place_player('B', GridPoint::new(1, 3));

        send(&mut s, addr(1), "KEY l");
        send(&mut s, addr(1), "KEY Q");
        let (flow, outbox) = send(&mut s, addr(2), "KEY l");

        assert_eq!(flow, Flow::GameOver);
        assert!(outbox.to(addr(1)).is_empty());
        assert_eq!(
            outbox.to(addr(2)).last(),
            Some(&&ServerMessage::GameOver("1. B bo 7\n2. A ann 5\n".into()))
        );
    }
}
