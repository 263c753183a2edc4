//! Protocol Messages
//!
//! Text wire format, one message per datagram, space-separated tokens.
//!
//! Inbound: `SPECTATE`, `PLAY <name>`, `KEY <char>`.
//! Outbound: `OK`, `GRID`, `DISPLAY`, `GOLD`, `QUIT`, `NO`, `GAMEOVER`.

use std::fmt;
use thiserror::Error;

/// Reply to a player who quits.
pub const QUIT_PLAYING: &str = "Thanks for playing!";

/// Reply to a spectator who quits.
pub const QUIT_WATCHING: &str = "Thanks for watching!";

/// Sent to a spectator replaced by a newer one.
pub const QUIT_REPLACED: &str = "You have been replaced by a new spectator.";

/// Sent to everyone when the server is interrupted.
pub const QUIT_SHUTDOWN: &str = "Server shutting down";

/// Rejection for a movement key that does not decode.
pub const NO_INVALID_KEY: &str = "Invalid key";

/// Rejection for a single step into a cell nobody can stand on.
pub const NO_INVALID_MOVE: &str = "Invalid move";

/// Rejection for a `KEY` from a sender with no role in the game.
pub const NO_NOT_IN_GAME: &str = "You are not in the game";

/// Rejection for a spectator trying to move.
pub const NO_SPECTATOR_MOVE: &str = "Spectators cannot move";

/// Rejection for a connected player asking to spectate.
pub const NO_PLAYER_SPECTATE: &str = "Players cannot spectate";

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Watch the whole map.
    Spectate,

    /// Join as a player. The name is raw; the session sanitizes it.
    Play {
        /// Requested name, unsanitized
        name: String,
    },

    /// A single keystroke.
    Key(char),
}

/// Inbound parse failures. Each displays as the `NO` reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `KEY` without exactly one character.
    #[error("Invalid key")]
    MalformedKey,

    /// Anything that is not one of the three commands.
    #[error("Unrecognized message")]
    Unrecognized,
}

impl ClientMessage {
    /// Parse one datagram.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim_end_matches(|c: char| c == '\n' || c == '\r');

        if text == "SPECTATE" {
            return Ok(ClientMessage::Spectate);
        }

        if let Some(rest) = text.strip_prefix("PLAY") {
            return match rest.strip_prefix(' ') {
                Some(name) => Ok(ClientMessage::Play { name: name.to_string() }),
                None if rest.is_empty() => Ok(ClientMessage::Play { name: String::new() }),
                None => Err(ParseError::Unrecognized),
            };
        }

        if let Some(rest) = text.strip_prefix("KEY ") {
            let mut chars = rest.chars();
            return match (chars.next(), chars.next()) {
                (Some(key), None) => Ok(ClientMessage::Key(key)),
                _ => Err(ParseError::MalformedKey),
            };
        }
        if text == "KEY" {
            return Err(ParseError::MalformedKey);
        }

        Err(ParseError::Unrecognized)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
///
/// `Display` produces the exact datagram text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Admission accepted; the player's letter.
    Ok(char),

    /// Map dimensions.
    Grid {
        /// Map rows
        rows: usize,
        /// Map columns
        cols: usize,
    },

    /// The recipient's rendered map, one line per row.
    Display(String),

    /// Gold status: just picked up, own purse, left on the map.
    Gold {
        /// Nuggets just picked up
        collected: u32,
        /// Recipient's total
        purse: u32,
        /// Nuggets still on the map
        remaining: u32,
    },

    /// The recipient is disconnected, with an optional reason.
    Quit(Option<String>),

    /// Request rejected.
    No(String),

    /// Final ranking, one line per player.
    GameOver(String),
}

impl ServerMessage {
    /// `QUIT` with a reason.
    pub fn quit(reason: &str) -> Self {
        ServerMessage::Quit(Some(reason.to_string()))
    }

    /// `NO` with a reason.
    pub fn no(reason: impl fmt::Display) -> Self {
        ServerMessage::No(reason.to_string())
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Ok(_) => "OK",
            ServerMessage::Grid { .. } => "GRID",
            ServerMessage::Display(_) => "DISPLAY",
            ServerMessage::Gold { .. } => "GOLD",
            ServerMessage::Quit(_) => "QUIT",
            ServerMessage::No(_) => "NO",
            ServerMessage::GameOver(_) => "GAMEOVER",
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Ok(letter) => write!(f, "OK {letter}"),
            ServerMessage::Grid { rows, cols } => write!(f, "GRID {rows} {cols}"),
            ServerMessage::Display(grid) => write!(f, "DISPLAY\n{grid}"),
            ServerMessage::Gold { collected, purse, remaining } => {
                write!(f, "GOLD {collected} {purse} {remaining}")
            }
            ServerMessage::Quit(None) => f.write_str("QUIT"),
            ServerMessage::Quit(Some(reason)) => write!(f, "QUIT {reason}"),
            ServerMessage::No(reason) => write!(f, "NO {reason}"),
            ServerMessage::GameOver(summary) => write!(f, "GAMEOVER\n{summary}"),
        }
    }
}
