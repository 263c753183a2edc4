//! Network Layer
//!
//! Text protocol over UDP. The dispatcher turns each datagram into session
//! changes plus an ordered outbox; the server owns the socket.

pub mod protocol;
pub mod outbox;
pub mod broadcast;
pub mod dispatcher;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, ParseError};
pub use outbox::{Envelope, Outbox};
pub use dispatcher::{handle_message, Flow};
pub use server::{GameServer, GameOutcome, ServerConfig, GameServerError};
