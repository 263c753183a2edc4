//! Outbound Queue
//!
//! Everything a single inbound message produces, in send order. The game
//! logic only ever writes here; the server drains it onto the socket.

use std::net::SocketAddr;

use crate::network::protocol::ServerMessage;

/// One outbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Recipient
    pub to: SocketAddr,
    /// Payload
    pub message: ServerMessage,
}

/// Ordered outbound datagrams.
#[derive(Debug, Default)]
pub struct Outbox {
    envelopes: Vec<Envelope>,
}

impl Outbox {
    /// An empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message.
    pub fn send(&mut self, to: SocketAddr, message: ServerMessage) {
        self.envelopes.push(Envelope { to, message });
    }

    /// Nothing queued?
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Number of queued datagrams.
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Queued datagrams in order.
    pub fn iter(&self) -> impl Iterator<Item = &Envelope> {
        self.envelopes.iter()
    }

    /// Messages queued for one recipient, in order.
    pub fn to(&self, addr: SocketAddr) -> Vec<&ServerMessage> {
        self.envelopes
            .iter()
            .filter(|e| e.to == addr)
            .map(|e| &e.message)
            .collect()
    }

    /// Take everything queued, leaving the outbox empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Envelope> {
        self.envelopes.drain(..)
    }
}
