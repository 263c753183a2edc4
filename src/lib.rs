//! # Nugget Game Server
//!
//! Authoritative coordinator for the nuggets exploration game: players and
//! one spectator connect over UDP, explore a cave map revealed by line of
//! sight, and collect gold until none is left.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NUGGET SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Primitives                              │
//! │  ├── rng.rs        - Seeded Xorshift128+ PRNG                │
//! │  └── grid.rs       - Grid points, directions, move keys      │
//! │                                                              │
//! │  game/             - Game logic (no I/O)                     │
//! │  ├── map.rs        - Map parsing and cell queries            │
//! │  ├── visibility.rs - Line of sight and player views          │
//! │  ├── gold.rs       - Pile count, partition, placement        │
//! │  ├── state.rs      - Session, roster, spectator, audit       │
//! │  ├── movement.rs   - Steps, slides, swaps, pickups           │
//! │  └── endgame.rs    - Ranking and summary                     │
//! │                                                              │
//! │  network/          - Protocol and transport                  │
//! │  ├── protocol.rs   - Text wire messages                      │
//! │  ├── outbox.rs     - Ordered outbound datagrams              │
//! │  ├── broadcast.rs  - Per-viewer map and gold fan-out         │
//! │  ├── dispatcher.rs - Per-message state machine               │
//! │  └── server.rs     - UDP receive loop                        │
//! │                                                              │
//! │  config.rs         - Game configuration                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Processing Model
//!
//! One datagram is handled at a time, to completion, including every step
//! of a slide and every broadcast it causes. The [`game::state::Session`]
//! is owned by the receive loop and never shared, so there is no locking.
//!
//! Given the same map, seed and message sequence, a session produces the
//! same replies.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::config::GameConfig;
pub use crate::core::rng::SessionRng;
pub use crate::game::map::GameMap;
pub use crate::game::state::{Session, PlayerState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
