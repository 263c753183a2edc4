//! Core primitives.
//!
//! Seeded randomness and grid geometry shared by the game and network layers.

pub mod rng;
pub mod grid;

// Re-export core types
pub use rng::SessionRng;
pub use grid::{GridPoint, Direction, MoveKey};
