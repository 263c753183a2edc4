//! Game Logic Module
//!
//! Everything about the world and its rules. Performs no I/O.
//!
//! ## Module Structure
//!
//! - `map`: Map text parsing and cell queries
//! - `visibility`: Line of sight and remembered views
//! - `gold`: Pile generation
//! - `state`: Session, roster and economy
//! - `movement`: Step and slide resolution
//! - `endgame`: Final ranking

pub mod map;
pub mod visibility;
pub mod gold;
pub mod state;
pub mod movement;
pub mod endgame;

// Re-export key types
pub use map::{Cell, GameMap, MapError};
pub use gold::GoldPile;
pub use state::{Session, SessionError, SessionPhase, PlayerState, Spectator};
pub use movement::MoveOutcome;
