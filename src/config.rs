//! Game Configuration
//!
//! Economy, capacity and naming rules for one session. Defaults match the
//! classic game; any field can be overridden from a JSON file.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Letters available for player IDs.
pub const MAX_LETTERS: usize = 26;

/// Configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Nuggets in play at session start.
    pub gold_total: u32,
    /// Fewest piles the gold is split into.
    pub min_piles: u32,
    /// Most piles the gold is split into.
    pub max_piles: u32,
    /// Roster capacity (one letter per player).
    pub max_players: usize,
    /// Longest display name kept, in characters.
    pub max_name_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gold_total: 250,
            min_piles: 10,
            max_piles: 30,
            max_players: MAX_LETTERS,
            max_name_length: 50,
        }
    }
}

impl GameConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is playable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gold_total == 0 {
            return Err(ConfigError::NoGold);
        }
        if self.min_piles == 0 || self.min_piles > self.max_piles {
            return Err(ConfigError::PileRange {
                min: self.min_piles,
                max: self.max_piles,
            });
        }
        if self.max_players == 0 || self.max_players > MAX_LETTERS {
            return Err(ConfigError::Capacity(self.max_players));
        }
        if self.max_name_length == 0 {
            return Err(ConfigError::NameLength);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path as given
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing to collect.
    #[error("gold_total must be positive")]
    NoGold,

    /// Pile range is empty or starts at zero.
    #[error("pile range {min}..={max} is invalid")]
    PileRange {
        /// Configured minimum
        min: u32,
        /// Configured maximum
        max: u32,
    },

    /// Capacity outside 1..=26.
    #[error("max_players {0} must be between 1 and 26")]
    Capacity(usize),

    /// Names would always be empty.
    #[error("max_name_length must be positive")]
    NameLength,
}
