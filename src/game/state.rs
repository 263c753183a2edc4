//! Session State
//!
//! The root aggregate for one game: the map, the roster, the spectator slot
//! and the gold economy. Owned by the dispatcher for the whole session and
//! mutated one message at a time.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, GameConfig};
use crate::core::grid::GridPoint;
use crate::core::rng::SessionRng;
use crate::game::gold::{self, GoldPile};
use crate::game::map::{Cell, GameMap};
use crate::game::visibility::{Marker, PlayerView, render_full};

// =============================================================================
// ERRORS
// =============================================================================

/// Session errors.
///
/// Admission variants display as the reason sent back in a `NO` reply.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Roster is at capacity.
    #[error("Maximum players reached")]
    Full,

    /// Name was empty after sanitizing.
    #[error("You must provide a player name")]
    EmptyName,

    /// Sender already holds a player slot or the spectator slot.
    #[error("Already connected")]
    AlreadyConnected,

    /// Every room spot is taken by gold or a player.
    #[error("No room to place player")]
    NoFreeSpot,

    /// Game configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Hand-placed gold is unusable.
    #[error("invalid gold piles: {0}")]
    InvalidPiles(String),
}

// =============================================================================
// PLAYERS
// =============================================================================

/// One roster slot. Never removed; a player who quits is marked disconnected.
#[derive(Clone, Debug)]
pub struct PlayerState {
    /// Letter ID, `'A'` for the first admitted player
    pub letter: char,
    /// Sanitized display name
    pub name: String,
    /// Current cell
    pub position: GridPoint,
    /// Nuggets collected
    pub purse: u32,
    /// Still playing?
    pub connected: bool,
    /// Where updates are sent
    pub addr: SocketAddr,
    /// Visible and remembered cells
    pub(crate) view: PlayerView,
}

/// The single spectator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spectator {
    /// Where updates are sent
    pub addr: SocketAddr,
}

/// Letter for a roster slot.
#[inline]
pub fn letter_for(index: usize) -> char {
    (b'A' + index as u8) as char
}

/// Clean up a submitted player name.
///
/// Trailing whitespace and control characters are dropped, interior control
/// characters become `_`, and the result is cut to `max_len` characters.
/// Returns `None` when nothing printable is left.
pub fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let trimmed = raw.trim_end_matches(|c: char| c.is_whitespace() || c.is_control());
    let name: String = trimmed
        .chars()
        .take(max_len)
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Gold remains; messages are processed
    #[default]
    Playing,
    /// All gold collected and the summary sent
    Ended,
    /// Torn down
    Closed,
}

/// Authoritative state of one game.
#[derive(Debug)]
pub struct Session {
    pub(crate) map: GameMap,
    pub(crate) config: GameConfig,
    pub(crate) rng: SessionRng,
    pub(crate) players: Vec<PlayerState>,
    pub(crate) spectator: Option<Spectator>,
    pub(crate) piles: Vec<GoldPile>,
    pub(crate) gold_remaining: u32,
    pub(crate) gold_total: u32,
    pub(crate) phase: SessionPhase,
}

impl Session {
    /// Build a session and scatter the configured gold over the map.
    pub fn initialize(map: GameMap, config: GameConfig, mut rng: SessionRng) -> Result<Self, SessionError> {
        config.validate()?;
        let piles = gold::scatter(&mut rng, &config, &map.room_spots());
        let gold_total = config.gold_total;

        info!(
            rows = map.rows(),
            cols = map.cols(),
            piles = piles.len(),
            gold = gold_total,
            "Session initialized"
        );

        Ok(Self::assemble(map, config, rng, piles, gold_total))
    }

    /// Build a session with hand-placed gold.
    ///
    /// The total is the sum of the piles; every pile needs at least one
    /// nugget and its own room spot.
    pub fn with_gold(
        map: GameMap,
        config: GameConfig,
        rng: SessionRng,
        piles: Vec<GoldPile>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if piles.is_empty() {
            return Err(SessionError::InvalidPiles("no piles".into()));
        }
        for (i, pile) in piles.iter().enumerate() {
            if pile.nuggets == 0 {
                return Err(SessionError::InvalidPiles(format!("empty pile at {}", pile.position)));
            }
            if map.cell(pile.position) != Cell::RoomSpot {
                return Err(SessionError::InvalidPiles(format!("{} is not a room spot", pile.position)));
            }
            if piles[..i].iter().any(|p| p.position == pile.position) {
                return Err(SessionError::InvalidPiles(format!("two piles at {}", pile.position)));
            }
        }
        let gold_total = piles.iter().map(|p| p.nuggets).sum();
        Ok(Self::assemble(map, config, rng, piles, gold_total))
    }

    fn assemble(map: GameMap, config: GameConfig, rng: SessionRng, piles: Vec<GoldPile>, gold_total: u32) -> Self {
        Self {
            map,
            players: Vec::with_capacity(config.max_players),
            config,
            rng,
            spectator: None,
            piles,
            gold_remaining: gold_total,
            gold_total,
            phase: SessionPhase::Playing,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The map.
    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// The configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Every roster slot in admission order.
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    /// Player by letter.
    pub fn player(&self, letter: char) -> Option<&PlayerState> {
        let index = (letter as u32).checked_sub('A' as u32)? as usize;
        self.players.get(index)
    }

    /// Roster index of the connected player at this address.
    pub fn find_player(&self, addr: SocketAddr) -> Option<usize> {
        self.players.iter().position(|p| p.connected && p.addr == addr)
    }

    /// The spectator, if any.
    pub fn spectator(&self) -> Option<Spectator> {
        self.spectator
    }

    /// Is this address the current spectator?
    pub fn is_spectator(&self, addr: SocketAddr) -> bool {
        self.spectator.is_some_and(|s| s.addr == addr)
    }

    /// Gold still on the map.
    pub fn piles(&self) -> &[GoldPile] {
        &self.piles
    }

    /// Nuggets not yet collected.
    pub fn gold_remaining(&self) -> u32 {
        self.gold_remaining
    }

    /// Nuggets the session started with.
    pub fn gold_total(&self) -> u32 {
        self.gold_total
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Still accepting messages?
    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Index of the pile at a point.
    pub fn pile_at(&self, point: GridPoint) -> Option<usize> {
        self.piles.iter().position(|p| p.position == point)
    }

    /// Index of the connected player at a point.
    pub fn player_at(&self, point: GridPoint) -> Option<usize> {
        self.players.iter().position(|p| p.connected && p.position == point)
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Admit a player: sanitize the name, take the next letter and place it
    /// on a free room spot. Nothing changes on error.
    pub fn admit_player(&mut self, raw_name: &str, addr: SocketAddr) -> Result<char, SessionError> {
        if self.find_player(addr).is_some() || self.is_spectator(addr) {
            return Err(SessionError::AlreadyConnected);
        }
        if self.players.len() >= self.config.max_players {
            return Err(SessionError::Full);
        }
        let name = sanitize_name(raw_name, self.config.max_name_length).ok_or(SessionError::EmptyName)?;

        let free: Vec<GridPoint> = self
            .map
            .room_spots()
            .into_iter()
            .filter(|&spot| self.pile_at(spot).is_none() && self.player_at(spot).is_none())
            .collect();
        let position = *self.rng.choose(&free).ok_or(SessionError::NoFreeSpot)?;

        let letter = letter_for(self.players.len());
        let mut view = PlayerView::new(&self.map);
        view.refresh(&self.map, position);

        self.players.push(PlayerState {
            letter,
            name,
            position,
            purse: 0,
            connected: true,
            addr,
            view,
        });

        info!(%addr, %letter, %position, "Player joined");
        Ok(letter)
    }

    /// Mark a player disconnected. The slot and purse are kept for ranking.
    pub fn disconnect_player(&mut self, index: usize) {
        if let Some(player) = self.players.get_mut(index) {
            if player.connected {
                player.connected = false;
                info!(letter = %player.letter, purse = player.purse, "Player left");
            }
        }
    }

    /// Install a new spectator, returning the one it replaces.
    pub fn install_spectator(&mut self, addr: SocketAddr) -> Option<Spectator> {
        let previous = self.spectator.replace(Spectator { addr });
        info!(%addr, replaced = previous.is_some(), "Spectator joined");
        previous
    }

    /// Clear the spectator slot.
    pub fn remove_spectator(&mut self) -> Option<Spectator> {
        let previous = self.spectator.take();
        if let Some(s) = previous {
            info!(addr = %s.addr, "Spectator left");
        }
        previous
    }

    // -------------------------------------------------------------------------
    // Economy
    // -------------------------------------------------------------------------

    /// Remove a pile and credit its nuggets to a player. Returns the amount.
    pub fn collect_pile(&mut self, pile: usize, player: usize) -> u32 {
        let taken = self.piles.swap_remove(pile);
        self.gold_remaining -= taken.nuggets;
        self.players[player].purse += taken.nuggets;
        debug!(
            letter = %self.players[player].letter,
            nuggets = taken.nuggets,
            remaining = self.gold_remaining,
            "Gold collected"
        );
        taken.nuggets
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    /// Recompute what a player can see from its current cell.
    pub fn refresh_view(&mut self, index: usize) {
        let map = &self.map;
        if let Some(player) = self.players.get_mut(index) {
            player.view.refresh(map, player.position);
        }
    }

    /// Recompute every connected player's view.
    #[cfg(test)]
    pub(crate) fn refresh_visibility(&mut self) {
        let map = &self.map;
        for player in self.players.iter_mut().filter(|p| p.connected) {
            player.view.refresh(map, player.position);
        }
    }

    /// Gold and connected players, as drawn over the terrain.
    pub fn markers(&self) -> Vec<Marker> {
        self.piles
            .iter()
            .map(|p| Marker::new(p.position, Marker::GOLD))
            .chain(
                self.players
                    .iter()
                    .filter(|p| p.connected)
                    .map(|p| Marker::new(p.position, p.letter)),
            )
            .collect()
    }

    /// Grid text as one player sees it.
    pub fn render_for_player(&self, index: usize) -> String {
        let player = &self.players[index];
        player.view.render(&self.map, player.position, &self.markers())
    }

    /// Grid text as the spectator sees it.
    pub fn render_for_spectator(&self) -> String {
        render_full(&self.map, &self.markers())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Enter the ended phase once all gold is gone.
    pub(crate) fn finish(&mut self) {
        if self.phase == SessionPhase::Playing {
            self.phase = SessionPhase::Ended;
            info!(players = self.players.len(), "Game over");
        }
    }

    /// Release the roster and spectator. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        for player in &mut self.players {
            player.connected = false;
        }
        self.spectator = None;
        self.phase = SessionPhase::Closed;
        debug!("Session torn down");
    }

    /// Check the session invariants.
    ///
    /// A violation is a bug in the game logic, never a client error.
    pub fn audit(&self) -> Result<(), String> {
        let on_map: u32 = self.piles.iter().map(|p| p.nuggets).sum();
        let purses: u32 = self.players.iter().map(|p| p.purse).sum();

        if on_map != self.gold_remaining {
            return Err(format!("piles hold {on_map} but {} remain", self.gold_remaining));
        }
        if on_map + purses != self.gold_total {
            return Err(format!("{on_map} on map + {purses} in purses != {}", self.gold_total));
        }
        if self.piles.iter().any(|p| p.nuggets == 0) {
            return Err("empty pile left on map".into());
        }
        if self.players.len() > self.config.max_players {
            return Err(format!("{} players exceed capacity {}", self.players.len(), self.config.max_players));
        }

        for (i, player) in self.players.iter().enumerate() {
            if player.letter != letter_for(i) {
                return Err(format!("slot {i} has letter {}", player.letter));
            }
            if !player.connected {
                continue;
            }
            if !self.map.is_passable(player.position) {
                return Err(format!("{} stands on impassable {}", player.letter, player.position));
            }
            if self.players[..i].iter().any(|o| o.connected && o.position == player.position) {
                return Err(format!("two players at {}", player.position));
            }
        }
        Ok(())
    }

    /// Move a player directly. Test setup only.
    #[cfg(test)]
    pub(crate) fn place_player(&mut self, letter: char, position: GridPoint) {
        let index = (letter as u8 - b'A') as usize;
        self.players[index].position = position;
        self.refresh_view(index);
    }
}

// =============================================================================
// TESTS
// =============================================================================
