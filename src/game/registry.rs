//! Player registry: the authoritative set of joined players

use std::collections::BTreeMap;

use crate::util::time::unix_millis;

use super::geometry::{Rect, Vec2};
use super::GameError;

/// Health of a freshly joined player
pub const MAX_HEALTH: i32 = 100;

/// Side length of the square bullet-vs-player hit box
pub const HIT_BOX_SIZE: f32 = 20.0;

/// Where new players appear
pub const SPAWN_POSITION: Vec2 = Vec2::ZERO;

/// Player state (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub client_id: String,
    pub position: Vec2,
    /// Facing angle in radians
    pub direction: f32,
    pub health: i32,

    pub joined_at: u64,
    pub last_update: u64,
}

impl PlayerState {
    pub fn new(client_id: String) -> Self {
        let now = unix_millis();
        Self {
            client_id,
            position: SPAWN_POSITION,
            direction: 0.0,
            health: MAX_HEALTH,
            joined_at: now,
            last_update: now,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Square collider used for bullet hits, independent of the render radius
    pub fn hit_box(&self) -> Rect {
        Rect::centered(self.position, HIT_BOX_SIZE, HIT_BOX_SIZE)
    }
}

/// Mapping from client id to player state.
///
/// Iteration order is by client id, so a tick always visits players in the
/// same order. Not synchronized on its own; [`super::GameWorld`] guards it.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: BTreeMap<String, PlayerState>,
    max_players: usize,
}

impl PlayerRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            players: BTreeMap::new(),
            max_players,
        }
    }

    /// Add a player at the spawn position with full health
    pub fn join(&mut self, client_id: &str) -> Result<&PlayerState, GameError> {
        if self.players.contains_key(client_id) {
            return Err(GameError::AlreadyExists(client_id.to_string()));
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::ServerFull);
        }

        let player = self
            .players
            .entry(client_id.to_string())
            .or_insert_with(|| PlayerState::new(client_id.to_string()));
        Ok(player)
    }

    /// Remove a player. Bullets it fired are left alone.
    pub fn leave(&mut self, client_id: &str) -> Result<PlayerState, GameError> {
        self.players
            .remove(client_id)
            .ok_or_else(|| GameError::NotFound(client_id.to_string()))
    }

    /// Overwrite position and facing. Unknown ids are ignored (returns false).
    pub fn update(&mut self, client_id: &str, position: Vec2, direction: f32) -> bool {
        match self.players.get_mut(client_id) {
            Some(player) => {
                player.position = position;
                player.direction = direction;
                player.last_update = unix_millis();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, client_id: &str) -> Option<&PlayerState> {
        self.players.get(client_id)
    }

    pub fn get_mut(&mut self, client_id: &str) -> Option<&mut PlayerState> {
        self.players.get_mut(client_id)
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.players.contains_key(client_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.players.values_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }
}
