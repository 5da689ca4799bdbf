//! Snapshot building

use crate::rpc::protocol::{PlayerSnapshot, UpdateResponse};

use super::combat::BulletSimulation;
use super::registry::{PlayerRegistry, PlayerState};

impl PlayerState {
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            client_id: self.client_id.clone(),
            position: self.position,
            direction: self.direction,
            hp: self.health,
        }
    }
}

/// Builds snapshots for network transmission
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Copy every player and bullet into an owned response.
    ///
    /// Callers hold the world lock, so the copy is a single point in time.
    pub fn build(players: &PlayerRegistry, bullets: &BulletSimulation) -> UpdateResponse {
        UpdateResponse {
            states: players.iter().map(PlayerState::snapshot).collect(),
            bullets: bullets.bullets().iter().map(|b| b.snapshot()).collect(),
        }
    }
}

/// Snapshot size stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub avg_players_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize) {
        self.total_snapshots += 1;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f32 / n);
    }
}
