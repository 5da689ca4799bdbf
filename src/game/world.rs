//! Shared world state and the authoritative tick loop

use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::rpc::protocol::{MapDefinition, PlayerSnapshot, UpdateResponse};
use crate::util::time::{tick_interval, TickClock};

use super::combat::{BulletSimulation, TickReport};
use super::geometry::{Rect, Vec2};
use super::map::{MapError, WorldMap};
use super::physics::PLAY_AREA;
use super::registry::PlayerRegistry;
use super::snapshot::{SnapshotBuilder, SnapshotStats};
use super::GameError;

/// Everything guarded by the world lock
pub struct WorldState {
    pub players: PlayerRegistry,
    pub bullets: BulletSimulation,
    pub tick: u64,
    pub snapshot_stats: SnapshotStats,
}

/// Counters for health checks and the console
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldStats {
    pub players: usize,
    pub bullets: usize,
    pub tick: u64,
    pub snapshots_served: u64,
    pub avg_players_per_snapshot: f32,
}

/// The authoritative game world.
///
/// Players and bullets live behind one mutex, so every request and every
/// tick sees them in a consistent state. The map sits behind its own lock and
/// is only swapped on reload; it is never acquired while the world lock is
/// held.
pub struct GameWorld {
    state: Mutex<WorldState>,
    map: RwLock<Arc<WorldMap>>,
    play_area: Rect,
}

impl GameWorld {
    pub fn new(map: WorldMap, max_players: usize) -> Self {
        Self {
            state: Mutex::new(WorldState {
                players: PlayerRegistry::new(max_players),
                bullets: BulletSimulation::new(),
                tick: 0,
                snapshot_stats: SnapshotStats::default(),
            }),
            map: RwLock::new(Arc::new(map)),
            play_area: PLAY_AREA,
        }
    }

    /// Register a player and hand back the current map
    pub fn join(&self, client_id: &str) -> Result<MapDefinition, GameError> {
        let map = self.map();
        let mut state = self.state.lock();
        state.players.join(client_id)?;

        info!(
            player_id = %client_id,
            player_count = state.players.len(),
            "Player joined"
        );
        Ok(map.definition().clone())
    }

    /// Remove a player on its own request
    pub fn leave(&self, client_id: &str) -> Result<(), GameError> {
        let mut state = self.state.lock();
        state.players.leave(client_id)?;

        info!(
            player_id = %client_id,
            player_count = state.players.len(),
            "Player left"
        );
        Ok(())
    }

    /// Operator-initiated removal. The client is not notified.
    pub fn kick(&self, client_id: &str) -> Result<(), GameError> {
        let mut state = self.state.lock();
        state.players.leave(client_id)?;

        info!(player_id = %client_id, "Player kicked");
        Ok(())
    }

    /// Store the client's position and facing, then return a snapshot.
    ///
    /// Unknown ids (e.g. after a kick) are not an error; they just get the
    /// current snapshot back.
    pub fn update(&self, client_id: &str, position: Vec2, direction: f32) -> UpdateResponse {
        let mut state = self.state.lock();
        if !state.players.update(client_id, position, direction) {
            debug!(player_id = %client_id, "Update for unknown player ignored");
        }

        let snapshot = SnapshotBuilder::build(&state.players, &state.bullets);
        let count = snapshot.states.len();
        state.snapshot_stats.record(count);
        snapshot
    }

    /// Fire a bullet from the player's position along its facing angle
    pub fn shoot(&self, client_id: &str) -> Result<u64, GameError> {
        let mut state = self.state.lock();
        let WorldState {
            players, bullets, ..
        } = &mut *state;

        let player = players
            .get(client_id)
            .ok_or_else(|| GameError::NotFound(client_id.to_string()))?;
        if player.is_dead() {
            return Err(GameError::Dead(client_id.to_string()));
        }

        let bullet_id = bullets.spawn(client_id, player.position, player.direction);
        debug!(player_id = %client_id, bullet_id, "Bullet fired");
        Ok(bullet_id)
    }

    /// Point-in-time copy of all players and bullets
    pub fn snapshot(&self) -> UpdateResponse {
        let state = self.state.lock();
        SnapshotBuilder::build(&state.players, &state.bullets)
    }

    pub fn players(&self) -> Vec<PlayerSnapshot> {
        self.snapshot().states
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&self, dt: f32) -> TickReport {
        let map = self.map();
        let mut state = self.state.lock();
        state.tick += 1;

        let WorldState {
            players, bullets, ..
        } = &mut *state;
        bullets.step(dt, &self.play_area, &map, players)
    }

    /// The live map
    pub fn map(&self) -> Arc<WorldMap> {
        self.map.read().clone()
    }

    /// Swap in a new map; later joins and ticks use it
    pub fn replace_map(&self, map: WorldMap) {
        *self.map.write() = Arc::new(map);
    }

    /// Reload the map from disk. On failure the live map is kept.
    pub fn reload_map(&self, path: &Path) -> Result<(), MapError> {
        let map = WorldMap::from_file(path)?;
        self.replace_map(map);
        info!(path = %path.display(), "Map reloaded");
        Ok(())
    }

    pub fn stats(&self) -> WorldStats {
        let state = self.state.lock();
        WorldStats {
            players: state.players.len(),
            bullets: state.bullets.len(),
            tick: state.tick,
            snapshots_served: state.snapshot_stats.total_snapshots,
            avg_players_per_snapshot: state.snapshot_stats.avg_players_per_snapshot,
        }
    }

    /// Run the fixed-rate tick loop until `shutdown` flips to true.
    ///
    /// Each iteration waits one interval, then advances by the wall time that
    /// actually passed.
    pub async fn run(self: Arc<Self>, tick_rate: u32, mut shutdown: watch::Receiver<bool>) {
        info!(tick_rate, "Tick loop started");

        let mut ticker = interval(tick_interval(tick_rate));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = TickClock::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                    continue;
                }
            }

            let dt = clock.delta();
            let report = self.tick(dt);
            if dt > 0.1 {
                warn!(dt, "Tick loop fell behind");
            }
            if !report.hits.is_empty() {
                debug!(hits = report.hits.len(), "Tick resolved hits");
            }
        }

        info!("Tick loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn world() -> GameWorld {
        GameWorld::new(WorldMap::builtin(), 8)
    }

    #[test]
    fn join_returns_map_and_rejects_duplicates() {
        let world = world();
        let map = world.join("A").unwrap();
        assert_eq!(map.map, vec!["   ", " A ", "   "]);

        assert_eq!(
            world.join("A").unwrap_err().to_string(),
            "Player ID already exists!"
        );
        assert_eq!(world.stats().players, 1);
    }

    #[test]
    fn leave_unknown_is_not_found() {
        let world = world();
        assert_eq!(
            world.leave("A").unwrap_err(),
            GameError::NotFound("A".to_string())
        );
    }

    #[test]
    fn shoot_and_tick_scenario() {
        let world = world();
        world.join("A").unwrap();
        world.update("A", Vec2::new(100.0, 100.0), 0.0);

        world.shoot("A").unwrap();
        let snapshot = world.snapshot();
        assert_eq!(snapshot.bullets.len(), 1);
        assert_eq!(snapshot.bullets[0].direction, Vec2::new(1.0, 0.0));

        world.tick(0.1);
        let bullet = &world.snapshot().bullets[0];
        assert!((bullet.position.x - 150.0).abs() < 1e-3);
        assert!((bullet.position.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn shoot_requires_live_player() {
        let world = world();
        assert_eq!(
            world.shoot("ghost").unwrap_err(),
            GameError::NotFound("ghost".to_string())
        );

        world.join("A").unwrap();
        world.state.lock().players.get_mut("A").unwrap().health = 0;
        assert_eq!(world.shoot("A").unwrap_err(), GameError::Dead("A".to_string()));
        assert!(world.snapshot().bullets.is_empty());
    }

    #[test]
    fn update_after_kick_returns_snapshot_without_recreating() {
        let world = world();
        world.join("A").unwrap();
        world.join("B").unwrap();
        world.kick("A").unwrap();

        let snapshot = world.update("A", Vec2::new(5.0, 5.0), 1.0);
        let ids: Vec<&str> = snapshot.states.iter().map(|s| s.client_id.as_str()).collect();
        assert_eq!(ids, vec!["B"]);
        assert_eq!(world.stats().players, 1);
    }

    #[test]
    fn bullets_survive_owner_leaving() {
        let world = world();
        world.join("A").unwrap();
        world.update("A", Vec2::new(100.0, 100.0), 0.0);
        world.shoot("A").unwrap();
        world.leave("A").unwrap();

        let snapshot = world.snapshot();
        assert_eq!(snapshot.bullets.len(), 1);
        assert_eq!(snapshot.bullets[0].owner_id, "A");
    }

    #[test]
    fn out_of_bounds_bullet_never_reappears() {
        let world = world();
        world.join("A").unwrap();
        world.update("A", Vec2::new(750.0, 100.0), 0.0);
        world.shoot("A").unwrap();

        world.tick(0.2);
        assert!(world.snapshot().bullets.is_empty());
        world.tick(0.2);
        assert!(world.update("A", Vec2::new(750.0, 100.0), 0.0).bullets.is_empty());
    }

    #[test]
    fn replace_map_affects_later_joins() {
        let world = world();
        let definition = MapDefinition {
            color_map: vec![],
            map: vec!["    ".to_string()],
        };
        world.replace_map(WorldMap::new(definition.clone()).unwrap());
        assert_eq!(world.join("A").unwrap(), definition);
    }

    #[test]
    fn failed_reload_keeps_live_map() {
        let world = world();
        let before = world.map().definition().clone();
        assert!(world.reload_map(Path::new("/nonexistent/map.json")).is_err());
        assert_eq!(world.map().definition(), &before);
    }

    #[test]
    fn stats_count_served_snapshots() {
        let world = world();
        world.join("A").unwrap();
        world.update("A", Vec2::ZERO, 0.0);
        world.update("A", Vec2::ZERO, 0.0);
        let stats = world.stats();
        assert_eq!(stats.snapshots_served, 2);
        assert_eq!(stats.players, 1);
    }

    #[test]
    fn concurrent_joins_keep_ids_unique() {
        let world = Arc::new(GameWorld::new(WorldMap::builtin(), 64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let world = world.clone();
                std::thread::spawn(move || {
                    let mut joined = 0;
                    for i in 0..16 {
                        // Every thread races for the same ids
                        if world.join(&format!("p{}", i)).is_ok() {
                            joined += 1;
                        }
                        world.update(&format!("p{}", i), Vec2::new(t as f32, 0.0), 0.0);
                        world.tick(0.001);
                    }
                    joined
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 16);
        assert_eq!(world.stats().players, 16);
    }

    #[tokio::test]
    async fn tick_loop_advances_and_stops() {
        let world = Arc::new(world());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(world.clone().run(200, rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let ticks = world.stats().tick;
        assert!(ticks > 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(world.stats().tick, ticks);
    }
}
