//! Client session: local player, mirrored world and the network loop

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::game::geometry::Vec2;
use crate::game::map::{MapError, WorldMap, RENDER_HEIGHT, RENDER_WIDTH};
use crate::game::physics::{PhysicsSystem, PLAY_AREA};
use crate::game::registry::MAX_HEALTH;
use crate::rpc::protocol::{BulletSnapshot, MapDefinition, UpdateResponse};
use crate::util::time::tick_interval;

use super::interp::RemotePlayer;
use super::rpc::{ClientError, RpcClient};

/// The player controlled by this client
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub client_id: String,
    pub position: Vec2,
    pub direction: f32,
    pub health: i32,
}

impl LocalPlayer {
    /// Starts in the middle of the screen
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            position: Vec2::new((RENDER_WIDTH / 2) as f32, (RENDER_HEIGHT / 2) as f32),
            direction: 0.0,
            health: MAX_HEALTH,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Move along an input axis; a dead player stays put
    pub fn move_by(&mut self, axis: Vec2, dt: f32, map: Option<&WorldMap>) {
        if self.is_dead() {
            return;
        }
        self.position = PhysicsSystem::move_player(self.position, axis, dt, &PLAY_AREA, map);
    }

    /// Face towards a point; unchanged if the point is the player's position
    pub fn aim_at(&mut self, target: Vec2) {
        if let Some(angle) = PhysicsSystem::aim_angle(self.position, target) {
            self.direction = angle;
        }
    }
}

/// Client-side mirror of the world
pub struct ClientSession {
    pub local: LocalPlayer,
    remotes: BTreeMap<String, RemotePlayer>,
    bullets: Vec<BulletSnapshot>,
    map: Option<WorldMap>,
    shot_requested: bool,
}

impl ClientSession {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            local: LocalPlayer::new(client_id),
            remotes: BTreeMap::new(),
            bullets: Vec::new(),
            map: None,
            shot_requested: false,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.local.client_id
    }

    /// Build the local map from the join response
    pub fn set_map(&mut self, definition: MapDefinition) -> Result<(), MapError> {
        let map = WorldMap::new(definition)?;
        info!(
            width = map.width(),
            height = map.height(),
            cell_size = map.cell_size(),
            "Map received"
        );
        self.map = Some(map);
        Ok(())
    }

    pub fn map(&self) -> Option<&WorldMap> {
        self.map.as_ref()
    }

    /// Move the local player, colliding with the received map
    pub fn move_local(&mut self, axis: Vec2, dt: f32) {
        self.local.move_by(axis, dt, self.map.as_ref());
    }

    /// Fold a server snapshot into the mirror.
    ///
    /// The local player's position is client-owned; only its health is taken
    /// from the server. Players missing from the snapshot are dropped.
    pub fn apply_snapshot(&mut self, snapshot: &UpdateResponse, now: Instant) {
        for state in &snapshot.states {
            if state.client_id == self.local.client_id {
                self.local.health = state.hp;
                continue;
            }

            match self.remotes.get_mut(&state.client_id) {
                Some(remote) => remote.push(state, now),
                None => {
                    self.remotes
                        .insert(state.client_id.clone(), RemotePlayer::new(state, now));
                }
            }
        }

        self.remotes
            .retain(|id, _| snapshot.states.iter().any(|s| &s.client_id == id));
        self.bullets = snapshot.bullets.clone();
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remote(&self, client_id: &str) -> Option<&RemotePlayer> {
        self.remotes.get(client_id)
    }

    /// Living remote players with their interpolated (position, facing)
    pub fn visible_remotes(&self, now: Instant) -> Vec<(&str, Vec2, f32)> {
        self.remotes
            .values()
            .filter(|r| !r.is_dead())
            .map(|r| {
                let (position, direction) = r.interpolated(now);
                (r.client_id.as_str(), position, direction)
            })
            .collect()
    }

    pub fn bullets(&self) -> &[BulletSnapshot] {
        &self.bullets
    }

    /// Banner to show instead of the local player, if any
    pub fn banner(&self) -> Option<&'static str> {
        self.local.is_dead().then_some("You are dead")
    }

    /// Queue a shot for the next network round trip
    pub fn request_shot(&mut self) {
        self.shot_requested = true;
    }

    /// Consume a queued shot
    pub fn take_shot(&mut self) -> bool {
        std::mem::take(&mut self.shot_requested)
    }
}

/// Drive a session against the server until `shutdown` flips to true.
///
/// Joins first, then sends one update per interval and fires queued shots.
/// Any transport failure ends the run; it is logged and returned, never
/// retried. On a clean stop the player leaves the game.
pub async fn run_network_loop(
    rpc: RpcClient,
    session: Arc<Mutex<ClientSession>>,
    update_rate: u32,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ClientError> {
    let client_id = session.lock().client_id().to_string();

    let map = rpc.join(&client_id).await.map_err(|e| {
        error!(player_id = %client_id, error = %e, "Failed to join the game");
        e
    })?;
    info!(player_id = %client_id, "Joined the game");

    if let Err(e) = session.lock().set_map(map) {
        warn!(error = %e, "Received map is malformed, playing without walls");
    }

    let mut ticker = interval(tick_interval(update_rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

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

        let (position, direction) = {
            let s = session.lock();
            (s.local.position, s.local.direction)
        };

        let snapshot = rpc
            .update(&client_id, position, direction)
            .await
            .map_err(|e| {
                error!(player_id = %client_id, error = %e, "Lost connection to server");
                e
            })?;

        let fire = {
            let mut s = session.lock();
            s.apply_snapshot(&snapshot, Instant::now());
            s.take_shot()
        };

        if fire && !rpc.shoot(&client_id).await? {
            warn!(player_id = %client_id, "Shot rejected");
        }
    }

    match rpc.leave(&client_id).await {
        Ok(response) if response.success => info!(player_id = %client_id, "Left the game"),
        Ok(response) => warn!(player_id = %client_id, message = %response.message, "Leave rejected"),
        Err(e) => warn!(player_id = %client_id, error = %e, "Failed to leave cleanly"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::protocol::PlayerSnapshot;
    use std::time::Duration;

    fn state(id: &str, x: f32, hp: i32) -> PlayerSnapshot {
        PlayerSnapshot {
            client_id: id.to_string(),
            position: Vec2::new(x, 50.0),
            direction: 0.0,
            hp,
        }
    }

    #[test]
    fn snapshot_skips_own_position_but_takes_health() {
        let mut session = ClientSession::new("me");
        session.local.position = Vec2::new(1.0, 1.0);

        let snapshot = UpdateResponse {
            states: vec![state("me", 300.0, 70), state("other", 10.0, 100)],
            bullets: vec![],
        };
        session.apply_snapshot(&snapshot, Instant::now());

        assert_eq!(session.local.position, Vec2::new(1.0, 1.0));
        assert_eq!(session.local.health, 70);
        assert!(session.remote("me").is_none());
        assert!(session.remote("other").is_some());
    }

    #[test]
    fn departed_players_are_dropped() {
        let mut session = ClientSession::new("me");
        let now = Instant::now();
        session.apply_snapshot(
            &UpdateResponse {
                states: vec![state("a", 0.0, 100), state("b", 0.0, 100)],
                bullets: vec![],
            },
            now,
        );
        session.apply_snapshot(
            &UpdateResponse {
                states: vec![state("b", 5.0, 100)],
                bullets: vec![],
            },
            now + Duration::from_millis(16),
        );
        let ids: Vec<&str> = session.remotes().map(|r| r.client_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn dead_remotes_are_not_drawn() {
        let mut session = ClientSession::new("me");
        let now = Instant::now();
        session.apply_snapshot(
            &UpdateResponse {
                states: vec![state("a", 0.0, 0), state("b", 0.0, 100)],
                bullets: vec![],
            },
            now,
        );
        let visible: Vec<&str> = session
            .visible_remotes(now)
            .into_iter()
            .map(|(id, _, _)| id)
            .collect();
        assert_eq!(visible, vec!["b"]);
        // Still tracked, just hidden
        assert!(session.remote("a").is_some());
    }

    #[test]
    fn dead_local_player_cannot_move() {
        let mut session = ClientSession::new("me");
        let start = session.local.position;
        session.local.health = 0;
        session.move_local(Vec2::new(1.0, 0.0), 1.0);
        assert_eq!(session.local.position, start);
        assert_eq!(session.banner(), Some("You are dead"));
    }

    #[test]
    fn local_player_collides_with_received_map() {
        let mut session = ClientSession::new("me");
        session
            .set_map(WorldMap::builtin().definition().clone())
            .unwrap();
        session.local.position = Vec2::new(280.0, 300.0);
        session.move_local(Vec2::new(1.0, 0.0), 0.1);
        assert_eq!(session.local.position, Vec2::new(290.0, 300.0));
        assert_eq!(session.banner(), None);
    }

    #[test]
    fn aim_ignores_own_position() {
        let mut player = LocalPlayer::new("me");
        player.aim_at(player.position + Vec2::new(0.0, -10.0));
        assert!((player.direction + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let before = player.direction;
        player.aim_at(player.position);
        assert_eq!(player.direction, before);
    }

    #[test]
    fn shots_are_consumed_once() {
        let mut session = ClientSession::new("me");
        assert!(!session.take_shot());
        session.request_shot();
        assert!(session.take_shot());
        assert!(!session.take_shot());
    }
}
