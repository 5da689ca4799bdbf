//! Combat system - bullets, damage, hit detection

use tracing::{debug, info};

use crate::rpc::protocol::BulletSnapshot;

use super::geometry::{Rect, Vec2};
use super::map::WorldMap;
use super::physics::PhysicsSystem;
use super::registry::PlayerRegistry;

/// Bullet travel speed in units per second
pub const BULLET_SPEED: f32 = 500.0;

/// Health removed by one bullet hit
pub const BULLET_DAMAGE: i32 = 10;

/// Active bullet in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub id: u64,
    /// Shooter; may no longer be in the registry
    pub owner_id: String,
    pub position: Vec2,
    /// Unit vector fixed at creation
    pub direction: Vec2,
    pub speed: f32,
}

impl Bullet {
    /// Create a bullet travelling along the shooter's facing angle
    pub fn new(id: u64, owner_id: String, position: Vec2, facing: f32) -> Self {
        Self {
            id,
            owner_id,
            position,
            direction: Vec2::from_angle(facing),
            speed: BULLET_SPEED,
        }
    }

    /// Integrate position over `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.position += self.direction * (self.speed * dt);
    }

    pub fn snapshot(&self) -> BulletSnapshot {
        BulletSnapshot {
            bullet_id: self.id,
            owner_id: self.owner_id.clone(),
            position: self.position,
            direction: self.direction,
        }
    }
}

/// Combat rules
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead).
    ///
    /// Health saturates at zero.
    pub fn apply_damage(current_health: i32, damage: i32) -> (i32, bool) {
        let new_health = current_health.saturating_sub(damage).max(0);
        (new_health, new_health <= 0)
    }
}

/// Why a bullet left the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    OutOfBounds,
    Wall,
    Hit(HitResult),
}

/// Hit result from combat resolution
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub bullet_id: u64,
    pub shooter_id: String,
    pub target_id: String,
    pub damage: i32,
    pub remaining_health: i32,
    pub target_killed: bool,
}

/// Outcome of one simulation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub out_of_bounds: usize,
    pub wall_impacts: usize,
    pub hits: Vec<HitResult>,
}

/// Ordered collection of in-flight bullets
#[derive(Debug, Clone, Default)]
pub struct BulletSimulation {
    bullets: Vec<Bullet>,
    next_id: u64,
}

impl BulletSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bullet and return its id
    pub fn spawn(&mut self, owner_id: &str, position: Vec2, facing: f32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.bullets
            .push(Bullet::new(id, owner_id.to_string(), position, facing));
        id
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    /// Advance every bullet by `dt` seconds and resolve collisions.
    ///
    /// Per bullet the checks run in order: play area bounds, walls, players.
    /// Bullets are marked during the pass and removed afterwards.
    pub fn step(
        &mut self,
        dt: f32,
        area: &Rect,
        map: &WorldMap,
        players: &mut PlayerRegistry,
    ) -> TickReport {
        let mut report = TickReport::default();
        let mut keep: Vec<bool> = Vec::with_capacity(self.bullets.len());

        for bullet in self.bullets.iter_mut() {
            bullet.advance(dt);

            let removal = Self::resolve(bullet, area, map, players);
            keep.push(removal.is_none());
            match removal {
                Some(Removal::OutOfBounds) => report.out_of_bounds += 1,
                Some(Removal::Wall) => report.wall_impacts += 1,
                Some(Removal::Hit(hit)) => report.hits.push(hit),
                None => {}
            }
        }

        // Single compaction pass; `retain` visits elements in order
        let mut keep = keep.into_iter();
        self.bullets.retain(|_| keep.next().unwrap_or(true));

        report
    }

    fn resolve(
        bullet: &Bullet,
        area: &Rect,
        map: &WorldMap,
        players: &mut PlayerRegistry,
    ) -> Option<Removal> {
        if !PhysicsSystem::in_bounds(area, bullet.position) {
            debug!(bullet_id = bullet.id, "Bullet left play area");
            return Some(Removal::OutOfBounds);
        }

        if map.is_wall_at(bullet.position) {
            debug!(bullet_id = bullet.id, "Bullet hit wall");
            return Some(Removal::Wall);
        }

        // First living non-owner whose hit box contains the bullet
        let target = players.iter_mut().find(|p| {
            !p.is_dead() && p.client_id != bullet.owner_id && p.hit_box().contains(bullet.position)
        })?;

        let (new_health, killed) = CombatSystem::apply_damage(target.health, BULLET_DAMAGE);
        target.health = new_health;

        info!(
            victim_id = %target.client_id,
            shooter_id = %bullet.owner_id,
            bullet_id = bullet.id,
            victim_hp = new_health,
            "Player hit"
        );
        if killed {
            info!(victim_id = %target.client_id, shooter_id = %bullet.owner_id, "Player killed");
        }

        Some(Removal::Hit(HitResult {
            bullet_id: bullet.id,
            shooter_id: bullet.owner_id.clone(),
            target_id: target.client_id.clone(),
            damage: BULLET_DAMAGE,
            remaining_health: new_health,
            target_killed: killed,
        }))
    }
}
