//! Interpolation of remote players.
//!
//! Snapshots arrive at the client's update cadence, not every frame. Each
//! remote player keeps its two latest samples and is drawn somewhere between
//! them.

use std::f32::consts::{PI, TAU};
use std::time::Instant;

use crate::game::geometry::Vec2;
use crate::rpc::protocol::PlayerSnapshot;

/// One received (position, facing) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vec2,
    pub direction: f32,
    pub at: Instant,
}

/// A player controlled by another client
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub client_id: String,
    pub health: i32,
    older: Sample,
    newer: Sample,
}

impl RemotePlayer {
    pub fn new(state: &PlayerSnapshot, at: Instant) -> Self {
        let sample = Sample {
            position: state.position,
            direction: state.direction,
            at,
        };
        Self {
            client_id: state.client_id.clone(),
            health: state.hp,
            older: sample,
            newer: sample,
        }
    }

    /// Record a new snapshot. Health is applied immediately.
    pub fn push(&mut self, state: &PlayerSnapshot, at: Instant) {
        self.older = self.newer;
        self.newer = Sample {
            position: state.position,
            direction: state.direction,
            at,
        };
        self.health = state.hp;
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Progress from the older towards the newer sample, clamped to [0, 1].
    ///
    /// Measured as time since the older sample over the gap between samples.
    pub fn fraction(&self, now: Instant) -> f32 {
        let span = self.newer.at.saturating_duration_since(self.older.at).as_secs_f32();
        if span <= 0.0 {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.older.at).as_secs_f32();
        (elapsed / span).clamp(0.0, 1.0)
    }

    /// Position and facing to render at `now`
    pub fn interpolated(&self, now: Instant) -> (Vec2, f32) {
        let t = self.fraction(now);
        let position = self.older.position.lerp(self.newer.position, t);
        let direction = lerp_angle(self.older.direction, self.newer.direction, t);
        (position, direction)
    }

    pub fn latest(&self) -> Sample {
        self.newer
    }
}

/// Interpolate between two angles along the shorter arc
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let mut delta = (to - from) % TAU;
    if delta > PI {
        delta -= TAU;
    } else if delta <= -PI {
        delta += TAU;
    }
    from + delta * t
}
