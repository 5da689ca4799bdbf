//! Play area bounds and player movement constraints

use super::geometry::{Rect, Vec2};
use super::map::{WorldMap, RENDER_HEIGHT, RENDER_WIDTH};

/// Render radius of a player (the hit box is a separate square)
pub const PLAYER_RADIUS: f32 = 10.0;

/// Player movement speed in units per second
pub const PLAYER_SPEED: f32 = 200.0;

/// Fixed play area, same size as the render budget
pub const PLAY_AREA: Rect = Rect::new(0.0, 0.0, RENDER_WIDTH as f32, RENDER_HEIGHT as f32);

/// Physics helpers shared by the server tick and the client
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Check if a point is inside the play area (edges included)
    pub fn in_bounds(area: &Rect, position: Vec2) -> bool {
        position.x >= area.left()
            && position.x <= area.right()
            && position.y >= area.top()
            && position.y <= area.bottom()
    }

    /// Move a player along an input axis.
    ///
    /// The axis is normalized so diagonals are not faster. The result is kept
    /// `radius` away from the play area edges and pushed out of walls.
    pub fn move_player(
        position: Vec2,
        axis: Vec2,
        dt: f32,
        area: &Rect,
        map: Option<&WorldMap>,
    ) -> Vec2 {
        let movement = axis.normalize_or_zero() * (PLAYER_SPEED * dt);
        let mut next = Self::clamp_to_area(position + movement, area, PLAYER_RADIUS);

        if let Some(map) = map {
            let body = Rect::centered(next, PLAYER_RADIUS * 2.0, PLAYER_RADIUS * 2.0);
            next += map.resolve_box(body);
            next = Self::clamp_to_area(next, area, PLAYER_RADIUS);
        }

        next
    }

    /// Clamp a position so a circle of `radius` stays inside the area
    pub fn clamp_to_area(position: Vec2, area: &Rect, radius: f32) -> Vec2 {
        Vec2::new(
            position.x.clamp(area.left() + radius, area.right() - radius),
            position.y.clamp(area.top() + radius, area.bottom() - radius),
        )
    }

    /// Facing angle from `from` towards `target`, `None` if they coincide
    pub fn aim_angle(from: Vec2, target: Vec2) -> Option<f32> {
        let d = target - from;
        if d.x == 0.0 && d.y == 0.0 {
            return None;
        }
        Some(d.y.atan2(d.x))
    }
}
