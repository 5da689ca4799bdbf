//! RPC message definitions
//! These are the wire types for client-server communication. Every call has
//! its own request/response pair.

use serde::{Deserialize, Serialize};

use crate::game::geometry::Vec2;

/// RGB color triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Terrain identifier to color binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapEntry {
    pub identifier: String,
    pub color: Color,
}

/// Map grid plus its color table, sent once on join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub color_map: Vec<ColorMapEntry>,
    /// Grid rows; `' '` is passable, anything else is solid
    pub map: Vec<String>,
}

/// Player state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub client_id: String,
    pub position: Vec2,
    /// Facing angle in radians
    pub direction: f32,
    pub hp: i32,
}

/// In-flight bullet as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub bullet_id: u64,
    pub owner_id: String,
    pub position: Vec2,
    /// Unit travel direction
    pub direction: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub success: bool,
    pub message: String,
    /// Present only on success
    pub map: Option<MapDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub client_id: String,
    pub position: Vec2,
    /// Facing angle in radians
    pub direction: f32,
}

/// Full point-in-time copy of the world
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub states: Vec<PlayerSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShootRequest {
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShootResponse {
    pub success: bool,
}
