//! Game simulation modules

pub mod combat;
pub mod geometry;
pub mod map;
pub mod physics;
pub mod registry;
pub mod snapshot;
pub mod world;

pub use combat::{Bullet, BulletSimulation};
pub use map::{MapError, WorldMap};
pub use registry::{PlayerRegistry, PlayerState};
pub use world::GameWorld;

/// Expected failures of session operations.
///
/// These are reported to the caller as `success = false` plus the message,
/// never as a transport fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Player ID already exists!")]
    AlreadyExists(String),

    #[error("Player ID does not exist!")]
    NotFound(String),

    #[error("Server is full!")]
    ServerFull,

    #[error("Player is dead!")]
    Dead(String),
}
