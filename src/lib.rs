//! Arena Game Server - authoritative state engine for a multiplayer arena shooter
//!
//! - Player registry and bullet simulation behind a single world lock
//! - Fixed-rate tick loop resolving bullet movement and collisions
//! - Join/Leave/Update/Shoot RPCs over HTTP+JSON
//! - Operator console for kicks and map reloads
//! - A headless client used by the `bot` binary

pub mod app;
pub mod client;
pub mod config;
pub mod console;
pub mod game;
pub mod http;
pub mod rpc;
pub mod util;
