//! Application state shared across routes, the console and the tick loop

use std::sync::Arc;
use tokio::sync::watch;

use crate::config::Config;
use crate::game::{GameWorld, WorldMap};
use crate::util::rate_limit::PlayerRateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<GameWorld>,
    pub rate_limiter: PlayerRateLimiter,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(config: Config, map: WorldMap) -> Self {
        let config = Arc::new(config);

        // Initialize the authoritative world
        let world = Arc::new(GameWorld::new(map, config.max_players));

        let rate_limiter = PlayerRateLimiter::new(config.update_rate_limit);
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            world,
            rate_limiter,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Ask the tick loop and the HTTP server to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Receiver that flips to `true` once shutdown was requested
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}
