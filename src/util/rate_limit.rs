//! Rate limiting utilities

use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Rate limiter keyed by player id
pub type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default per-player budget for update/shoot calls (twice the 60 Hz client cadence)
pub const UPDATE_RATE_LIMIT: u32 = 120;

/// How often idle limiter entries are dropped
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(10);

/// Create a keyed rate limiter with the specified requests per second
pub fn create_keyed_limiter(requests_per_second: u32) -> Arc<KeyedLimiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Per-player rate limiter shared by all request handlers
#[derive(Clone)]
pub struct PlayerRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl PlayerRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            limiter: create_keyed_limiter(requests_per_second),
        }
    }

    /// Check if a call from this player is allowed (returns true if allowed)
    pub fn check(&self, player_id: &str) -> bool {
        self.limiter.check_key(&player_id.to_string()).is_ok()
    }

    /// Drop state for players whose buckets are full again
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of ids currently tracked
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }

    /// Prune every `period` until `shutdown` flips to true.
    ///
    /// Any id can call update/shoot, joined or not, so entries are reclaimed
    /// on a timer rather than on leave.
    pub async fn run_pruner(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(period);
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

            let before = self.len();
            self.prune();
            debug!(before, after = self.len(), "Pruned rate limiter");
        }
    }
}

impl Default for PlayerRateLimiter {
    fn default() -> Self {
        Self::new(UPDATE_RATE_LIMIT)
    }
}
