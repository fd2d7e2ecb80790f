//! Per-username login throttling

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};

use crate::error::ApiError;

/// Stale usernames are dropped from the limiter every this many attempts.
const PRUNE_EVERY: u64 = 1024;

type KeyedLimiter<C> = RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

pub struct LoginThrottle<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    attempts: AtomicU64,
}

impl LoginThrottle {
    pub fn new(attempts_per_minute: u32) -> Self {
        Self::with_clock(attempts_per_minute, DefaultClock::default())
    }
}

impl<C: Clock> LoginThrottle<C> {
    pub fn with_clock(attempts_per_minute: u32, clock: C) -> Self {
        let burst = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::new(Quota::per_minute(burst), DefaultKeyedStateStore::default(), clock),
            attempts: AtomicU64::new(0),
        }
    }

    /// Counts one attempt for `username`; usernames compare case-insensitively.
    pub fn check(&self, username: &str) -> Result<(), ApiError> {
        if (self.attempts.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_EVERY == 0 {
            self.prune();
        }

        let key = username.trim().to_lowercase();
        self.limiter.check_key(&key).map_err(|_| {
            tracing::warn!(username = %key, "login attempts exceeded");
            ApiError::TooManyRequests
        })
    }

    /// Forgets usernames whose limit has fully replenished.
    pub fn prune(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(before, after = self.limiter.len(), "pruned login throttle");
    }

    pub fn tracked_usernames(&self) -> usize {
        self.limiter.len()
    }
}
