//! Per-user command throttling.

use api_cache::{Sweep, Timestamp};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rate limiter keyed by user ID.
pub type UserLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// `usages` invocations per `period` for each user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub usages: u32,
    pub period: Duration,
}

impl Throttle {
    pub fn new(usages: u32, period: Duration) -> Self {
        Self { usages, period }
    }

    fn quota(self) -> Option<Quota> {
        let usages = NonZeroU32::new(self.usages)?;
        Quota::with_period(self.period / usages.get()).map(|quota| quota.allow_burst(usages))
    }
}

/// Throttles for every command that declares one.
#[derive(Clone, Default)]
pub struct CommandThrottles {
    limiters: HashMap<String, Arc<UserLimiter>>,
    clock: DefaultClock,
}

impl CommandThrottles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, command: impl Into<String>, throttle: Throttle) {
        if let Some(quota) = throttle.quota() {
            self.limiters
                .insert(command.into(), Arc::new(RateLimiter::keyed(quota)));
        }
    }

    /// Record a use of `command` by `user_id`.
    ///
    /// Returns how long the user has to wait when the use is not allowed.
    pub fn check(&self, command: &str, user_id: &str) -> Result<(), Duration> {
        let Some(limiter) = self.limiters.get(command) else {
            return Ok(());
        };
        match limiter.check_key(&user_id.to_string()) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                debug!(command, user_id, ?wait, "Command throttled");
                Err(wait)
            }
        }
    }
}

/// Sweeping drops the state of users whose limits have fully replenished.
/// Governor tracks replenishment itself, so the sweep ttl is not used.
impl Sweep for CommandThrottles {
    fn sweep(&self, _now: Timestamp, _ttl: Duration) -> usize {
        let before = self.len();
        for limiter in self.limiters.values() {
            limiter.retain_recent();
        }
        before.saturating_sub(self.len())
    }

    fn len(&self) -> usize {
        self.limiters.values().map(|limiter| limiter.len()).sum()
    }
}

/// Message shown to a throttled user.
pub fn throttled_message(wait: Duration) -> String {
    let seconds = wait.as_secs_f64().ceil().max(1.0) as u64;
    format!(
        "You are currently being throttled. Try again in {} second{}.",
        seconds,
        if seconds == 1 { "" } else { "s" }
    )
}
