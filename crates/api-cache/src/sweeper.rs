//! Periodic bulk expiry across every registered cache.
//!
//! Runs on a wall-clock aligned schedule (hourly by default) and sweeps
//! each target with its own TTL.

use crate::{Sweep, Timestamp};
use chrono::Utc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

struct SweepTarget {
    name: String,
    target: Arc<dyn Sweep>,
    ttl: Duration,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Removed entry count per target, in registration order.
    pub removed: Vec<(String, usize)>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.removed.iter().map(|(_, n)| n).sum()
    }
}

/// Sweeps every registered cache and alias index.
#[derive(Default)]
pub struct CacheSweeper {
    targets: Vec<SweepTarget>,
}

impl CacheSweeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target swept with `ttl`.
    pub fn register(&mut self, name: impl Into<String>, target: Arc<dyn Sweep>, ttl: Duration) {
        let name = name.into();
        debug!(target_name = %name, ?ttl, "Registered sweep target");
        self.targets.push(SweepTarget { name, target, ttl });
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Run one sweep pass at `now`.
    ///
    /// A target that panics is logged and counted as 0 removed; the targets
    /// after it are still swept. Release builds use `panic = "abort"`, so
    /// there a panicking target stops the process instead.
    pub fn sweep_all(&self, now: Timestamp) -> SweepReport {
        let removed = self
            .targets
            .iter()
            .map(|t| {
                let removed = catch_unwind(AssertUnwindSafe(|| t.target.sweep(now, t.ttl)))
                    .unwrap_or_else(|_| {
                        error!(target_name = %t.name, "Sweep target panicked, skipping");
                        0
                    });
                (t.name.clone(), removed)
            })
            .collect();
        SweepReport { removed }
    }

    /// Sweep everything against the current time.
    pub fn flush_all(&self) -> SweepReport {
        self.sweep_all(Utc::now())
    }

    /// Spawn the background schedule, firing at every multiple of `period`
    /// since the Unix epoch.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!(
            "Cache sweeper started ({} targets, period={:?})",
            self.targets.len(),
            period
        );

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay_until_next_tick(Utc::now(), period)).await;

                let total = self.flush_all().total();
                if total > 0 {
                    info!("Cache sweep removed {} entries", total);
                } else {
                    debug!("Cache sweep removed nothing");
                }
            }
        })
    }
}

/// Time from `now` until the next multiple of `period` since the Unix epoch.
///
/// A zero period degenerates to zero delay.
pub fn delay_until_next_tick(now: Timestamp, period: Duration) -> Duration {
    let period_ms = period.as_millis() as i64;
    if period_ms <= 0 {
        return Duration::ZERO;
    }
    let elapsed = now.timestamp_millis().rem_euclid(period_ms);
    Duration::from_millis((period_ms - elapsed) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AliasIndex, TtlCache};
    use chrono::TimeZone;

    struct PanickingTarget;

    impl Sweep for PanickingTarget {
        fn sweep(&self, _now: Timestamp, _ttl: Duration) -> usize {
            panic!("sweep exploded");
        }

        fn len(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_sweep_all_uses_each_targets_ttl() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ttl = Duration::from_secs(3600);

        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new("profiles"));
        let aliases: Arc<AliasIndex<String>> = Arc::new(AliasIndex::new("custom-urls"));
        cache.put_at("1".into(), 1, t0);
        aliases.register_at("name".into(), "1".into(), t0);

        let mut sweeper = CacheSweeper::new();
        sweeper.register("profiles", cache.clone(), ttl);
        sweeper.register("custom-urls", aliases.clone(), ttl * 2);
        assert_eq!(sweeper.target_count(), 2);

        let report = sweeper.sweep_all(t0 + chrono::Duration::seconds(3600));
        assert_eq!(
            report.removed,
            vec![("profiles".to_string(), 1), ("custom-urls".to_string(), 0)]
        );
        assert_eq!(aliases.resolve(&"name".to_string()), "1");

        let report = sweeper.sweep_all(t0 + chrono::Duration::seconds(7200));
        assert_eq!(report.total(), 1);
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_delay_until_next_tick_aligns_to_hour() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        let delay = delay_until_next_tick(now, Duration::from_secs(3600));
        assert_eq!(delay, Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_delay_on_exact_boundary_waits_full_period() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let delay = delay_until_next_tick(now, Duration::from_secs(3600));
        assert_eq!(delay, Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_period() {
        let now = Utc::now();
        assert_eq!(delay_until_next_tick(now, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_panicking_target_is_skipped() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new("servers"));
        cache.put_at("a".into(), 1, t0);

        let mut sweeper = CacheSweeper::new();
        sweeper.register("broken", Arc::new(PanickingTarget), Duration::from_secs(1));
        sweeper.register("servers", cache.clone(), Duration::from_secs(60));

        let report = sweeper.sweep_all(t0 + chrono::Duration::seconds(120));
        assert_eq!(
            report.removed,
            vec![("broken".to_string(), 0), ("servers".to_string(), 1)]
        );
        assert!(cache.is_empty());
    }
}
