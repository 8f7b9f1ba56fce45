//! In-memory response caches for upstream API lookups.
//!
//! Entries live only in process memory. Each cache is swept in bulk by a
//! [`CacheSweeper`]; nothing is evicted by size or on read.

mod alias;
mod cache;
mod sweeper;

pub use alias::AliasIndex;
pub use cache::{CacheEntry, TtlCache};
pub use sweeper::{delay_until_next_tick, CacheSweeper, SweepReport};

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wall-clock instant used for insertion stamps and sweeps.
pub type Timestamp = DateTime<Utc>;

/// A structure whose entries expire in bulk.
pub trait Sweep: Send + Sync {
    /// Remove every entry with `now - inserted_at >= ttl`, returning how many were removed.
    fn sweep(&self, now: Timestamp, ttl: Duration) -> usize;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether an entry stamped at `inserted_at` has outlived `ttl` at `now`.
///
/// Entries stamped in the future (clock skew) are never expired.
pub(crate) fn is_expired(inserted_at: Timestamp, now: Timestamp, ttl: Duration) -> bool {
    match (now - inserted_at).to_std() {
        Ok(age) => age >= ttl,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_is_expired_boundary() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ttl = Duration::from_secs(3600);

        assert!(!is_expired(t0, t0 + chrono::Duration::seconds(3599), ttl));
        assert!(is_expired(t0, t0 + chrono::Duration::seconds(3600), ttl));
        assert!(is_expired(t0, t0 + chrono::Duration::seconds(7200), ttl));
    }

    #[test]
    fn test_future_stamp_not_expired() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = now + chrono::Duration::seconds(10);
        assert!(!is_expired(later, now, Duration::ZERO));
    }
}
