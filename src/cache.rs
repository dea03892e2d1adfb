//! Time-boxed read-through cache used by the weather API source.
//!
//! A value younger than the TTL is served without calling upstream. Once it
//! expires the next caller refreshes it; if the refresh fails the previous
//! value is served anyway (stale beats absent). Two callers missing at the
//! same time may both fetch; whichever stores last wins. The clock is
//! injectable so expiry can be tested without sleeping.

use std::{
    future::Future,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

// ---

/// Source of "now" for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

pub struct TtlCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    // ---
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: RwLock::new(None),
        }
    }

    /// Cached value if it is still within the TTL.
    pub fn fresh(&self) -> Option<T> {
        // ---
        let now = self.clock.now();
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|e| now.saturating_duration_since(e.stored_at) < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Cached value regardless of age.
    pub fn last(&self) -> Option<T> {
        // ---
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|e| e.value.clone())
    }

    pub fn store(&self, value: T) {
        // ---
        let stored_at = self.clock.now();
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Entry { value, stored_at });
    }

    /// Drop the cached value so the next read goes upstream.
    pub fn invalidate(&self) {
        // ---
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Serve from cache, refreshing through `fetch` once the TTL has elapsed.
    ///
    /// On fetch failure the last stored value (possibly stale) is returned,
    /// or `None` if nothing was ever stored.
    pub async fn get_or_refresh<F, Fut>(&self, label: &str, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        // ---
        if let Some(hit) = self.fresh() {
            tracing::debug!("{} cache hit", label);
            return Some(hit);
        }

        tracing::debug!("{} cache miss, refreshing", label);
        match fetch().await {
            Ok(value) => {
                self.store(value.clone());
                Some(value)
            }
            Err(e) => {
                let stale = self.last();
                tracing::warn!(
                    "{} refresh failed: {:#} (serving {})",
                    label,
                    e,
                    if stale.is_some() { "stale cache" } else { "nothing" }
                );
                stale
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    // ---
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use anyhow::anyhow;

    /// Clock that only moves when told to.
    pub(crate) struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Instant::now()),
            })
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn cache(clock: Arc<FakeClock>) -> TtlCache<u32> {
        TtlCache::new(Duration::from_secs(300), clock)
    }

    fn ok(v: u32) -> anyhow::Result<u32> {
        Ok(v)
    }

    fn fail(msg: &str) -> anyhow::Result<u32> {
        Err(anyhow!("{}", msg.to_string()))
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_fetch() {
        // ---
        let clock = FakeClock::new();
        let cache = cache(clock.clone());

        let calls = AtomicUsize::new(0);

        let first = cache.get_or_refresh("test", || async { ok(1) }).await;
        clock.advance(Duration::from_secs(299));
        let second = cache
            .get_or_refresh("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { ok(2) }
            })
            .await;

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_after_ttl() {
        // ---
        let clock = FakeClock::new();
        let cache = cache(clock.clone());

        cache.get_or_refresh("test", || async { ok(1) }).await;
        clock.advance(Duration::from_secs(300));
        let value = cache.get_or_refresh("test", || async { ok(2) }).await;

        assert_eq!(value, Some(2));
        assert_eq!(cache.fresh(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_value() {
        // ---
        let clock = FakeClock::new();
        let cache = cache(clock.clone());

        cache.get_or_refresh("test", || async { ok(7) }).await;
        clock.advance(Duration::from_secs(3600));
        let value = cache
            .get_or_refresh("test", || async { fail("network down") })
            .await;

        assert_eq!(value, Some(7));
        assert_eq!(cache.fresh(), None);
    }

    #[tokio::test]
    async fn test_failure_without_history_is_absent() {
        // ---
        let cache = cache(FakeClock::new());
        let value = cache
            .get_or_refresh("test", || async { fail("timeout") })
            .await;
        assert_eq!(value, None);
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        // ---
        let clock = FakeClock::new();
        let cache = cache(clock);

        tokio_test::block_on(cache.get_or_refresh("test", || async { ok(1) }));
        cache.invalidate();
        assert_eq!(cache.last(), None);

        let value = tokio_test::block_on(cache.get_or_refresh("test", || async { ok(9) }));
        assert_eq!(value, Some(9));
    }
}
