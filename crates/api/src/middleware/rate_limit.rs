//! Export rate limiting.
//!
//! Bounds how many exports one client may request within a trailing window.
//! Each client keeps the instants of its recent exports; a request is admitted
//! only while fewer than `limit` of them fall inside the window.

use governor::clock::{Clock, DefaultClock, Reference};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use crate::error::ApiError;

/// Number of tracked clients above which idle windows are evicted.
const EVICTION_THRESHOLD: usize = 1024;

type Window<I> = Arc<Mutex<VecDeque<I>>>;

/// Sliding-window limiter keyed by client identity.
pub struct ExportRateLimiter<C: Clock = DefaultClock> {
    clock: C,
    limit: usize,
    window: Duration,
    windows: RwLock<HashMap<String, Window<C::Instant>>>,
}

impl ExportRateLimiter<DefaultClock> {
    /// Create a limiter admitting `limit` exports per `window` on the system clock.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, DefaultClock::default())
    }
}

impl<C: Clock> ExportRateLimiter<C> {
    pub fn with_clock(limit: u32, window: Duration, clock: C) -> Self {
        Self {
            clock,
            limit: limit.max(1) as usize,
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get or create the window of `client`.
    fn window_for(&self, client: &str) -> Window<C::Instant> {
        {
            let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
            if let Some(window) = windows.get(client) {
                return window.clone();
            }
        }

        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        if windows.len() >= EVICTION_THRESHOLD {
            self.evict_idle(&mut windows);
        }
        windows
            .entry(client.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    /// Drop windows whose every entry has aged out. Windows held by a concurrent
    /// check are kept.
    fn evict_idle(&self, windows: &mut HashMap<String, Window<C::Instant>>) {
        let now = self.clock.now();
        let window = self.window;
        windows.retain(|_, entries| match entries.try_lock() {
            Ok(entries) => entries
                .back()
                .map(|last| Duration::from(now.duration_since(*last)) < window)
                .unwrap_or(false),
            Err(_) => true,
        });
    }

    /// Whether `window` is still the one the map holds for `client`.
    fn is_current(&self, client: &str, window: &Window<C::Instant>) -> bool {
        let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
        windows
            .get(client)
            .is_some_and(|current| Arc::ptr_eq(current, window))
    }

    /// Admit or reject one export for `client`.
    ///
    /// Returns `Err` with the number of seconds until the oldest counted export
    /// leaves the window. Pruning, counting and recording happen under the
    /// client's lock, so concurrent checks never over-admit.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        loop {
            let window = self.window_for(client);
            let mut entries = window.lock().unwrap_or_else(|e| e.into_inner());
            // Eviction skips locked windows, so once this one is confirmed
            // under its lock it stays in the map until the entry is recorded.
            if self.is_current(client, &window) {
                return self.admit(&mut entries);
            }
        }
    }

    fn admit(&self, entries: &mut VecDeque<C::Instant>) -> Result<(), u64> {
        let now = self.clock.now();

        while let Some(oldest) = entries.front() {
            if Duration::from(now.duration_since(*oldest)) >= self.window {
                entries.pop_front();
            } else {
                break;
            }
        }

        if entries.len() >= self.limit {
            let age = entries
                .front()
                .map(|oldest| Duration::from(now.duration_since(*oldest)))
                .unwrap_or_default();
            let wait = self.window.saturating_sub(age);
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            return Err(secs.max(1));
        }

        entries.push_back(now);
        Ok(())
    }

    /// Like [`check`](Self::check), mapped to the API error returned to clients.
    pub fn guard(&self, client: &str) -> Result<(), ApiError> {
        self.check(client).map_err(|retry_after| {
            tracing::warn!(client = %client, retry_after, "Export rate limit exceeded");
            ApiError::RateLimited {
                message: format!(
                    "Rate limit exceeded: at most {} exports per {} seconds. Try again in {} seconds",
                    self.limit,
                    self.window.as_secs(),
                    retry_after
                ),
                retry_after,
            }
        })
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.read().map(|w| w.len()).unwrap_or(0)
    }
}

impl<C: Clock> std::fmt::Debug for ExportRateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::clock::FakeRelativeClock;

    fn limiter(limit: u32) -> (ExportRateLimiter<FakeRelativeClock>, FakeRelativeClock) {
        let clock = FakeRelativeClock::default();
        (
            ExportRateLimiter::with_clock(limit, Duration::from_secs(60), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_eleventh_request_within_window_is_rejected() {
        let (limiter, clock) = limiter(10);
        for i in 0..10 {
            assert!(limiter.check("10.0.0.1").is_ok(), "request {} should pass", i + 1);
            clock.advance(Duration::from_secs(5));
        }
        // 10 requests in the last 50 seconds
        let retry_after = limiter.check("10.0.0.1").unwrap_err();
        assert_eq!(retry_after, 10);
    }

    #[test]
    fn test_requests_spread_over_seventy_seconds_pass() {
        let (limiter, clock) = limiter(10);
        for i in 0..11 {
            assert!(limiter.check("10.0.0.1").is_ok(), "request {} should pass", i + 1);
            clock.advance(Duration::from_secs(7));
        }
    }

    #[test]
    fn test_window_reopens_after_oldest_expires() {
        let (limiter, clock) = limiter(2);
        assert!(limiter.check("a").is_ok());
        clock.advance(Duration::from_secs(30));
        assert!(limiter.check("a").is_ok());
        assert_eq!(limiter.check("a").unwrap_err(), 30);

        clock.advance(Duration::from_secs(30));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
    }

    #[test]
    fn test_rejected_requests_are_not_counted() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.check("a").is_ok());
        for _ in 0..5 {
            clock.advance(Duration::from_secs(10));
            assert!(limiter.check("a").is_err());
        }
        clock.advance(Duration::from_secs(10));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_clients_are_independent() {
        let (limiter, _clock) = limiter(1);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_err());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.check("a").is_ok());
        clock.advance(Duration::from_millis(59_999));
        assert_eq!(limiter.check("a").unwrap_err(), 1);
    }

    #[test]
    fn test_idle_windows_are_evicted() {
        let (limiter, clock) = limiter(10);
        for n in 0..EVICTION_THRESHOLD {
            limiter.check(&format!("client-{}", n)).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), EVICTION_THRESHOLD);

        clock.advance(Duration::from_secs(61));
        limiter.check("newcomer").unwrap();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_check_skips_a_window_evicted_before_it_was_locked() {
        let (limiter, _clock) = limiter(1);
        let stale = limiter.window_for("a");
        {
            let mut windows = limiter.windows.write().unwrap();
            limiter.evict_idle(&mut windows);
        }
        assert!(!limiter.is_current("a", &stale));

        assert!(limiter.check("a").is_ok());
        assert!(stale.lock().unwrap().is_empty());
        assert!(limiter.check("a").is_err());
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_locked_windows_survive_eviction() {
        let (limiter, clock) = limiter(1);
        limiter.check("busy").unwrap();
        clock.advance(Duration::from_secs(61));

        let window = limiter.window_for("busy");
        let held = window.lock().unwrap();
        {
            let mut windows = limiter.windows.write().unwrap();
            limiter.evict_idle(&mut windows);
        }
        drop(held);
        assert!(limiter.is_current("busy", &window));
    }

    #[test]
    fn test_guard_maps_to_rate_limited_error() {
        let (limiter, _clock) = limiter(1);
        limiter.guard("a").unwrap();
        match limiter.guard("a") {
            Err(ApiError::RateLimited { retry_after, message }) => {
                assert_eq!(retry_after, 60);
                assert!(message.contains("at most 1 exports per 60 seconds"));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_checks_never_over_admit() {
        let limiter = Arc::new(ExportRateLimiter::new(10, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..5)
                        .filter(|_| limiter.check("shared").is_ok())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }
}
