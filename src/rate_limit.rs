use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Per-endpoint quota: how many requests a single client may make
/// within one sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Policy {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}

// Quotas applied by the HTTP layer, one per protected endpoint.
// /api/models is deliberately unbounded.
pub mod policies {
    use super::Policy;
    use std::time::Duration;

    pub const GENERATE: Policy = Policy::new(10, 60);
    pub const CHAT: Policy = Policy::new(15, 60);
    pub const EXPLAIN: Policy = Policy::new(10, 60);
    pub const IMPROVE: Policy = Policy::new(8, 60);

    /// Largest window across all policies; the idle sweep uses it as
    /// its retention horizon.
    pub const MAX_WINDOW: Duration = Duration::from_secs(60);
}

/// Sliding-window rate limiter keyed by an opaque client string
/// (the handlers use "ip:operation" so each endpoint tracks its own
/// quota per client).
///
/// Each key holds the timestamps of its admitted requests, oldest
/// first. The window slides with every check rather than resetting at
/// fixed boundaries: a request is admitted when fewer than
/// `max_requests` admissions happened within the last `window`.
///
/// A timestamp exactly `window` old is treated as expired, so a slot
/// frees up exactly one window after it was used.
///
/// The prune-check-append sequence for one key runs under that key's
/// DashMap entry guard, so concurrent checks for the same client are
/// atomic while different clients land on different shards and don't
/// serialize behind a single lock.
pub struct RateLimiter {
    clients: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Check and record against the real clock.
    pub fn allow(&self, key: &str, policy: Policy) -> bool {
        self.allow_at(key, policy, Instant::now())
    }

    /// Check and record at an explicit instant.
    ///
    /// Prunes entries that have aged out of the window, then either
    /// denies without recording (quota full) or records `now` and
    /// admits. A denied request never extends the client's window.
    pub fn allow_at(&self, key: &str, policy: Policy, now: Instant) -> bool {
        let mut stamps = self.clients.entry(key.to_string()).or_default();

        stamps.retain(|&t| now.duration_since(t) < policy.window);

        if stamps.len() >= policy.max_requests as usize {
            return false;
        }

        stamps.push(now);
        true
    }

    /// Drop timestamps older than `horizon` and forget clients left
    /// with none. Keeps memory bounded when many clients show up once
    /// and never return.
    pub fn sweep_at(&self, now: Instant, horizon: Duration) {
        self.clients.retain(|_, stamps| {
            stamps.retain(|&t| now.duration_since(t) < horizon);
            !stamps.is_empty()
        });
    }

    pub fn sweep(&self, horizon: Duration) {
        self.sweep_at(Instant::now(), horizon);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn first_request_is_always_allowed() {
        let limiter = RateLimiter::new();
        assert!(limiter.allow_at("1.2.3.4", Policy::new(1, 60), Instant::now()));
    }

    #[test]
    fn denies_third_call_within_window_and_recovers() {
        // max=2, window=60: t=0 and t=10 pass, t=20 is denied,
        // t=61 passes again because t=0 has aged out.
        let limiter = RateLimiter::new();
        let policy = Policy::new(2, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("client", policy, base));
        assert!(limiter.allow_at("client", policy, base + secs(10)));
        assert!(!limiter.allow_at("client", policy, base + secs(20)));
        assert!(limiter.allow_at("client", policy, base + secs(61)));
    }

    #[test]
    fn timestamp_exactly_one_window_old_is_expired() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(1, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("client", policy, base));
        assert!(!limiter.allow_at("client", policy, base + secs(59)));
        // at exactly base + window the original stamp no longer counts
        assert!(limiter.allow_at("client", policy, base + secs(60)));
    }

    #[test]
    fn steady_rate_at_window_over_max_spacing_is_never_denied() {
        // Requests spaced window/max apart stay exactly at the quota
        // edge and must all pass.
        let limiter = RateLimiter::new();
        let policy = Policy::new(5, 60);
        let base = Instant::now();

        for i in 0..50 {
            let at = base + secs(12 * i);
            assert!(limiter.allow_at("steady", policy, at), "call {} denied", i);
        }
    }

    #[test]
    fn denied_call_is_not_recorded() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(1, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("client", policy, base));
        // hammer while denied; none of these may extend the window
        for i in 1..=5 {
            assert!(!limiter.allow_at("client", policy, base + secs(i)));
        }
        // only the t=0 stamp exists, so t=60 is free again
        assert!(limiter.allow_at("client", policy, base + secs(60)));
    }

    #[test]
    fn window_keeps_sliding_with_every_call() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(2, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("client", policy, base + secs(30)));
        assert!(limiter.allow_at("client", policy, base + secs(50)));
        // t=70: both stamps still inside (70-30=40, 70-50=20)
        assert!(!limiter.allow_at("client", policy, base + secs(70)));
        // t=95: the t=30 stamp has aged out (95-30=65)
        assert!(limiter.allow_at("client", policy, base + secs(95)));
    }

    #[test]
    fn never_more_than_max_allowed_in_any_window() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(3, 10);
        let base = Instant::now();
        let mut admitted: Vec<u64> = Vec::new();

        // one call per second for two minutes
        for s in 0..120 {
            if limiter.allow_at("client", policy, base + secs(s)) {
                admitted.push(s);
            }
        }

        // for every admitted instant, count admissions in (t-10, t]
        for &t in &admitted {
            let in_window = admitted
                .iter()
                .filter(|&&u| u <= t && t - u < 10)
                .count();
            assert!(in_window <= 3, "window ending at {} holds {}", t, in_window);
        }
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(1, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("alice", policy, base));
        assert!(!limiter.allow_at("alice", policy, base + secs(1)));
        // bob is unaffected by alice exhausting her quota
        assert!(limiter.allow_at("bob", policy, base + secs(1)));
    }

    #[test]
    fn concurrent_checks_admit_exactly_max_requests() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(8, 60);
        let now = Instant::now();
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        if limiter.allow_at("shared", policy, now) {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn sweep_forgets_idle_clients_but_keeps_active_ones() {
        let limiter = RateLimiter::new();
        let policy = Policy::new(5, 60);
        let base = Instant::now();

        assert!(limiter.allow_at("idle", policy, base));
        assert!(limiter.allow_at("active", policy, base + secs(90)));
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.sweep_at(base + secs(100), secs(60));
        assert_eq!(limiter.tracked_clients(), 1);

        // the swept client starts from a clean slate
        assert!(limiter.allow_at("idle", policy, base + secs(100)));
    }
}
