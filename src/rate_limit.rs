use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Swappable throttle for sensitive endpoints. Injected through `AppState`
/// so a shared-store implementation can replace the in-memory one without
/// touching handlers.
pub trait RateLimiter: Send + Sync {
    /// Returns false when `key` has exhausted its attempts for the window.
    fn allow(&self, key: &str) -> bool;
}

/// Sliding-window limiter over a per-key list of attempt timestamps.
/// Process-local; entries for a key are pruned on each call.
pub struct InMemoryRateLimiter {
    window: Duration,
    max_attempts: usize,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(window: Duration, max_attempts: usize) -> Self {
        Self {
            window,
            max_attempts,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut attempts = self.attempts.lock().expect("rate limiter lock poisoned");
        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);
        if entry.len() >= self.max_attempts {
            return false;
        }
        entry.push(now);
        true
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_attempts_then_blocks() {
        let limiter = InMemoryRateLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = InMemoryRateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
        assert!(limiter.allow("5.6.7.8"));
    }

    #[test]
    fn attempts_expire_after_the_window() {
        let limiter = InMemoryRateLimiter::new(Duration::from_millis(10), 1);
        let start = Instant::now();
        assert!(limiter.allow_at("1.2.3.4", start));
        assert!(!limiter.allow_at("1.2.3.4", start));
        assert!(limiter.allow_at("1.2.3.4", start + Duration::from_millis(11)));
    }
}
