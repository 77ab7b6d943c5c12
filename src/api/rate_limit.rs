use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Fixed-window request counter, one window per client
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: DashMap<String, Window>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    /// Count a request from `client`.
    ///
    /// Returns `Err(wait)` with the time left in the current window when the
    /// client already used up its allowance.
    pub fn try_acquire(&self, client: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut window = self.clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(window.started);
        if elapsed >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            return Err(self.window.saturating_sub(now.duration_since(window.started)));
        }

        window.count += 1;
        Ok(())
    }

    /// Forget clients whose window has ended
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.clients.len();
        self.clients
            .retain(|_, window| now.duration_since(window.started) < self.window);
        before - self.clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_per_client() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.try_acquire("10.0.0.1").is_ok());
        assert!(limiter.try_acquire("10.0.0.1").is_ok());
        let wait = limiter.try_acquire("10.0.0.1").unwrap_err();
        assert!(wait <= Duration::from_secs(60));

        // Other clients have their own window
        assert!(limiter.try_acquire("10.0.0.2").is_ok());
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.try_acquire("client").is_ok());
        assert!(limiter.try_acquire("client").is_err());

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.try_acquire("client").is_ok());
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));
        limiter.try_acquire("a").unwrap();
        limiter.try_acquire("b").unwrap();

        std::thread::sleep(Duration::from_millis(30));
        limiter.try_acquire("c").unwrap();

        assert_eq!(limiter.purge_expired(), 2);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
