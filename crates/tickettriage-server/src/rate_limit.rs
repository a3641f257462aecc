//! Per-address rate limiting
//!
//! Fixed-window counters keyed by client IP, held in process-local state.
//! Increment-and-check happens under one lock acquisition, so concurrent
//! requests from the same address cannot over-admit. Not shared across
//! replicas.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key window state
struct Window {
    count: u32,
    started_at: Instant,
}

/// In-memory fixed-window rate limiter
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `window` per client address
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` and admit or reject it.
    ///
    /// On rejection returns how long until the key's window resets, suitable
    /// for a `Retry-After` header.
    pub fn check(&self, key: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");

        let entry = windows.entry(key).or_insert(Window {
            count: 0,
            started_at: now,
        });

        // Reset window if expired
        if now.duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= self.max_requests {
            let retry_after = self
                .window
                .saturating_sub(now.duration_since(entry.started_at));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }

    /// Requests allowed per window
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }
}
