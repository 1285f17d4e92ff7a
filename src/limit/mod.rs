//! Per-identity fixed-window rate limiting.
//!
//! Each identity owns a counter and the instant its window opened. The
//! counter resets at window boundaries, so a client can land up to twice the
//! nominal limit across one boundary.

use crate::clock::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;

/// Prune expired windows once the table grows past this many identities.
const PRUNE_THRESHOLD: usize = 1_024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: RATE_LIMIT_WINDOW.as_millis() as u64,
            max_requests: RATE_LIMIT_MAX_REQUESTS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl RateDecision {
    /// HTTP response headers describing this decision. `Retry-After` is only
    /// present on rejection.
    pub fn headers(&self, limit: u32) -> Vec<(&'static str, String)> {
        let reset_secs = self.reset_in.as_secs_f64().ceil() as u64;
        let mut headers = vec![
            ("X-RateLimit-Limit", limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", reset_secs.to_string()),
        ];
        if !self.allowed {
            headers.push(("Retry-After", reset_secs.to_string()));
        }
        headers
    }
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `identity` and decide whether it is admitted.
    pub fn check(&self, identity: &str) -> RateDecision {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, state| now.duration_since(state.window_start) < window);
        }

        let state = windows
            .entry(identity.to_string())
            .or_insert(RateWindow { count: 0, window_start: now });

        if now.duration_since(state.window_start) >= self.window {
            *state = RateWindow { count: 0, window_start: now };
        }

        let reset_in = self.window.saturating_sub(now.duration_since(state.window_start));
        let allowed = state.count < self.max_requests;
        if allowed {
            state.count += 1;
        } else {
            tracing::warn!(identity, retry_in_ms = reset_in.as_millis() as u64, "rate limit exceeded");
        }

        RateDecision {
            allowed,
            remaining: self.max_requests.saturating_sub(state.count),
            reset_in,
        }
    }

    /// Number of identities with tracked windows.
    pub fn tracked(&self) -> usize {
        self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
