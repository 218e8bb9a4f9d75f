//! Per-minute request and token budget for the completion endpoint
//!
//! Counts are process-local: calls made by other processes against the same
//! API quota within the same minute are not seen here, so the provider may
//! still reject a request that this limiter allowed.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::info;

pub const DEFAULT_REQUESTS_PER_MINUTE: u64 = 10_000;
pub const DEFAULT_TOKENS_PER_MINUTE: u64 = 200_000;

const WINDOW: Duration = Duration::from_secs(60);

/// Ceilings imposed by the remote provider for one minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_minute: u64,
    pub tokens_per_minute: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            tokens_per_minute: DEFAULT_TOKENS_PER_MINUTE,
        }
    }
}

/// Snapshot of the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub request_count: u64,
    pub token_count: u64,
    pub window_reset_at: Instant,
}

pub struct RateLimiter {
    limits: RateLimits,
    window: RateWindow,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            window: RateWindow {
                request_count: 0,
                token_count: 0,
                window_reset_at: Instant::now() + WINDOW,
            },
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    pub fn window(&self) -> RateWindow {
        self.window
    }

    fn reset(&mut self) {
        self.window = RateWindow {
            request_count: 0,
            token_count: 0,
            window_reset_at: Instant::now() + WINDOW,
        };
    }

    /// Wait until one more request costing `token_cost` fits in the window,
    /// then book it.
    pub async fn reserve(&mut self, token_cost: u64) {
        let now = Instant::now();
        if now >= self.window.window_reset_at {
            self.reset();
        }

        if self.window.request_count + 1 >= self.limits.requests_per_minute
            || self.window.token_count + token_cost >= self.limits.tokens_per_minute
        {
            let wait = self.window.window_reset_at.saturating_duration_since(now);
            info!("Waiting {}ms to respect rate limits.", wait.as_millis());
            sleep_until(self.window.window_reset_at).await;
            self.reset();
        }

        self.window.request_count += 1;
        self.window.token_count += token_cost;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}
