//! Windowed rate limiting with temporary blocking
//!
//! Buckets are keyed by an opaque composite string (client IP, normalized
//! identity, route tag) so one user's lockout never blocks unrelated
//! routes, and other users behind the same NAT are only locked out for
//! that same identity+route pair. A bucket counts failures inside a
//! sliding window; reaching the limit blocks the key for a fixed period.
//! Buckets expire purely by timestamp comparison - no sweeper thread.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;

/// Limits applied to one route.
///
/// Policy knobs, not hard-coded behavior: each route may carry its own
/// policy (see `AuthConfig`).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Max failed attempts inside the window (default: 5)
    pub limit: u32,
    /// Width of the counting window (default: 15 minutes)
    pub window: Duration,
    /// How long to block after reaching the limit (default: 10 minutes)
    pub block: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::from_secs(15 * 60),
            block: Duration::from_secs(10 * 60),
        }
    }
}

impl RateLimitPolicy {
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    fn block_ms(&self) -> i64 {
        self.block.as_millis() as i64
    }
}

/// Answer from [`RateLimiter::is_blocked`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    Allowed,
    Blocked { retry_after_secs: u64 },
}

impl RateLimitStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    count: u32,
    window_start: i64,
    blocked_until: Option<i64>,
}

/// Per-key sliding-window attempt counter
#[derive(Default)]
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stable composite key from parts (ip, identity, route).
    ///
    /// Parts are trimmed and lower-cased so "A@X.com " and "a@x.com" land
    /// in the same bucket.
    pub fn key<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
        parts
            .into_iter()
            .map(|p| p.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Whether the key is currently blocked, and for how much longer
    pub fn is_blocked(&self, key: &str) -> RateLimitStatus {
        self.is_blocked_at(key, now_ms())
    }

    /// Record a failed attempt; block the key once the limit is reached
    /// within the window
    pub fn bump_failure(&self, key: &str, policy: &RateLimitPolicy) {
        self.bump_failure_at(key, policy, now_ms());
    }

    /// Clear the bucket after a successful authentication.
    ///
    /// A legitimate login should not keep accruing failed-attempt history.
    pub fn reset(&self, key: &str) {
        self.write().remove(key);
    }

    /// Attempts remaining inside the current window (without counting one)
    pub fn attempts_left(&self, key: &str, policy: &RateLimitPolicy) -> u32 {
        self.attempts_left_at(key, policy, now_ms())
    }

    fn is_blocked_at(&self, key: &str, now: i64) -> RateLimitStatus {
        let blocked_until = match self.read().get(key) {
            Some(bucket) => bucket.blocked_until,
            None => return RateLimitStatus::Allowed,
        };

        match blocked_until {
            Some(until) if now < until => RateLimitStatus::Blocked {
                retry_after_secs: ((until - now) as u64).div_ceil(1000),
            },
            Some(_) => {
                // Block elapsed; the bucket is spent
                self.write().remove(key);
                RateLimitStatus::Allowed
            }
            None => RateLimitStatus::Allowed,
        }
    }

    fn bump_failure_at(&self, key: &str, policy: &RateLimitPolicy, now: i64) {
        let mut buckets = self.write();
        let bucket = match buckets.get(key) {
            Some(b) if now - b.window_start <= policy.window_ms() => Bucket {
                count: b.count + 1,
                ..b.clone()
            },
            // Window elapsed (or no bucket): fresh count
            _ => Bucket {
                count: 1,
                window_start: now,
                blocked_until: None,
            },
        };

        let bucket = if bucket.count >= policy.limit {
            Bucket {
                blocked_until: Some(now + policy.block_ms()),
                ..bucket
            }
        } else {
            bucket
        };
        buckets.insert(key.to_string(), bucket);
    }

    fn attempts_left_at(&self, key: &str, policy: &RateLimitPolicy, now: i64) -> u32 {
        match self.read().get(key) {
            Some(b) if now - b.window_start <= policy.window_ms() => {
                policy.limit.saturating_sub(b.count)
            }
            _ => policy.limit,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Bucket>> {
        self.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Bucket>> {
        self.buckets.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("buckets", &self.read().len())
            .finish()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
