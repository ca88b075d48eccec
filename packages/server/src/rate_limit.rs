use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheError, FastCache};

pub const RATE_KEY_PREFIX: &str = "submit-rate:";

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    /// Seconds until the current window is guaranteed to have closed.
    Limited { retry_after: u64 },
}

/// Fixed-window submission counter per client, kept in the fast cache.
///
/// The window opens on a client's first submission and closes when the
/// counter key expires, so a burst straddling two windows can briefly pass
/// up to twice the limit. The counter key never exists without an expiry.
#[derive(Clone)]
pub struct SubmitRateLimiter {
    cache: Arc<dyn FastCache>,
    limit: u32,
    window: Duration,
}

impl SubmitRateLimiter {
    pub fn new(cache: Arc<dyn FastCache>, limit_per_minute: u32) -> Self {
        Self {
            cache,
            limit: limit_per_minute,
            window: Duration::from_secs(60),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub async fn check(&self, client_id: &str) -> Result<RateDecision, CacheError> {
        if self.limit == 0 {
            return Ok(RateDecision::Allowed {
                remaining: u32::MAX,
            }); // Rate limiting disabled
        }

        let key = format!("{RATE_KEY_PREFIX}{client_id}");
        // Opens a window only when none is running; the expiry is set with the key.
        self.cache.set_nx_ex(&key, "0", self.window).await?;
        let count = self.cache.incr(&key).await?;

        if count > i64::from(self.limit) {
            return Ok(RateDecision::Limited {
                retry_after: self.window.as_secs(),
            });
        }

        let remaining = u32::try_from(i64::from(self.limit) - count).unwrap_or(0);
        Ok(RateDecision::Allowed { remaining })
    }
}
