//! Fast key/value cache shared by view counting and rate limiting.

mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CacheAppConfig;

pub use memory::MemoryCache;
pub use self::redis::{RedisCache, init_redis};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Corrupt value under '{key}': {value}")]
    Corrupt { key: String, value: String },

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Key/value operations with per-key expiry and atomic increment.
///
/// Every method is atomic for a single key; nothing spans keys.
#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set `key` with an expiry, replacing any previous value.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Set `key` with an expiry only if it is absent. Returns whether it was set.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, CacheError>;

    /// Increment an integer key, creating it at 1. Keeps any existing expiry.
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// All live keys starting with `prefix`, in no particular order.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Read an integer key. Absent keys read as `None`.
    async fn get_i64(&self, key: &str) -> Result<Option<i64>, CacheError> {
        match self.get(key).await? {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CacheError::Corrupt {
                    key: key.to_string(),
                    value: raw,
                }),
            None => Ok(None),
        }
    }
}

/// Connect the configured cache, falling back to process memory when disabled.
pub async fn init_cache(config: &CacheAppConfig) -> Result<Arc<dyn FastCache>, CacheError> {
    if !config.enabled {
        warn!("Cache disabled, view counts will live in process memory");
        return Ok(Arc::new(MemoryCache::new()));
    }

    let cache = init_redis(config).await?;
    info!(url = %config.url, "Cache connected");
    Ok(Arc::new(cache))
}

/// Expiry in whole milliseconds, rounded up and never zero.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}
