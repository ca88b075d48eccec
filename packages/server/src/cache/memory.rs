use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tokio::time::Instant;

use super::{CacheError, FastCache};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`FastCache`] used when Redis is disabled and in tests.
///
/// Expiry follows the tokio clock, so paused-time tests can advance past it.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FastCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(o) if o.get().is_live(now) => Ok(Some(o.get().value.clone())),
            Entry::Occupied(o) => {
                o.remove();
                Ok(None)
            }
            Entry::Vacant(_) => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let slot = Slot {
            value: value.to_string(),
            expires_at: Some(now + ttl),
        };
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(o) if o.get().is_live(now) => Ok(false),
            Entry::Occupied(mut o) => {
                o.insert(slot);
                Ok(true)
            }
            Entry::Vacant(v) => {
                v.insert(slot);
                Ok(true)
            }
        }
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut o) if o.get().is_live(now) => {
                let slot = o.get_mut();
                let current: i64 = slot.value.parse().map_err(|_| CacheError::Corrupt {
                    key: key.to_string(),
                    value: slot.value.clone(),
                })?;
                let next = current + 1;
                slot.value = next.to_string();
                Ok(next)
            }
            Entry::Occupied(mut o) => {
                o.insert(Slot {
                    value: "1".into(),
                    expires_at: None,
                });
                Ok(1)
            }
            Entry::Vacant(v) => {
                v.insert(Slot {
                    value: "1".into(),
                    expires_at: None,
                });
                Ok(1)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && e.value().is_live(now))
            .map(|e| e.key().clone())
            .collect())
    }
}
