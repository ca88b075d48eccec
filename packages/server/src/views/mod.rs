//! Per-item view counting with per-client dedup, kept in the fast cache and
//! written back to the durable store by [`reconcile`].

pub mod keys;
pub mod reconcile;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheError, FastCache};
use crate::config::ViewsConfig;
use crate::store::ViewCountStore;

pub use reconcile::{ReconcileReport, run_view_sync, spawn_view_sync};

/// Items with more views than this get their rendered content cached.
pub const PROMOTE_THRESHOLD: i64 = 100;

pub struct ViewCounter {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn ViewCountStore>,
    config: ViewsConfig,
}

impl ViewCounter {
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn ViewCountStore>,
        config: ViewsConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    pub fn config(&self) -> &ViewsConfig {
        &self.config
    }

    /// Count a view of `item_id` by `client_id`, at most once per dedup window.
    ///
    /// The marker is claimed with a single set-if-absent before the counter
    /// moves, so concurrent views from one client count once.
    pub async fn record_view(&self, item_id: i64, client_id: &str) -> Result<bool, CacheError> {
        let window = Duration::from_secs(self.config.dedup_window_secs);
        let marker = keys::client_key(item_id, client_id);

        if !self.cache.set_nx_ex(&marker, "1", window).await? {
            debug!(item_id, client_id, "Repeat view inside dedup window");
            return Ok(false);
        }

        let count = self.cache.incr(&keys::views_key(item_id)).await?;
        debug!(item_id, client_id, count, "View recorded");
        Ok(true)
    }

    /// Cached view count. An absent counter reads as zero.
    pub async fn count(&self, item_id: i64) -> Result<i64, CacheError> {
        Ok(self
            .cache
            .get_i64(&keys::views_key(item_id))
            .await?
            .unwrap_or(0))
    }

    pub async fn should_promote(&self, item_id: i64) -> Result<bool, CacheError> {
        Ok(self.count(item_id).await? > PROMOTE_THRESHOLD)
    }

    /// Cache rendered content for `item_id` for the configured lifetime.
    pub async fn cache_content(&self, item_id: i64, body: &str) -> Result<(), CacheError> {
        let ttl = Duration::from_secs(self.config.content_ttl_secs);
        self.cache
            .set_ex(&keys::content_key(item_id), body, ttl)
            .await
    }

    pub async fn cached_content(&self, item_id: i64) -> Result<Option<String>, CacheError> {
        self.cache.get(&keys::content_key(item_id)).await
    }

    /// Write every cached counter back to the durable store once.
    pub async fn reconcile_once(&self) -> Result<ReconcileReport, CacheError> {
        reconcile::reconcile_once(self.cache.as_ref(), self.store.as_ref()).await
    }
}
