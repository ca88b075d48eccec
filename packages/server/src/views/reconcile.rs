use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ViewCounter;
use super::keys::{self, VIEWS_PREFIX};
use crate::cache::{CacheError, FastCache};
use crate::store::ViewCountStore;

/// Tally of one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Counters written to the store.
    pub synced: usize,
    /// Counters whose item has no durable row.
    pub missing: usize,
    /// Keys that could not be parsed or read.
    pub skipped: usize,
    /// Store writes that failed.
    pub failed: usize,
}

/// Copy every cached view counter into the store.
///
/// Only a failed scan aborts the pass; per-item problems are logged and counted.
pub async fn reconcile_once(
    cache: &dyn FastCache,
    store: &dyn ViewCountStore,
) -> Result<ReconcileReport, CacheError> {
    let mut report = ReconcileReport::default();

    for key in cache.scan_prefix(VIEWS_PREFIX).await? {
        let Some(item_id) = keys::parse_views_key(&key) else {
            warn!(key = %key, "Skipping unrecognised view counter key");
            report.skipped += 1;
            continue;
        };

        let views = match cache.get_i64(&key).await {
            Ok(Some(views)) => views,
            // Expired between scan and read.
            Ok(None) => continue,
            Err(e) => {
                warn!(item_id, error = %e, "Failed to read view counter");
                report.skipped += 1;
                continue;
            }
        };

        match store.set_view_count(item_id, views).await {
            Ok(true) => {
                debug!(item_id, views, "View count synced");
                report.synced += 1;
            }
            Ok(false) => {
                debug!(item_id, views, "No stored item for view counter");
                report.missing += 1;
            }
            Err(e) => {
                error!(item_id, views, error = %e, "Failed to persist view count");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Reconcile every `sync_interval_secs` until `shutdown` fires.
///
/// The first pass runs one full period after start.
pub async fn run_view_sync(counter: Arc<ViewCounter>, shutdown: CancellationToken) {
    let period = Duration::from_secs(counter.config().sync_interval_secs.max(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "View count sync started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("View count sync stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        match counter.reconcile_once().await {
            Ok(report) => info!(
                synced = report.synced,
                missing = report.missing,
                skipped = report.skipped,
                failed = report.failed,
                "View count sync pass finished"
            ),
            Err(e) => error!(error = %e, "View count sync pass aborted"),
        }
    }
}

pub fn spawn_view_sync(counter: Arc<ViewCounter>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run_view_sync(counter, shutdown))
}
