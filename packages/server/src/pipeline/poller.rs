use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::{PollVerdict, SubmissionStatus};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PollConfig;
use crate::judge::{JudgeClient, JudgeError};
use crate::models::submission::Outcome;
use crate::store::SubmissionStore;

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// A terminal status was decided. `recorded` is false when the store
    /// refused or failed the write.
    Finished {
        status: SubmissionStatus,
        recorded: bool,
    },
    /// Cancelled before a terminal status was decided; nothing was written.
    Cancelled,
}

/// Map a raw poll result onto the verdict buckets.
///
/// Transport failures stay errors so the caller can retry; an unusable
/// response is a failure verdict.
pub(crate) fn classify_poll(
    result: Result<common::JudgeStatus, JudgeError>,
) -> Result<PollVerdict, JudgeError> {
    match result {
        Ok(status) => Ok(status.verdict()),
        Err(JudgeError::Protocol(msg)) => Ok(PollVerdict::malformed(msg)),
        Err(e) => Err(e),
    }
}

struct ActivePoll {
    generation: u64,
    cancel: CancellationToken,
}

struct SchedulerInner {
    store: Arc<dyn SubmissionStore>,
    judge: Arc<dyn JudgeClient>,
    config: PollConfig,
    permits: Arc<Semaphore>,
    active: DashMap<String, ActivePoll>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

/// Runs one poll loop per judge token, with a cap on how many run at once.
///
/// A token is polled by at most one loop at a time. Loops waiting for a
/// permit count as active and can be cancelled like running ones.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<SchedulerInner>,
}

impl PollScheduler {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        judge: Arc<dyn JudgeClient>,
        config: PollConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                judge,
                config,
                permits,
                active: DashMap::new(),
                generation: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Start polling `token`. Returns `None` if the token is already being
    /// polled or the scheduler has shut down.
    pub fn schedule(&self, submission_id: i32, token: &str) -> Option<JoinHandle<PollExit>> {
        if self.inner.shutdown.is_cancelled() {
            warn!(submission_id, token, "Scheduler shut down, not polling");
            return None;
        }

        let cancel = self.inner.shutdown.child_token();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);

        match self.inner.active.entry(token.to_string()) {
            Entry::Occupied(_) => {
                warn!(submission_id, token, "Token already being polled");
                return None;
            }
            Entry::Vacant(slot) => {
                slot.insert(ActivePoll {
                    generation,
                    cancel: cancel.clone(),
                });
            }
        }

        let inner = Arc::clone(&self.inner);
        let token = token.to_string();

        Some(tokio::spawn(async move {
            let permit = tokio::select! {
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&inner.permits).acquire_owned() => permit.ok(),
            };

            let exit = match permit {
                Some(_permit) => run_poll_loop(&inner, submission_id, &token, &cancel).await,
                None => PollExit::Cancelled,
            };

            inner
                .active
                .remove_if(&token, |_, poll| poll.generation == generation);
            exit
        }))
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub fn is_polling(&self, token: &str) -> bool {
        self.inner.active.contains_key(token)
    }

    /// Number of loops running or waiting for a permit.
    pub fn active(&self) -> usize {
        self.inner.active.len()
    }

    /// Stop polling `token` without writing a status. Returns whether a loop was found.
    pub fn cancel(&self, token: &str) -> bool {
        match self.inner.active.get(token) {
            Some(poll) => {
                poll.cancel.cancel();
                info!(token, "Poll cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every loop and refuse new ones.
    pub fn shutdown(&self) {
        let active = self.active();
        self.inner.shutdown.cancel();
        info!(active, "Poll scheduler shut down");
    }
}

/// Poll the judge until a terminal verdict, the attempt budget runs out, or cancellation.
async fn run_poll_loop(
    inner: &SchedulerInner,
    submission_id: i32,
    token: &str,
    cancel: &CancellationToken,
) -> PollExit {
    let interval = inner.config.interval();
    let max_attempts = inner.config.max_attempts;

    for attempt in 1..=max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return PollExit::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }

        let polled = tokio::select! {
            _ = cancel.cancelled() => return PollExit::Cancelled,
            polled = inner.judge.poll(token) => polled,
        };

        match classify_poll(polled) {
            Ok(PollVerdict::Accepted { time_ms, memory_kb }) => {
                debug!(submission_id, attempt, ?time_ms, ?memory_kb, "Judge accepted");
                return finish(inner, submission_id, token, Outcome::accepted(time_ms, memory_kb))
                    .await;
            }
            Ok(PollVerdict::Failed {
                status_id,
                description,
            }) => {
                debug!(submission_id, attempt, ?status_id, %description, "Judge rejected");
                return finish(inner, submission_id, token, Outcome::wrong_answer()).await;
            }
            Ok(PollVerdict::Running) => {
                debug!(submission_id, attempt, "Still judging");
            }
            Err(e) => {
                warn!(
                    submission_id,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Judge poll failed, will retry"
                );
            }
        }
    }

    info!(submission_id, max_attempts, "No verdict within attempt budget");
    finish(inner, submission_id, token, Outcome::timeout()).await
}

async fn finish(
    inner: &SchedulerInner,
    submission_id: i32,
    token: &str,
    outcome: Outcome,
) -> PollExit {
    let recorded = match inner.store.record_outcome(token, outcome).await {
        Ok(true) => {
            info!(
                submission_id,
                status = %outcome.status,
                execute_time = ?outcome.execute_time,
                memory_usage = ?outcome.memory_usage,
                "Recorded judge outcome"
            );
            true
        }
        Ok(false) => {
            warn!(
                submission_id,
                status = %outcome.status,
                "Submission no longer in queue, outcome dropped"
            );
            false
        }
        Err(e) => {
            error!(
                submission_id,
                status = %outcome.status,
                error = %e,
                "Failed to record judge outcome"
            );
            false
        }
    };

    PollExit::Finished {
        status: outcome.status,
        recorded,
    }
}
