//! Submission judging pipeline.
//!
//! `submit` stores the submission, hands it to the judge engine and moves it
//! to `IN_QUEUE`; a [`PollScheduler`] loop then owns the token and is the
//! only writer of the terminal outcome.

mod poller;

use std::sync::Arc;

use common::{JudgeRequest, Language, PollVerdict, ResourceLimits, SubmissionStatus};
use sea_orm::DbErr;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config::PollConfig;
use crate::error::{AppError, Result};
use crate::judge::{JudgeClient, JudgeError};
use crate::models::submission::{NewSubmission, SubmissionView};
use crate::rate_limit::{RateDecision, SubmitRateLimiter};
use crate::store::SubmissionStore;

pub use poller::{PollExit, PollScheduler};

/// What a successful submit hands back to the caller.
#[derive(Debug)]
pub struct SubmitReceipt {
    pub submission_id: i32,
    pub token: String,
    /// The submission as written by the transition to `IN_QUEUE`.
    pub view: SubmissionView,
    /// The poll loop that owns the token.
    pub poll: JoinHandle<PollExit>,
}

pub struct SubmissionPipeline {
    store: Arc<dyn SubmissionStore>,
    judge: Arc<dyn JudgeClient>,
    limits: ResourceLimits,
    scheduler: PollScheduler,
    rate_limiter: Option<SubmitRateLimiter>,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        judge: Arc<dyn JudgeClient>,
        limits: ResourceLimits,
        poll: PollConfig,
    ) -> Self {
        let scheduler = PollScheduler::new(Arc::clone(&store), Arc::clone(&judge), poll);
        Self {
            store,
            judge,
            limits,
            scheduler,
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: SubmitRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Submit `code` for `problem_id` and start polling the judge for a verdict.
    ///
    /// Refused with [`AppError::ShuttingDown`] once [`Self::shutdown`] has run.
    #[instrument(skip(self, code))]
    pub async fn submit(
        &self,
        problem_id: i32,
        code: &str,
        language: &str,
    ) -> Result<SubmitReceipt> {
        let language: Language = language.parse()?;
        self.ensure_accepting()?;

        if !self.store.problem_exists(problem_id).await? {
            return Err(AppError::NotFound(format!("Problem {problem_id}")));
        }
        let testcase = self
            .store
            .first_testcase(problem_id)
            .await?
            .ok_or(AppError::NoTestcases(problem_id))?;

        let mut submission = self
            .store
            .create_submission(NewSubmission {
                problem_id,
                code: code.to_string(),
                language,
            })
            .await?;

        let request = JudgeRequest::new(
            code,
            language,
            &testcase.input,
            &testcase.expected_output,
            self.limits,
        );

        self.ensure_accepting()?;
        let token = match self.judge.submit(&request).await {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    submission_id = submission.id,
                    error = %e,
                    "Judge rejected submission, leaving it pending"
                );
                return Err(e.into());
            }
        };

        let submission_id = submission.id;
        if !self.store.mark_in_queue(submission_id, &token).await? {
            return Err(DbErr::RecordNotUpdated.into());
        }

        let Some(poll) = self.scheduler.schedule(submission_id, &token) else {
            error!(
                submission_id,
                token = %token,
                "Submission queued but no poll loop could be started"
            );
            return Err(AppError::ShuttingDown);
        };

        submission.status = SubmissionStatus::InQueue;
        submission.judge_token = Some(token.clone());

        info!(
            submission_id,
            token = %token,
            testcase_id = testcase.id,
            "Submission queued for judging"
        );

        Ok(SubmitReceipt {
            submission_id,
            token,
            view: SubmissionView::from(submission),
            poll,
        })
    }

    /// [`Self::submit`] behind the per-client rate limit.
    ///
    /// A cache failure while counting lets the submission through.
    pub async fn submit_as(
        &self,
        client_id: &str,
        problem_id: i32,
        code: &str,
        language: &str,
    ) -> Result<SubmitReceipt> {
        if let Some(limiter) = &self.rate_limiter {
            match limiter.check(client_id).await {
                Ok(RateDecision::Limited { retry_after }) => {
                    info!(client_id, retry_after, "Submission rate limited");
                    return Err(AppError::RateLimited { retry_after });
                }
                Ok(RateDecision::Allowed { .. }) => {}
                Err(e) => {
                    warn!(client_id, error = %e, "Rate limit check failed, allowing submission");
                }
            }
        }
        self.submit(problem_id, code, language).await
    }

    /// Current state of the submission carrying `token`.
    pub async fn get_status(&self, token: &str) -> Result<SubmissionView> {
        self.store
            .find_by_token(token)
            .await?
            .map(SubmissionView::from)
            .ok_or_else(|| AppError::NotFound(format!("Submission with token {token}")))
    }

    /// Ask the judge once for the state of `token`.
    ///
    /// Only transport failures come back as errors; an unusable answer is a
    /// failed verdict.
    pub async fn poll_once(&self, token: &str) -> std::result::Result<PollVerdict, JudgeError> {
        poller::classify_poll(self.judge.poll(token).await)
    }

    /// Stop the poll loop for `token` without writing a status.
    pub fn cancel_poll(&self, token: &str) -> bool {
        self.scheduler.cancel(token)
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Cancel every in-flight poll and refuse new submissions.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.scheduler.is_shut_down() {
            return Err(AppError::ShuttingDown);
        }
        Ok(())
    }
}
