//! Durable storage seams.
//!
//! The pipeline and view counter only ever touch the relational store through
//! these traits, so the production [`SeaOrmStore`] can be swapped for an
//! in-memory double in tests.

mod orm;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::models::submission::{NewSubmission, Outcome, Submission, Testcase};

pub use orm::SeaOrmStore;

/// Submission, problem and test case persistence.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Check whether a problem exists.
    async fn problem_exists(&self, problem_id: i32) -> Result<bool, DbErr>;

    /// The earliest created test case of a problem, ties broken by id.
    async fn first_testcase(&self, problem_id: i32) -> Result<Option<Testcase>, DbErr>;

    /// Insert a submission in `PENDING` with no token.
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, DbErr>;

    /// Record the judge token and move `PENDING -> IN_QUEUE`.
    ///
    /// Returns `false` if the submission was not pending or already had a token.
    async fn mark_in_queue(&self, submission_id: i32, token: &str) -> Result<bool, DbErr>;

    /// Write the terminal outcome for the submission carrying `token`.
    ///
    /// Only applies while the submission is `IN_QUEUE`; returns whether a row changed.
    async fn record_outcome(&self, token: &str, outcome: Outcome) -> Result<bool, DbErr>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Submission>, DbErr>;
}

/// Durable view counts of content items.
#[async_trait]
pub trait ViewCountStore: Send + Sync {
    /// Overwrite the persisted view count. Returns `false` if no such item exists.
    async fn set_view_count(&self, item_id: i64, views: i64) -> Result<bool, DbErr>;
}
