use async_trait::async_trait;
use chrono::Utc;
use common::SubmissionStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entity::{article, problem, submission, test_case};
use crate::models::submission::{NewSubmission, Outcome, Submission, Testcase};

use super::{SubmissionStore, ViewCountStore};

/// Relational store backed by a SeaORM connection pool.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionStore for SeaOrmStore {
    async fn problem_exists(&self, problem_id: i32) -> Result<bool, DbErr> {
        let found = problem::Entity::find_by_id(problem_id).one(&self.db).await?;
        Ok(found.is_some())
    }

    async fn first_testcase(&self, problem_id: i32) -> Result<Option<Testcase>, DbErr> {
        let tc = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(problem_id))
            .order_by_asc(test_case::Column::CreatedAt)
            .order_by_asc(test_case::Column::Id)
            .one(&self.db)
            .await?;
        Ok(tc.map(Testcase::from))
    }

    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, DbErr> {
        let model = submission::ActiveModel {
            problem_id: Set(new.problem_id),
            code: Set(new.code),
            language: Set(new.language),
            status: Set(SubmissionStatus::Pending),
            execute_time: Set(None),
            memory_usage: Set(None),
            judge_token: Set(None),
            submit_time: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await?;
        Ok(inserted.into())
    }

    async fn mark_in_queue(&self, submission_id: i32, token: &str) -> Result<bool, DbErr> {
        let update = submission::ActiveModel {
            status: Set(SubmissionStatus::InQueue),
            judge_token: Set(Some(token.to_string())),
            ..Default::default()
        };
        let res = submission::Entity::update_many()
            .set(update)
            .filter(submission::Column::Id.eq(submission_id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
            .filter(submission::Column::JudgeToken.is_null())
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    async fn record_outcome(&self, token: &str, outcome: Outcome) -> Result<bool, DbErr> {
        let update = submission::ActiveModel {
            status: Set(outcome.status),
            execute_time: Set(outcome.execute_time),
            memory_usage: Set(outcome.memory_usage),
            ..Default::default()
        };
        let res = submission::Entity::update_many()
            .set(update)
            .filter(submission::Column::JudgeToken.eq(token))
            .filter(submission::Column::Status.eq(SubmissionStatus::InQueue))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Submission>, DbErr> {
        let found = submission::Entity::find()
            .filter(submission::Column::JudgeToken.eq(token))
            .one(&self.db)
            .await?;
        Ok(found.map(Submission::from))
    }
}

#[async_trait]
impl ViewCountStore for SeaOrmStore {
    async fn set_view_count(&self, item_id: i64, views: i64) -> Result<bool, DbErr> {
        let update = article::ActiveModel {
            views: Set(views),
            ..Default::default()
        };
        let res = article::Entity::update_many()
            .set(update)
            .filter(article::Column::Id.eq(item_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
