use common::{Language, SubmissionStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub code: String,
    pub language: Language,
    pub status: SubmissionStatus,

    pub execute_time: Option<i32>, // in milliseconds
    pub memory_usage: Option<i32>, // in kilobytes

    /// Set once the judge engine accepts the job, never changed afterwards.
    #[sea_orm(unique)]
    pub judge_token: Option<String>,

    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id")]
    pub problem: HasOne<super::problem::Entity>,

    pub submit_time: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
