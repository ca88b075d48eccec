use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content item whose view count is written back from the cache.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Durable snapshot of the cached counter; only the reconciliation task writes it.
    #[sea_orm(default_value = 0)]
    pub views: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
