use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::cache::init_cache;
use crate::config::AppConfig;
use crate::database::init_db;
use crate::error::AppError;
use crate::judge::Judge0Client;
use crate::pipeline::SubmissionPipeline;
use crate::rate_limit::SubmitRateLimiter;
use crate::store::SeaOrmStore;
use crate::views::ViewCounter;

/// Long-lived handles shared by the host process.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Closed by the host once the background tasks have stopped.
    pub db: DatabaseConnection,
    pub pipeline: Arc<SubmissionPipeline>,
    pub views: Arc<ViewCounter>,
}

impl AppState {
    /// Connect the database and cache and wire the pipeline and view counter to them.
    pub async fn init(config: AppConfig) -> Result<Self, AppError> {
        let db = init_db(&config.database.url).await?;
        info!("Database connected");

        let cache = init_cache(&config.cache).await?;
        let store = Arc::new(SeaOrmStore::new(db.clone()));
        let judge = Arc::new(Judge0Client::new(&config.judge)?);
        info!(base_url = %judge.base_url(), "Judge client ready");

        let pipeline = SubmissionPipeline::new(
            store.clone(),
            judge,
            config.judge.limits(),
            config.judge.poll.clone(),
        )
        .with_rate_limiter(SubmitRateLimiter::new(
            Arc::clone(&cache),
            config.submission.rate_limit_per_minute,
        ));

        let views = ViewCounter::new(Arc::clone(&cache), store, config.views.clone());

        Ok(Self {
            config,
            db,
            pipeline: Arc::new(pipeline),
            views: Arc::new(views),
        })
    }
}
