use common::UnsupportedLanguage;
use sea_orm::DbErr;
use thiserror::Error;

use crate::cache::CacheError;
use crate::judge::JudgeError;

/// Errors surfaced to callers of the submission and view-count operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Problem {0} has no test cases")]
    NoTestcases(i32),

    #[error("Unsupported language '{0}'")]
    UnsupportedLanguage(String),

    /// The judge engine could not be reached.
    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(String),

    /// The judge engine answered with something we could not use.
    #[error("Judge protocol error: {0}")]
    JudgeProtocol(String),

    /// Too many submissions from one client. Contains seconds until retry is allowed.
    #[error("Rate limit exceeded. Try again in {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// The pipeline no longer accepts submissions.
    #[error("Submission pipeline is shutting down")]
    ShuttingDown,

    #[error("Store error: {0}")]
    Store(#[from] DbErr),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<JudgeError> for AppError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::Unavailable(msg) => AppError::JudgeUnavailable(msg),
            JudgeError::Protocol(msg) => AppError::JudgeProtocol(msg),
        }
    }
}

impl From<UnsupportedLanguage> for AppError {
    fn from(err: UnsupportedLanguage) -> Self {
        AppError::UnsupportedLanguage(err.tag)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
