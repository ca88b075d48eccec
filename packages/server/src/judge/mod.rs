//! Request/response client for the remote judging engine.

mod judge0;

use async_trait::async_trait;
use common::{JudgeRequest, JudgeStatus};
use thiserror::Error;

pub use judge0::Judge0Client;

#[derive(Debug, Error)]
pub enum JudgeError {
    /// Transport-level failure or the engine reporting itself unavailable.
    /// Retry-worthy while polling.
    #[error("{0}")]
    Unavailable(String),

    /// The engine answered, but not with anything usable.
    #[error("{0}")]
    Protocol(String),
}

impl JudgeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Start a judge job, returning its non-empty tracking token.
    async fn submit(&self, request: &JudgeRequest) -> Result<String, JudgeError>;

    /// Fetch the current status of the job behind `token`.
    async fn poll(&self, token: &str) -> Result<JudgeStatus, JudgeError>;
}
