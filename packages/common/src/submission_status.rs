#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a submission during the judging lifecycle.
///
/// Submissions move strictly `Pending -> InQueue -> <completed>`. The pipeline
/// itself only ever assigns `Accepted`, `WrongAnswer` and `Timeout`; the
/// remaining completed values are reserved for a richer verdict mapping and
/// are already treated as completed so that `is_completed` stays stable.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// Stored, not yet accepted by the judge engine.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
    /// Accepted by the judge engine, verdict not yet known.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IN_QUEUE"))]
    InQueue,
    /// Output matched the expected output.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACCEPTED"))]
    Accepted,
    /// Any failing verdict reported by the judge engine.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "WRONG_ANSWER"))]
    WrongAnswer,
    /// No verdict arrived within the polling budget.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TIMEOUT"))]
    Timeout,
    /// Reserved.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "TIME_LIMIT_EXCEEDED"))]
    TimeLimitExceeded,
    /// Reserved.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPILATION_ERROR"))]
    CompilationError,
    /// Reserved.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "RUNTIME_ERROR"))]
    RuntimeError,
    /// Reserved.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "MEMORY_LIMIT_EXCEEDED"))]
    MemoryLimitExceeded,
}

impl SubmissionStatus {
    /// Returns true once judging has reached a final outcome.
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Pending | Self::InQueue)
    }

    /// Returns true if this is a successful verdict.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match self {
            Self::Pending => next == Self::InQueue,
            Self::InQueue => next.is_completed(),
            _ => false,
        }
    }

    /// All possible status values.
    pub const ALL: &'static [SubmissionStatus] = &[
        Self::Pending,
        Self::InQueue,
        Self::Accepted,
        Self::WrongAnswer,
        Self::Timeout,
        Self::TimeLimitExceeded,
        Self::CompilationError,
        Self::RuntimeError,
        Self::MemoryLimitExceeded,
    ];

    /// All completed statuses, including the reserved ones.
    pub const COMPLETED: &'static [SubmissionStatus] = &[
        Self::Accepted,
        Self::WrongAnswer,
        Self::Timeout,
        Self::TimeLimitExceeded,
        Self::CompilationError,
        Self::RuntimeError,
        Self::MemoryLimitExceeded,
    ];

    /// Returns the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InQueue => "IN_QUEUE",
            Self::Accepted => "ACCEPTED",
            Self::WrongAnswer => "WRONG_ANSWER",
            Self::Timeout => "TIMEOUT",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::CompilationError => "COMPILATION_ERROR",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            SubmissionStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SubmissionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
