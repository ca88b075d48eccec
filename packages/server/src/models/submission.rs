use chrono::{DateTime, Utc};
use common::{Language, SubmissionStatus};
use serde::{Deserialize, Serialize};

use crate::entity::{submission, test_case};

/// A submission as the pipeline sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: i32,
    pub problem_id: i32,
    pub code: String,
    pub language: Language,
    pub status: SubmissionStatus,
    /// Milliseconds, null until a verdict with measurements arrives.
    pub execute_time: Option<i32>,
    /// Kilobytes, null until a verdict with measurements arrives.
    pub memory_usage: Option<i32>,
    pub submit_time: DateTime<Utc>,
    pub judge_token: Option<String>,
}

impl From<submission::Model> for Submission {
    fn from(model: submission::Model) -> Self {
        Self {
            id: model.id,
            problem_id: model.problem_id,
            code: model.code,
            language: model.language,
            status: model.status,
            execute_time: model.execute_time,
            memory_usage: model.memory_usage,
            submit_time: model.submit_time,
            judge_token: model.judge_token,
        }
    }
}

/// Fields needed to store a fresh submission.
#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub problem_id: i32,
    pub code: String,
    pub language: Language,
}

/// Sample input/expected-output pair sent along with a judge request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Testcase {
    pub id: i32,
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
}

impl From<test_case::Model> for Testcase {
    fn from(model: test_case::Model) -> Self {
        Self {
            id: model.id,
            problem_id: model.problem_id,
            input: model.input,
            expected_output: model.expected_output,
        }
    }
}

/// Terminal result written by the poll loop that owns a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub status: SubmissionStatus,
    pub execute_time: Option<i32>,
    pub memory_usage: Option<i32>,
}

impl Outcome {
    pub fn accepted(execute_time: Option<i32>, memory_usage: Option<i32>) -> Self {
        Self {
            status: SubmissionStatus::Accepted,
            execute_time,
            memory_usage,
        }
    }

    pub fn wrong_answer() -> Self {
        Self {
            status: SubmissionStatus::WrongAnswer,
            execute_time: None,
            memory_usage: None,
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: SubmissionStatus::Timeout,
            execute_time: None,
            memory_usage: None,
        }
    }
}

/// Read-only view returned by submit and status queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: i32,
    pub problem_id: i32,
    pub code: String,
    pub language: Language,
    pub status: SubmissionStatus,
    /// True once the status is one of the completed outcomes.
    pub is_completed: bool,
    pub execute_time: Option<i32>,
    pub memory_usage: Option<i32>,
    pub submit_time: DateTime<Utc>,
    pub judge_token: Option<String>,
}

impl From<Submission> for SubmissionView {
    fn from(sub: Submission) -> Self {
        Self {
            id: sub.id,
            problem_id: sub.problem_id,
            code: sub.code,
            language: sub.language,
            is_completed: sub.status.is_completed(),
            status: sub.status,
            execute_time: sub.execute_time,
            memory_usage: sub.memory_usage,
            submit_time: sub.submit_time,
            judge_token: sub.judge_token,
        }
    }
}
