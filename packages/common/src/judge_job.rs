use serde::{Deserialize, Serialize};

use crate::Language;

/// Resource ceilings attached to every judge request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time ceiling in seconds.
    pub cpu_time_limit: f64,
    /// Memory ceiling in kilobytes.
    pub memory_limit: i64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_limit: 1.0,
            memory_limit: 240_000,
        }
    }
}

/// Body posted to the judge engine to start a job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub source_code: String,
    /// Engine-specific language id, see [`Language::judge_id`].
    pub language_id: i32,
    pub stdin: String,
    pub expected_output: String,
    pub cpu_time_limit: f64,
    pub memory_limit: i64,
}

impl JudgeRequest {
    pub fn new(
        source_code: impl Into<String>,
        language: Language,
        stdin: impl Into<String>,
        expected_output: impl Into<String>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            language_id: language.judge_id(),
            stdin: stdin.into(),
            expected_output: expected_output.into(),
            cpu_time_limit: limits.cpu_time_limit,
            memory_limit: limits.memory_limit,
        }
    }
}

/// Judge engine reply to a job submission.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JudgeTicket {
    #[serde(default)]
    pub token: String,
}
