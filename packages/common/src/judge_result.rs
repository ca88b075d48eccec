use serde::{Deserialize, Serialize};

/// Status id the judge engine reports for an accepted run.
pub const STATUS_ACCEPTED: i32 = 3;

/// Status portion of a judge engine poll response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeStatusInfo {
    pub id: i32,
    #[serde(default)]
    pub description: String,
}

/// Judge engine reply to a poll by token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgeStatus {
    pub status: JudgeStatusInfo,
    /// Wall time in seconds as a decimal string, e.g. `"0.012"`.
    #[serde(default)]
    pub time: Option<String>,
    /// Peak memory in kilobytes.
    #[serde(default)]
    pub memory: Option<i64>,
}

/// The three outcomes the pipeline distinguishes for a single poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollVerdict {
    Accepted {
        /// Wall time in milliseconds.
        time_ms: Option<i32>,
        /// Memory in kilobytes.
        memory_kb: Option<i32>,
    },
    Running,
    /// Any failing verdict. `status_id` is absent when the response itself was unusable.
    Failed {
        status_id: Option<i32>,
        description: String,
    },
}

impl PollVerdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Failure bucket for a response that could not be interpreted.
    pub fn malformed(description: impl Into<String>) -> Self {
        Self::Failed {
            status_id: None,
            description: description.into(),
        }
    }
}

impl JudgeStatus {
    /// Bucket this response: id 3 is accepted, anything above is a failure,
    /// everything else is still running.
    pub fn verdict(&self) -> PollVerdict {
        let id = self.status.id;
        if id == STATUS_ACCEPTED {
            PollVerdict::Accepted {
                time_ms: self.time.as_deref().and_then(parse_wall_time_ms),
                memory_kb: self.memory.and_then(|m| i32::try_from(m).ok()),
            }
        } else if id > STATUS_ACCEPTED {
            PollVerdict::Failed {
                status_id: Some(id),
                description: self.status.description.clone(),
            }
        } else {
            PollVerdict::Running
        }
    }
}

/// Parse a decimal seconds string into whole milliseconds.
///
/// Rounds to the nearest millisecond so that `"0.029"` yields 29 rather than
/// a truncated float artefact.
pub fn parse_wall_time_ms(raw: &str) -> Option<i32> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let ms = (secs * 1000.0).round();
    if ms > i32::MAX as f64 {
        return None;
    }
    Some(ms as i32)
}
