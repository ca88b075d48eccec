pub mod config;
pub mod judge_job;
pub mod judge_result;
pub mod language;
pub mod submission_status;

pub use judge_job::{JudgeRequest, JudgeTicket, ResourceLimits};
pub use judge_result::{JudgeStatus, JudgeStatusInfo, PollVerdict};
pub use language::{Language, UnsupportedLanguage};
pub use submission_status::SubmissionStatus;
