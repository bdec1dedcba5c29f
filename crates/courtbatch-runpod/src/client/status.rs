//! RunPod job status payloads and their mapping onto task states.

use courtbatch_core::scheduler::{TaskId, TaskState, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status string reported by the RunPod API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
    /// Any status this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Response of `run` and `status` calls.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JobResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<Value>,
}

impl JobResponse {
    /// Exit code the handler reported in its output, if any.
    fn reported_exit_code(&self) -> Option<i32> {
        self.output
            .as_ref()?
            .get("exit_code")?
            .as_i64()
            .and_then(|code| i32::try_from(code).ok())
    }

    /// Converts the response into a task status.
    pub fn to_task_status(&self) -> TaskStatus {
        let id = TaskId::new(self.id.clone());
        match self.status {
            JobStatus::InQueue | JobStatus::Unknown => TaskStatus::new(id, TaskState::Pending),
            JobStatus::InProgress => TaskStatus::new(id, TaskState::Running),
            JobStatus::Completed => {
                TaskStatus::stopped(id, Some(self.reported_exit_code().unwrap_or(0)))
            }
            JobStatus::Failed | JobStatus::Cancelled | JobStatus::TimedOut => {
                let code = self.reported_exit_code().filter(|code| *code != 0);
                TaskStatus::stopped(id, Some(code.unwrap_or(1)))
            }
        }
    }
}
