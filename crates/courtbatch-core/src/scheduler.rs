//! Remote task scheduler interface.
//!
//! The orchestrator talks to a scheduler only through [`TaskScheduler`]:
//! launch one task per worker, poll task states, and cancel tasks. Concrete
//! schedulers live in other crates (an HTTP serverless endpoint, local child
//! processes).

use std::borrow::Cow;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay};

use crate::BoxedError;

/// Result type for scheduler calls.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors reported by a scheduler implementation.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduler refused or failed to start a task.
    #[error("task launch failed: {message}")]
    Launch {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxedError>,
    },

    /// Task states could not be retrieved.
    #[error("task poll failed: {message}")]
    Poll {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxedError>,
    },

    /// A task could not be cancelled.
    #[error("task cancel failed: {message}")]
    Cancel {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxedError>,
    },

    /// The scheduler does not know the task.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
}

impl SchedulerError {
    /// Creates a launch error.
    pub fn launch(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Launch {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a launch error with a source.
    pub fn launch_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Launch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a poll error.
    pub fn poll(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Poll {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a poll error with a source.
    pub fn poll_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Poll {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a cancel error.
    pub fn cancel(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancel {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a cancel error with a source.
    pub fn cancel_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Cancel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Identifier a scheduler assigns to a launched task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display, From)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Lifecycle state of a task.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
    AsRefStr, StrumDisplay,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskState {
    /// Accepted but not started.
    #[default]
    Pending,
    /// Executing.
    Running,
    /// Finished, successfully or not.
    Stopped,
}

/// State of one task as reported by a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: TaskId,
    pub state: TaskState,
    /// Exit code, known once the task stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl TaskStatus {
    /// Creates a status for a task that has not stopped.
    pub fn new(id: TaskId, state: TaskState) -> Self {
        Self {
            id,
            state,
            exit_code: None,
        }
    }

    /// Creates a status for a stopped task.
    pub fn stopped(id: TaskId, exit_code: Option<i32>) -> Self {
        Self {
            id,
            state: TaskState::Stopped,
            exit_code,
        }
    }
}

/// Everything a scheduler needs to start one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Worker index.
    pub pid: usize,
    /// Total number of workers.
    pub nprocs: usize,
    /// Worker arguments, starting at the subcommand.
    pub args: Vec<String>,
}

/// Handle on one submitted worker.
///
/// A handle without a task id records a launch that never provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub pid: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl JobHandle {
    /// Creates a handle for a task that was accepted by the scheduler.
    pub fn provisioned(pid: usize, task_id: TaskId) -> Self {
        Self {
            pid,
            task_id: Some(task_id),
            state: TaskState::Pending,
            exit_code: None,
        }
    }

    /// Creates a handle for a launch that failed.
    pub fn unprovisioned(pid: usize) -> Self {
        Self {
            pid,
            task_id: None,
            state: TaskState::Pending,
            exit_code: None,
        }
    }

    /// Returns `true` if the scheduler accepted the task.
    pub fn is_provisioned(&self) -> bool {
        self.task_id.is_some()
    }

    /// Returns `true` once the task has stopped.
    pub fn is_stopped(&self) -> bool {
        self.state == TaskState::Stopped
    }

    /// Returns `true` if the task stopped with exit code zero.
    pub fn succeeded(&self) -> bool {
        self.is_stopped() && self.exit_code == Some(0)
    }

    /// Applies a polled status.
    ///
    /// States only move forward; a stale status never reverts a handle.
    pub fn observe(&mut self, status: &TaskStatus) {
        if status.state < self.state {
            return;
        }
        self.state = status.state;
        if status.state == TaskState::Stopped {
            self.exit_code = status.exit_code;
        }
    }
}

/// Launches, polls and cancels remote tasks.
#[async_trait::async_trait]
pub trait TaskScheduler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Starts one task. An error means the task was not provisioned.
    async fn launch(&self, request: &LaunchRequest) -> SchedulerResult<TaskId>;

    /// Returns the current state of each task, in any order.
    async fn poll(&self, tasks: &[TaskId]) -> SchedulerResult<Vec<TaskStatus>>;

    /// Requests that a task stop.
    async fn cancel(&self, task: &TaskId) -> SchedulerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_state_only_moves_forward() {
        let mut handle = JobHandle::provisioned(0, TaskId::from("t-0"));
        handle.observe(&TaskStatus::new("t-0".into(), TaskState::Running));
        assert_eq!(handle.state, TaskState::Running);

        handle.observe(&TaskStatus::stopped("t-0".into(), Some(3)));
        assert!(handle.is_stopped());
        assert_eq!(handle.exit_code, Some(3));
        assert!(!handle.succeeded());

        handle.observe(&TaskStatus::new("t-0".into(), TaskState::Running));
        assert!(handle.is_stopped());
    }

    #[test]
    fn unprovisioned_handle_has_no_task() {
        let handle = JobHandle::unprovisioned(4);
        assert!(!handle.is_provisioned());
        assert_eq!(handle.state, TaskState::Pending);
    }
}
