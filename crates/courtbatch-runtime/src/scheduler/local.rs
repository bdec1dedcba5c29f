//! Scheduler running each worker as a child process of this machine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};

use courtbatch_core::scheduler::{
    LaunchRequest, SchedulerError, SchedulerResult, TaskId, TaskScheduler, TaskState, TaskStatus,
};
use tokio::process::{Child, Command};

use crate::TRACING_TARGET_PROCESS;

/// Runs each task as `<program> <common args...> <task args...>`.
///
/// Children inherit the environment, stdout and stderr. A child killed by a signal reports no
/// exit code, which counts as a failure.
#[derive(Debug)]
pub struct LocalScheduler {
    program: PathBuf,
    args: Vec<String>,
    children: Mutex<HashMap<TaskId, Child>>,
}

impl LocalScheduler {
    /// Creates a scheduler launching `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Sets arguments placed before every task's own arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Creates a scheduler that relaunches the running executable.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Returns the launched program.
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn children(&self) -> MutexGuard<'_, HashMap<TaskId, Child>> {
        self.children
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl TaskScheduler for LocalScheduler {
    fn name(&self) -> &str {
        "local"
    }

    async fn launch(&self, request: &LaunchRequest) -> SchedulerResult<TaskId> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .args(&request.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                SchedulerError::launch_with_source(
                    format!("failed to spawn '{}'", self.program.display()),
                    e,
                )
            })?;

        let os_pid = child.id().unwrap_or_default();
        let task_id = TaskId::new(format!("local-{}-{os_pid}", request.pid));

        tracing::debug!(
            target: TRACING_TARGET_PROCESS,
            pid = request.pid,
            os_pid,
            task_id = %task_id,
            "Spawned worker process"
        );

        self.children().insert(task_id.clone(), child);
        Ok(task_id)
    }

    async fn poll(&self, tasks: &[TaskId]) -> SchedulerResult<Vec<TaskStatus>> {
        let mut children = self.children();
        let mut statuses = Vec::with_capacity(tasks.len());

        for task in tasks {
            let child = children
                .get_mut(task)
                .ok_or_else(|| SchedulerError::UnknownTask(task.clone()))?;

            let status = match child.try_wait() {
                Ok(Some(exit)) => TaskStatus::stopped(task.clone(), exit.code()),
                Ok(None) => TaskStatus::new(task.clone(), TaskState::Running),
                Err(e) => {
                    return Err(SchedulerError::poll_with_source(
                        format!("failed to poll '{task}'"),
                        e,
                    ));
                }
            };
            statuses.push(status);
        }

        Ok(statuses)
    }

    async fn cancel(&self, task: &TaskId) -> SchedulerResult<()> {
        let mut children = self.children();
        let child = children
            .get_mut(task)
            .ok_or_else(|| SchedulerError::UnknownTask(task.clone()))?;

        child
            .start_kill()
            .map_err(|e| SchedulerError::cancel_with_source(format!("failed to kill '{task}'"), e))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    fn request(pid: usize, script: &str) -> LaunchRequest {
        LaunchRequest {
            pid,
            nprocs: 1,
            args: vec!["-c".to_owned(), script.to_owned()],
        }
    }

    async fn poll_until_stopped(scheduler: &LocalScheduler, task: &TaskId) -> TaskStatus {
        for _ in 0..100 {
            let status = scheduler.poll(std::slice::from_ref(task)).await.unwrap().remove(0);
            if status.state == TaskState::Stopped {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("task {task} did not stop");
    }

    #[tokio::test]
    async fn reports_exit_codes() {
        let scheduler = LocalScheduler::new("sh");

        let ok = scheduler.launch(&request(0, "exit 0")).await.unwrap();
        let failed = scheduler.launch(&request(1, "exit 3")).await.unwrap();

        assert!(ok.as_str().starts_with("local-0-"));
        assert_eq!(poll_until_stopped(&scheduler, &ok).await.exit_code, Some(0));
        assert_eq!(poll_until_stopped(&scheduler, &failed).await.exit_code, Some(3));
    }

    #[tokio::test]
    async fn common_args_come_first() {
        let scheduler = LocalScheduler::new("sh").with_args(["-c", "exit $0"]);
        let task = scheduler
            .launch(&LaunchRequest {
                pid: 0,
                nprocs: 1,
                args: vec!["5".to_owned()],
            })
            .await
            .unwrap();

        assert_eq!(poll_until_stopped(&scheduler, &task).await.exit_code, Some(5));
    }

    #[tokio::test]
    async fn cancel_kills_the_process() {
        let scheduler = LocalScheduler::new("sh");
        let task = scheduler.launch(&request(0, "sleep 30")).await.unwrap();

        scheduler.cancel(&task).await.unwrap();

        let status = poll_until_stopped(&scheduler, &task).await;
        assert_eq!(status.exit_code, None);
    }

    #[tokio::test]
    async fn missing_program_fails_to_launch() {
        let scheduler = LocalScheduler::new("/nonexistent/courtbatch-worker");

        let err = scheduler.launch(&request(0, "exit 0")).await.unwrap_err();
        assert!(matches!(err, SchedulerError::Launch { .. }));
    }

    #[tokio::test]
    async fn unknown_task() {
        let scheduler = LocalScheduler::new("sh");

        let err = scheduler.poll(&[TaskId::from("local-9-1")]).await.unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownTask(_)));
    }
}
