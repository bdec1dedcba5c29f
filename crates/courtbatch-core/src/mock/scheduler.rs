//! Mock task scheduler.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::scheduler::{
    LaunchRequest, SchedulerError, SchedulerResult, TaskId, TaskScheduler, TaskState, TaskStatus,
};

#[derive(Debug, Default)]
struct MockState {
    launched: Vec<LaunchRequest>,
    polls: HashMap<TaskId, usize>,
    pids: HashMap<TaskId, usize>,
    cancelled: Vec<TaskId>,
    poll_rounds: usize,
}

/// Scheduler whose launch failures, exit codes and run time are scripted.
///
/// Every launched task reports `Running` for the configured number of polls
/// and `Stopped` afterwards.
#[derive(Debug, Default)]
pub struct MockScheduler {
    failed_launches: HashSet<usize>,
    exit_codes: HashMap<usize, i32>,
    polls_until_stopped: usize,
    never_stops: bool,
    state: Mutex<MockState>,
}

impl MockScheduler {
    /// Creates a scheduler where every task launches and exits with 0 on the first poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the launch of `pid` fail.
    pub fn with_failed_launch(mut self, pid: usize) -> Self {
        self.failed_launches.insert(pid);
        self
    }

    /// Sets the exit code reported for `pid`.
    pub fn with_exit_code(mut self, pid: usize, code: i32) -> Self {
        self.exit_codes.insert(pid, code);
        self
    }

    /// Number of polls each task reports `Running` before stopping.
    pub fn with_polls_until_stopped(mut self, polls: usize) -> Self {
        self.polls_until_stopped = polls;
        self
    }

    /// Tasks never stop.
    pub fn never_stopping(mut self) -> Self {
        self.never_stops = true;
        self
    }

    /// Task id assigned to `pid`.
    pub fn task_id(pid: usize) -> TaskId {
        TaskId::new(format!("mock-task-{pid}"))
    }

    /// Every launch request received, including failed ones.
    pub fn launched(&self) -> Vec<LaunchRequest> {
        self.lock().launched.clone()
    }

    /// Tasks that were cancelled, in call order.
    pub fn cancelled(&self) -> Vec<TaskId> {
        self.lock().cancelled.clone()
    }

    /// Number of poll calls received.
    pub fn poll_rounds(&self) -> usize {
        self.lock().poll_rounds
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl TaskScheduler for MockScheduler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn launch(&self, request: &LaunchRequest) -> SchedulerResult<TaskId> {
        let mut state = self.lock();
        state.launched.push(request.clone());

        if self.failed_launches.contains(&request.pid) {
            return Err(SchedulerError::launch(format!(
                "no capacity for pid {}",
                request.pid
            )));
        }

        let id = Self::task_id(request.pid);
        state.polls.insert(id.clone(), 0);
        state.pids.insert(id.clone(), request.pid);
        Ok(id)
    }

    async fn poll(&self, tasks: &[TaskId]) -> SchedulerResult<Vec<TaskStatus>> {
        let mut state = self.lock();
        state.poll_rounds += 1;

        let mut statuses = Vec::with_capacity(tasks.len());
        for id in tasks {
            let pid = *state
                .pids
                .get(id)
                .ok_or_else(|| SchedulerError::UnknownTask(id.clone()))?;
            let polls = state.polls.entry(id.clone()).or_default();
            *polls += 1;

            let stopped = !self.never_stops && *polls > self.polls_until_stopped;
            statuses.push(if stopped {
                let code = self.exit_codes.get(&pid).copied().unwrap_or(0);
                TaskStatus::stopped(id.clone(), Some(code))
            } else {
                TaskStatus::new(id.clone(), TaskState::Running)
            });
        }

        Ok(statuses)
    }

    async fn cancel(&self, task: &TaskId) -> SchedulerResult<()> {
        let mut state = self.lock();
        if !state.pids.contains_key(task) {
            return Err(SchedulerError::UnknownTask(task.clone()));
        }
        state.cancelled.push(task.clone());
        Ok(())
    }
}
