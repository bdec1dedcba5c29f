//! Completion waiting.

use std::time::Duration;

use courtbatch_core::scheduler::{JobHandle, TaskId, TaskScheduler};

use crate::{Result, RuntimeError, TRACING_TARGET_WAIT};

/// Default pause between poll rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of poll rounds before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 500;

/// Summary of a completed wait.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitReport {
    /// Poll rounds performed.
    pub attempts: usize,
    /// Pids excluded from the wait because they never provisioned.
    pub unprovisioned: Vec<usize>,
}

/// Polls the scheduler until every provisioned handle has stopped.
///
/// Handles without a task id are skipped and listed in the report. Between
/// rounds the task sleeps for `poll_interval`; there is no sleep after the
/// last round. Fails with [`RuntimeError::WaitTimeoutExceeded`] when tasks are
/// still running after `max_attempts` rounds; those tasks are left running.
pub async fn wait(
    scheduler: &dyn TaskScheduler,
    handles: &mut [JobHandle],
    poll_interval: Duration,
    max_attempts: usize,
) -> Result<WaitReport> {
    let mut report = WaitReport {
        unprovisioned: handles
            .iter()
            .filter(|h| !h.is_provisioned())
            .map(|h| h.pid)
            .collect(),
        ..WaitReport::default()
    };

    tracing::info!(
        target: TRACING_TARGET_WAIT,
        tasks = handles.len() - report.unprovisioned.len(),
        poll_interval = ?poll_interval,
        max_attempts,
        "Waiting for tasks to complete"
    );

    for attempt in 1..=max_attempts {
        let pending = pending_tasks(handles);
        if pending.is_empty() {
            break;
        }

        report.attempts = attempt;
        let statuses = scheduler.poll(&pending).await?;
        for status in &statuses {
            if let Some(handle) = handles
                .iter_mut()
                .find(|h| h.task_id.as_ref() == Some(&status.id))
            {
                handle.observe(status);
            }
        }

        let remaining = pending_tasks(handles).len();
        tracing::debug!(
            target: TRACING_TARGET_WAIT,
            attempt,
            remaining,
            "Polled tasks"
        );

        if remaining > 0 && attempt < max_attempts {
            tokio::time::sleep(poll_interval).await;
        }
    }

    let pending: Vec<usize> = handles
        .iter()
        .filter(|h| h.is_provisioned() && !h.is_stopped())
        .map(|h| h.pid)
        .collect();

    if !pending.is_empty() {
        tracing::warn!(
            target: TRACING_TARGET_WAIT,
            attempts = report.attempts,
            pending = ?pending,
            "Gave up waiting for tasks"
        );
        return Err(RuntimeError::WaitTimeoutExceeded {
            attempts: report.attempts,
            pending,
        });
    }

    tracing::info!(
        target: TRACING_TARGET_WAIT,
        attempts = report.attempts,
        "All tasks completed"
    );

    Ok(report)
}

fn pending_tasks(handles: &[JobHandle]) -> Vec<TaskId> {
    handles
        .iter()
        .filter(|h| !h.is_stopped())
        .filter_map(|h| h.task_id.clone())
        .collect()
}
