//! Failure arbitration.
//!
//! Rules, in order:
//!
//! 1. Any task without a task id: cancel every provisioned task and fail the
//!    run with [`RuntimeError::ProvisioningFailed`]. Nothing is combined.
//! 2. After waiting, any task that did not exit with code zero: warn, combine
//!    anyway, and report a [`RunOutcome::Degraded`] run.
//! 3. Otherwise the run succeeded.

use courtbatch_core::scheduler::{JobHandle, TaskScheduler};
use serde::{Deserialize, Serialize};

use crate::{Result, RuntimeError, TRACING_TARGET_ARBITER};

/// Final classification of a run whose tasks all provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every task exited with code zero.
    Succeeded,
    /// Some tasks failed; their pids are listed.
    Degraded { failed: Vec<usize> },
}

impl RunOutcome {
    /// Returns `true` if every task succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Pids of failed tasks.
    pub fn failed_pids(&self) -> &[usize] {
        match self {
            Self::Succeeded => &[],
            Self::Degraded { failed } => failed,
        }
    }
}

/// Applies rule 1.
///
/// Cancellation is best-effort: cancel errors are logged and do not change
/// the result. Zero provisioned tasks also counts as a provisioning failure.
pub async fn enforce_provisioning(
    scheduler: &dyn TaskScheduler,
    handles: &[JobHandle],
) -> Result<()> {
    let failed: Vec<usize> = handles
        .iter()
        .filter(|h| !h.is_provisioned())
        .map(|h| h.pid)
        .collect();

    if failed.is_empty() && !handles.is_empty() {
        return Ok(());
    }

    tracing::warn!(
        target: TRACING_TARGET_ARBITER,
        failed = ?failed,
        requested = handles.len(),
        "Tasks failed to provision, cancelling the run"
    );

    for handle in handles {
        let Some(task_id) = &handle.task_id else {
            continue;
        };

        match scheduler.cancel(task_id).await {
            Ok(()) => tracing::info!(
                target: TRACING_TARGET_ARBITER,
                pid = handle.pid,
                task_id = %task_id,
                "Task cancelled"
            ),
            Err(err) => tracing::warn!(
                target: TRACING_TARGET_ARBITER,
                pid = handle.pid,
                task_id = %task_id,
                error = %err,
                "Failed to cancel task"
            ),
        }
    }

    Err(RuntimeError::ProvisioningFailed {
        requested: handles.len(),
        failed,
    })
}

/// Applies rules 2 and 3 to stopped handles.
///
/// A handle that stopped without an exit code counts as failed.
pub fn classify(handles: &[JobHandle]) -> RunOutcome {
    let failed: Vec<usize> = handles
        .iter()
        .filter(|h| !h.succeeded())
        .map(|h| h.pid)
        .collect();

    if failed.is_empty() {
        tracing::info!(
            target: TRACING_TARGET_ARBITER,
            tasks = handles.len(),
            "All tasks succeeded"
        );
        return RunOutcome::Succeeded;
    }

    tracing::warn!(
        target: TRACING_TARGET_ARBITER,
        failed = ?failed,
        "One or more tasks failed"
    );
    RunOutcome::Degraded { failed }
}

#[cfg(test)]
mod tests {
    use courtbatch_core::mock::MockScheduler;
    use courtbatch_core::scheduler::{TaskId, TaskStatus};

    use super::*;

    fn stopped(pid: usize, code: Option<i32>) -> JobHandle {
        let id = TaskId::new(format!("t-{pid}"));
        let mut handle = JobHandle::provisioned(pid, id.clone());
        handle.observe(&TaskStatus::stopped(id, code));
        handle
    }

    #[tokio::test]
    async fn unprovisioned_task_cancels_siblings() {
        let scheduler = MockScheduler::new().with_failed_launch(1);
        let handles = crate::submit(
            &scheduler,
            &courtbatch_core::RunConfig::new(courtbatch_core::Flavor::CourtSummary, "in.json"),
            "out",
            3,
        )
        .await
        .unwrap();

        let err = enforce_provisioning(&scheduler, &handles).await.unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::ProvisioningFailed { requested: 3, ref failed } if failed == &[1]
        ));
        assert_eq!(
            scheduler.cancelled(),
            vec![MockScheduler::task_id(0), MockScheduler::task_id(2)]
        );
    }

    #[tokio::test]
    async fn cancel_errors_are_tolerated() {
        let scheduler = MockScheduler::new();
        let handles = vec![
            JobHandle::provisioned(0, TaskId::from("never-launched")),
            JobHandle::unprovisioned(1),
        ];

        let err = enforce_provisioning(&scheduler, &handles).await.unwrap_err();
        assert!(matches!(err, RuntimeError::ProvisioningFailed { .. }));
        assert!(scheduler.cancelled().is_empty());
    }

    #[tokio::test]
    async fn zero_provisioned_is_a_provisioning_failure() {
        let scheduler = MockScheduler::new();
        let handles = vec![JobHandle::unprovisioned(0), JobHandle::unprovisioned(1)];

        let err = enforce_provisioning(&scheduler, &handles).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ProvisioningFailed { ref failed, .. } if failed == &[0, 1]
        ));
    }

    #[tokio::test]
    async fn all_provisioned_passes() {
        let scheduler = MockScheduler::new();
        let handles = vec![JobHandle::provisioned(0, TaskId::from("a"))];

        enforce_provisioning(&scheduler, &handles).await.unwrap();
        assert!(scheduler.cancelled().is_empty());
    }

    #[test]
    fn classify_success_and_degraded() {
        assert_eq!(
            classify(&[stopped(0, Some(0)), stopped(1, Some(0))]),
            RunOutcome::Succeeded
        );

        let outcome = classify(&[stopped(0, Some(0)), stopped(1, Some(2)), stopped(2, None)]);
        assert_eq!(outcome.failed_pids(), &[1, 2]);
        assert!(!outcome.is_success());
    }
}
