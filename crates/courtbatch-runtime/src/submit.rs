//! Job submission.

use courtbatch_core::scheduler::{JobHandle, LaunchRequest, TaskScheduler};
use courtbatch_core::{Error, RunConfig};

use crate::{Result, TRACING_TARGET_SUBMIT};

/// Launches one worker task per `pid` in `0..nprocs`.
///
/// Launches run one after another. A failed launch is logged and recorded as
/// a handle without a task id; the remaining pids are still launched. The
/// returned handles are in `pid` order and all `Pending`.
pub async fn submit(
    scheduler: &dyn TaskScheduler,
    config: &RunConfig,
    output_folder: &str,
    nprocs: usize,
) -> Result<Vec<JobHandle>> {
    if nprocs == 0 {
        return Err(Error::invalid_config("number of tasks must be at least 1").into());
    }

    let mut handles = Vec::with_capacity(nprocs);
    for pid in 0..nprocs {
        tracing::info!(
            target: TRACING_TARGET_SUBMIT,
            pid,
            nprocs,
            scheduler = scheduler.name(),
            "Submitting task"
        );

        let request = LaunchRequest {
            pid,
            nprocs,
            args: config.worker_args(output_folder, pid, nprocs),
        };

        match scheduler.launch(&request).await {
            Ok(task_id) => {
                tracing::debug!(
                    target: TRACING_TARGET_SUBMIT,
                    pid,
                    task_id = %task_id,
                    "Task accepted"
                );
                handles.push(JobHandle::provisioned(pid, task_id));
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_SUBMIT,
                    pid,
                    error = %err,
                    "Task failed to provision"
                );
                handles.push(JobHandle::unprovisioned(pid));
            }
        }
    }

    Ok(handles)
}
