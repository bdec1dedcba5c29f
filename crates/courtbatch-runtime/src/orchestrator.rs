//! Run orchestration: submit, arbitrate, wait, pull outputs, combine.

use std::time::Duration;

use courtbatch_core::scheduler::{JobHandle, TaskScheduler};
use courtbatch_core::{Error, OutputLayout, RunConfig};
use courtbatch_opendal::{Location, Storage};
use serde::Serialize;

use crate::arbiter::{RunOutcome, classify, enforce_provisioning};
use crate::combine::{CombinedArtifact, combine};
use crate::layout::{date_tag, resolve_output_folder};
use crate::submit::submit;
use crate::wait::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, wait};
use crate::{Result, RuntimeError, TRACING_TARGET_ORCHESTRATOR};

/// Result of [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunReport {
    /// Tasks were submitted and not waited for.
    Submitted {
        output_folder: String,
        handles: Vec<JobHandle>,
    },
    /// Every task stopped and the outputs were combined.
    Completed {
        output_folder: String,
        handles: Vec<JobHandle>,
        outcome: RunOutcome,
        /// Empty for single-task runs, whose outputs are already unchunked.
        combined: Vec<CombinedArtifact>,
    },
}

impl RunReport {
    /// Returns the run's output folder.
    pub fn output_folder(&self) -> &str {
        match self {
            Self::Submitted { output_folder, .. } | Self::Completed { output_folder, .. } => {
                output_folder
            }
        }
    }

    /// Returns the handles of every submitted task.
    pub fn handles(&self) -> &[JobHandle] {
        match self {
            Self::Submitted { handles, .. } | Self::Completed { handles, .. } => handles,
        }
    }

    /// Turns a degraded run into [`RuntimeError::WorkerExecutionFailed`].
    pub fn into_result(self) -> Result<Self> {
        match &self {
            Self::Completed {
                outcome: RunOutcome::Degraded { failed },
                ..
            } => Err(RuntimeError::WorkerExecutionFailed {
                failed: failed.clone(),
            }),
            _ => Ok(self),
        }
    }
}

/// Drives one run end to end.
///
/// Holds the storage client and the scheduler by reference; both are built
/// once per process.
pub struct Orchestrator<'a> {
    storage: &'a Storage,
    scheduler: &'a dyn TaskScheduler,
    poll_interval: Duration,
    max_attempts: usize,
    remote: bool,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator with the default wait settings.
    pub fn new(storage: &'a Storage, scheduler: &'a dyn TaskScheduler) -> Self {
        Self {
            storage,
            scheduler,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            remote: false,
        }
    }

    /// Sets the pause between poll rounds.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the number of poll rounds before giving up.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Workers run off this machine and exchange data through the bucket.
    ///
    /// Input and output must then be `s3://` locations, and outputs are
    /// synced into the local data directory before combining.
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// Runs `config` across `nprocs` tasks.
    ///
    /// With `wait_for == false` the run ends right after submission. Otherwise
    /// a provisioning failure cancels the run before waiting, and a completed
    /// run is combined even when some tasks failed; inspect
    /// [`RunReport::into_result`] for the final status.
    pub async fn run(&self, config: &RunConfig, nprocs: usize, wait_for: bool) -> Result<RunReport> {
        config.validate()?;
        let output_folder = resolve_output_folder(config, &date_tag())?;
        let input = Location::parse(&config.input)?;
        let output = Location::parse(&output_folder)?;

        if self.remote && !(input.is_remote() && output.is_remote()) {
            return Err(Error::invalid_config(
                "remote runs need s3:// input and output locations",
            )
            .into());
        }

        if !self.storage.exists(&input).await? {
            return Err(Error::invalid_dataset(format!("input '{input}' does not exist")).into());
        }

        tracing::info!(
            target: TRACING_TARGET_ORCHESTRATOR,
            flavor = %config.flavor,
            input = %input,
            output = %output,
            nprocs,
            scheduler = self.scheduler.name(),
            "Starting run"
        );

        let mut handles = submit(self.scheduler, config, &output_folder, nprocs).await?;

        if !wait_for {
            tracing::info!(
                target: TRACING_TARGET_ORCHESTRATOR,
                tasks = handles.len(),
                "Submitted without waiting"
            );
            return Ok(RunReport::Submitted {
                output_folder,
                handles,
            });
        }

        enforce_provisioning(self.scheduler, &handles).await?;
        wait(self.scheduler, &mut handles, self.poll_interval, self.max_attempts).await?;
        let outcome = classify(&handles);

        let combined = self.collect(config, &output, nprocs).await?;

        Ok(RunReport::Completed {
            output_folder,
            handles,
            outcome,
            combined,
        })
    }

    /// Pulls remote outputs and combines the chunks.
    async fn collect(
        &self,
        config: &RunConfig,
        output: &Location,
        nprocs: usize,
    ) -> Result<Vec<CombinedArtifact>> {
        let (backend, folder) = if self.remote {
            let local_root = Location::local(self.storage.local_root().to_string_lossy());
            let report = self.storage.sync(output, &local_root, false).await?;

            tracing::info!(
                target: TRACING_TARGET_ORCHESTRATOR,
                copied = report.copied_count(),
                skipped = report.skipped,
                "Pulled outputs from remote storage"
            );
            (self.storage.local(), output.path().to_owned())
        } else {
            self.storage.resolve(output)?
        };

        if nprocs == 1 {
            tracing::debug!(
                target: TRACING_TARGET_ORCHESTRATOR,
                "Single task run, nothing to combine"
            );
            return Ok(Vec::new());
        }

        let layout = OutputLayout::new(folder, config.flavor);
        combine(backend, config.flavor, &layout.chunks_dir()).await
    }
}
