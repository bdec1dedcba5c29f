//! Task scheduler options.

use std::time::Duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use courtbatch_core::scheduler::TaskScheduler;
use courtbatch_runpod::{RunpodClient, RunpodConfig};
use courtbatch_runtime::LocalScheduler;
use courtbatch_runtime::wait::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};

/// Where worker tasks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulerKind {
    /// Child processes of this executable.
    Local,
    /// A RunPod serverless endpoint.
    Runpod,
}

/// Scheduler selection, credentials and wait settings.
#[derive(Debug, Clone, Args)]
pub struct SchedulerArgs {
    /// Scheduler for orchestrated runs; `runpod` for `--remote`, `local` otherwise.
    #[arg(long, env = "COURTBATCH_SCHEDULER", value_enum)]
    pub scheduler: Option<SchedulerKind>,

    #[arg(long, env = "RUNPOD_ENDPOINT_ID")]
    pub runpod_endpoint_id: Option<String>,

    #[arg(long, env = "RUNPOD_API_KEY", hide_env_values = true)]
    pub runpod_api_key: Option<String>,

    /// Overrides the RunPod API base URL.
    #[arg(long, env = "RUNPOD_BASE_URL")]
    pub runpod_base_url: Option<String>,

    /// RunPod request timeout in seconds.
    #[arg(long, env = "RUNPOD_TIMEOUT", default_value_t = 30)]
    pub runpod_timeout: u64,

    /// Seconds between task status polls.
    #[arg(long, env = "COURTBATCH_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub poll_interval: u64,

    /// Poll rounds before giving up on running tasks.
    #[arg(long, env = "COURTBATCH_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
}

impl SchedulerArgs {
    /// Returns the scheduler kind, defaulting on whether the run is remote.
    pub fn kind(&self, remote: bool) -> SchedulerKind {
        self.scheduler.unwrap_or(if remote {
            SchedulerKind::Runpod
        } else {
            SchedulerKind::Local
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Builds the scheduler.
    ///
    /// `worker_prefix` is placed before each local worker's arguments.
    pub fn build(
        &self,
        remote: bool,
        worker_prefix: Vec<String>,
    ) -> anyhow::Result<Box<dyn TaskScheduler>> {
        match self.kind(remote) {
            SchedulerKind::Local => {
                let scheduler = LocalScheduler::current_exe()
                    .context("failed to locate the current executable")?
                    .with_args(worker_prefix);
                Ok(Box::new(scheduler))
            }
            SchedulerKind::Runpod => {
                let endpoint_id = self
                    .runpod_endpoint_id
                    .as_deref()
                    .context("--runpod-endpoint-id is required for the runpod scheduler")?;
                let api_key = self
                    .runpod_api_key
                    .as_deref()
                    .context("--runpod-api-key is required for the runpod scheduler")?;

                let mut config = RunpodConfig::new(endpoint_id, api_key)
                    .context("invalid RunPod configuration")?
                    .with_timeout(Duration::from_secs(self.runpod_timeout));
                if let Some(base_url) = &self.runpod_base_url {
                    config = config
                        .with_base_url(base_url)
                        .context("invalid RunPod base URL")?;
                }

                let client = RunpodClient::new(config).context("failed to create RunPod client")?;
                Ok(Box::new(client))
            }
        }
    }
}
