//! Run-level error taxonomy.

use std::borrow::Cow;

use courtbatch_core::BoxedError;
use courtbatch_core::scheduler::SchedulerError;
use courtbatch_core::scrape::ScrapeError;
use courtbatch_opendal::StorageError;

/// Result type for runtime operations.
pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;

/// Errors that end or degrade a run.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// At least one task never started; the provisioned ones were cancelled.
    #[error("tasks for pids {failed:?} failed to provision ({requested} requested)")]
    ProvisioningFailed {
        /// Number of launches attempted.
        requested: usize,
        /// Pids without a task id.
        failed: Vec<usize>,
    },

    /// Some workers exited non-zero. Outputs were still combined.
    #[error("{} worker task(s) failed: pids {failed:?}", .failed.len())]
    WorkerExecutionFailed {
        /// Pids that stopped without exit code zero.
        failed: Vec<usize>,
    },

    /// Tasks were still running after the last poll. They are left running.
    #[error("tasks for pids {pending:?} still running after {attempts} poll attempts")]
    WaitTimeoutExceeded {
        /// Poll rounds performed.
        attempts: usize,
        /// Pids that had not stopped.
        pending: Vec<usize>,
    },

    /// The chunk directory to combine does not exist.
    #[error("output directory does not exist: '{0}'")]
    MissingOutputDirectory(String),

    /// No chunk file of a required kind was found.
    #[error("no chunk files matching '{pattern}' in '{dir}'")]
    NoChunkFilesFound {
        /// Directory searched.
        dir: String,
        /// Expected file name pattern.
        pattern: String,
    },

    /// A chunk file could not be read or parsed.
    #[error("malformed chunk file '{path}': {message}")]
    MalformedChunkFile {
        path: String,
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxedError>,
    },

    #[error(transparent)]
    Core(#[from] courtbatch_core::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl RuntimeError {
    /// Creates a malformed chunk error.
    pub fn malformed_chunk(path: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedChunkFile {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a malformed chunk error with a source.
    pub fn malformed_chunk_with_source(
        path: impl Into<String>,
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedChunkFile {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` for the degraded-run case, where outputs were combined
    /// but some workers failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::WorkerExecutionFailed { .. })
    }
}
