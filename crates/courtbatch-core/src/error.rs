//! Common error type definitions.

use std::borrow::Cow;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Caller errors raised while preparing a run.
///
/// None of these have side effects: they are detected before any task is
/// launched or any file is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested partition index is outside `[0, nprocs)`.
    #[error("invalid partition request: pid {pid} is not in [0, {nprocs})")]
    InvalidPartitionRequest {
        /// Requested process index.
        pid: usize,
        /// Total number of processes.
        nprocs: usize,
    },

    /// The requested sample is larger than the dataset.
    #[error("cannot sample {requested} records from a dataset of {available}")]
    InvalidSampleSize {
        /// Requested sample size.
        requested: usize,
        /// Number of records available.
        available: usize,
    },

    /// The input dataset is missing or could not be decoded.
    #[error("invalid dataset: {message}")]
    InvalidDataset {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxedError>,
    },

    /// The run configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates an invalid dataset error with a message.
    pub fn invalid_dataset(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidDataset {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid dataset error with a message and source.
    pub fn invalid_dataset_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidDataset {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
