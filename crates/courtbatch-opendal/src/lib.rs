#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod location;
mod storage;
mod sync;

#[doc(hidden)]
pub mod prelude;

pub use backend::{FileMetadata, StorageBackend};
pub use config::{S3Config, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use location::{Location, REMOTE_SCHEME};
pub use storage::Storage;
pub use sync::{SyncDirection, SyncReport, sync_tree};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "courtbatch_opendal";

/// Tracing target for sync operations.
pub const TRACING_TARGET_SYNC: &str = "courtbatch_opendal::sync";
