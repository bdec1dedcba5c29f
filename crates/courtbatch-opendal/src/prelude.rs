//! Prelude module for convenient imports.

pub use crate::backend::{FileMetadata, StorageBackend};
pub use crate::config::{S3Config, StorageConfig};
pub use crate::error::{StorageError, StorageResult};
pub use crate::location::Location;
pub use crate::storage::Storage;
