//! Process-wide storage client.

use std::path::{Component, Path, PathBuf};

use crate::TRACING_TARGET;
use crate::backend::StorageBackend;
use crate::config::{S3Config, StorageConfig};
use crate::error::{StorageError, StorageResult};
use crate::location::Location;
use crate::sync::{SyncDirection, SyncReport, sync_tree};

#[derive(Debug, Clone)]
struct RemoteBucket {
    bucket: String,
    backend: StorageBackend,
}

/// The local data directory plus the optional remote bucket.
///
/// Constructed once per process and passed by reference. Local locations are
/// resolved against the data directory; `s3://` locations against the remote
/// bucket.
#[derive(Debug, Clone)]
pub struct Storage {
    local: StorageBackend,
    local_root: PathBuf,
    remote: Option<RemoteBucket>,
}

impl Storage {
    /// Creates a storage client rooted at the local data directory.
    pub async fn new(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let local_root = data_dir.into();
        let root = local_root.to_string_lossy().into_owned();
        let local = StorageBackend::new(StorageConfig::fs(root)).await?;

        Ok(Self::from_backends(local_root, local))
    }

    /// Creates a storage client from an existing local backend.
    pub fn from_backends(local_root: impl Into<PathBuf>, local: StorageBackend) -> Self {
        Self {
            local,
            local_root: local_root.into(),
            remote: None,
        }
    }

    /// Configures the remote S3 bucket.
    pub async fn with_s3(self, config: S3Config) -> StorageResult<Self> {
        let bucket = config.bucket.clone();
        let backend = StorageBackend::new(StorageConfig::S3(config)).await?;
        Ok(self.with_remote_backend(bucket, backend))
    }

    /// Uses `backend` for `s3://<bucket>/...` locations.
    pub fn with_remote_backend(mut self, bucket: impl Into<String>, backend: StorageBackend) -> Self {
        let bucket = bucket.into();

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            backend = backend.backend_name(),
            "Remote storage attached"
        );

        self.remote = Some(RemoteBucket { bucket, backend });
        self
    }

    /// The local backend.
    pub fn local(&self) -> &StorageBackend {
        &self.local
    }

    /// The local data directory.
    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    /// The remote backend, if configured.
    pub fn remote(&self) -> Option<&StorageBackend> {
        self.remote.as_ref().map(|r| &r.backend)
    }

    /// The remote bucket name, if configured.
    pub fn bucket(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.bucket.as_str())
    }

    /// Maps a location to its backend and a key relative to that backend's root.
    pub fn resolve(&self, location: &Location) -> StorageResult<(&StorageBackend, String)> {
        match location {
            Location::Remote { bucket, key } => {
                let remote = self
                    .remote
                    .as_ref()
                    .ok_or_else(|| StorageError::RemoteNotConfigured(location.to_string()))?;

                if remote.bucket != *bucket {
                    return Err(StorageError::invalid_path(format!(
                        "bucket '{bucket}' does not match configured bucket '{}'",
                        remote.bucket
                    )));
                }

                Ok((&remote.backend, key.clone()))
            }
            Location::Local { path } => Ok((&self.local, self.local_key(path)?)),
        }
    }

    /// Reads a file at a location.
    pub async fn read(&self, location: &Location) -> StorageResult<Vec<u8>> {
        let (backend, key) = self.resolve(location)?;
        backend.read(&key).await
    }

    /// Writes a file at a location.
    pub async fn write(&self, location: &Location, data: &[u8]) -> StorageResult<()> {
        let (backend, key) = self.resolve(location)?;
        backend.write(&key, data).await
    }

    /// Checks whether a file exists at a location.
    pub async fn exists(&self, location: &Location) -> StorageResult<bool> {
        let (backend, key) = self.resolve(location)?;
        backend.exists(&key).await
    }

    /// Syncs `source` into `dest`. Exactly one of them must be remote.
    pub async fn sync(
        &self,
        source: &Location,
        dest: &Location,
        dry_run: bool,
    ) -> StorageResult<SyncReport> {
        let direction = SyncDirection::resolve(source, dest)?;
        let (source_backend, source_key) = self.resolve(source)?;
        let (dest_backend, dest_key) = self.resolve(dest)?;

        tracing::info!(
            target: TRACING_TARGET,
            direction = ?direction,
            source = %source,
            dest = %dest,
            dry_run,
            "Starting sync"
        );

        sync_tree(source_backend, &source_key, dest_backend, &dest_key, dry_run).await
    }

    /// Turns a local path into a key under the data directory.
    ///
    /// Paths starting with the data directory have it stripped; other relative
    /// paths are taken as already relative to it. Absolute paths outside the
    /// data directory and `..` segments are rejected.
    fn local_key(&self, path: &str) -> StorageResult<String> {
        let path = normalize(Path::new(path))?;
        let root = normalize(&self.local_root)?;

        let relative = match path.strip_prefix(&root) {
            Ok(rest) => rest.to_path_buf(),
            Err(_) if path.is_absolute() => {
                return Err(StorageError::invalid_path(format!(
                    "'{}' is outside the data directory '{}'",
                    path.display(),
                    self.local_root.display()
                )));
            }
            Err(_) => path,
        };

        let segments: Vec<_> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(segments.join("/"))
    }
}

fn normalize(path: &Path) -> StorageResult<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(StorageError::invalid_path(format!(
                    "'{}' must not contain '..'",
                    path.display()
                )));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
