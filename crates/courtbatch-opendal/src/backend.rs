//! Storage backend implementation.

use futures::TryStreamExt;
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Unified storage backend that wraps an OpenDAL operator.
///
/// Paths are relative to the backend root (the data directory for the
/// filesystem backend, the bucket for S3).
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            root = %config.root(),
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.config.backend_name()
    }

    /// Reads a file from storage.
    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Reading file"
        );

        let data = self.operator.read(path).await?.to_vec();

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "File read complete"
        );

        Ok(data)
    }

    /// Writes data to a file in storage, creating parent directories as needed.
    pub async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Writing file"
        );

        self.operator.write(path, data.to_vec()).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "File write complete"
        );

        Ok(())
    }

    /// Checks if a file exists.
    pub async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(path).await?)
    }

    /// Checks if a directory exists, either as an explicit entry or because
    /// some file lives under it.
    pub async fn dir_exists(&self, path: &str) -> StorageResult<bool> {
        let dir = dir_path(path);
        if self.operator.exists(&dir).await? {
            return Ok(true);
        }

        Ok(!self.list(path).await?.is_empty())
    }

    /// Gets metadata for a file.
    pub async fn stat(&self, path: &str) -> StorageResult<FileMetadata> {
        let meta = self.operator.stat(path).await?;

        let last_modified = meta.last_modified().and_then(|dt| {
            jiff::Timestamp::new(dt.timestamp(), dt.timestamp_subsec_nanos() as i32).ok()
        });

        Ok(FileMetadata {
            size: meta.content_length(),
            last_modified,
            is_dir: meta.is_dir(),
        })
    }

    /// Lists the files directly inside a directory.
    ///
    /// Returned paths are relative to the backend root. A missing directory
    /// lists as empty.
    pub async fn list(&self, path: &str) -> StorageResult<Vec<String>> {
        self.list_files(path, false).await
    }

    /// Lists every file below a directory.
    pub async fn list_recursive(&self, path: &str) -> StorageResult<Vec<String>> {
        self.list_files(path, true).await
    }

    /// Resolves a prefix to the files it names: the file itself when the
    /// prefix is a file, otherwise everything below it.
    pub async fn find(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let trimmed = prefix.trim_matches('/');
        if !trimmed.is_empty() {
            match self.stat(trimmed).await {
                Ok(meta) if !meta.is_dir => return Ok(vec![trimmed.to_owned()]),
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        self.list_recursive(trimmed).await
    }

    async fn list_files(&self, path: &str, recursive: bool) -> StorageResult<Vec<String>> {
        let dir = dir_path(path);

        let entries = match self.operator.lister_with(&dir).recursive(recursive).await {
            Ok(lister) => lister.try_collect::<Vec<_>>().await,
            Err(err) => Err(err),
        };

        let entries = match entries {
            Ok(entries) => entries,
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let mut files: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.path().trim_start_matches('/').to_owned())
            .filter(|path| !path.is_empty() && !path.ends_with('/'))
            .collect();
        files.sort();

        tracing::trace!(
            target: TRACING_TARGET,
            dir = %dir,
            recursive,
            count = files.len(),
            "Listed files"
        );

        Ok(files)
    }

    /// Creates an OpenDAL operator based on configuration.
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config {
            StorageConfig::Fs { root } => {
                let builder = services::Fs::default().root(root);

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            StorageConfig::Memory => Operator::new(services::Memory::default())
                .map(|op| op.finish())
                .map_err(|e| StorageError::init(e.to_string())),

            #[cfg(feature = "s3")]
            StorageConfig::S3(s3) => {
                let mut builder = services::S3::default()
                    .bucket(&s3.bucket)
                    .region(&s3.region);

                if let Some(ref prefix) = s3.prefix {
                    builder = builder.root(prefix);
                }

                if let Some(ref endpoint) = s3.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                if let Some(ref access_key_id) = s3.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = s3.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(not(feature = "s3"))]
            StorageConfig::S3(_) => Err(StorageError::init(
                "S3 backend is not supported without the `s3` feature",
            )),
        }
    }
}

/// Turns a path into the directory form OpenDAL lists: `/` for the root,
/// otherwise a single trailing slash.
fn dir_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("{trimmed}/")
    }
}

/// File metadata.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<jiff::Timestamp>,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend", &self.config.backend_name())
            .field("root", &self.config.root())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fs_backend() -> (tempfile::TempDir, StorageBackend) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let backend = StorageBackend::new(StorageConfig::fs(root)).await.unwrap();
        (dir, backend)
    }

    #[test]
    fn dir_path_normalises_slashes() {
        assert_eq!(dir_path(""), "/");
        assert_eq!(dir_path("/"), "/");
        assert_eq!(dir_path("a/b"), "a/b/");
        assert_eq!(dir_path("/a/b/"), "a/b/");
    }

    #[tokio::test]
    async fn write_then_read() {
        let (_dir, backend) = fs_backend().await;

        backend.write("results/a/chunks/portal_0.json", b"[1]").await.unwrap();

        assert_eq!(backend.read("results/a/chunks/portal_0.json").await.unwrap(), b"[1]");
        assert!(backend.exists("results/a/chunks/portal_0.json").await.unwrap());
        assert!(!backend.exists("results/a/chunks/portal_1.json").await.unwrap());
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let (_dir, backend) = fs_backend().await;

        let err = backend.read("nope.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_is_flat_and_recursive_is_not() {
        let (_dir, backend) = fs_backend().await;
        backend.write("out/portal.json", b"[]").await.unwrap();
        backend.write("out/chunks/portal_0.json", b"[]").await.unwrap();
        backend.write("out/chunks/portal_1.json", b"[]").await.unwrap();

        let flat = backend.list("out").await.unwrap();
        assert_eq!(flat, vec!["out/portal.json".to_owned()]);

        let deep = backend.list_recursive("out").await.unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&"out/chunks/portal_1.json".to_owned()));
    }

    #[tokio::test]
    async fn missing_directory_lists_empty() {
        let (_dir, backend) = fs_backend().await;

        assert!(backend.list("nowhere").await.unwrap().is_empty());
        assert!(!backend.dir_exists("nowhere").await.unwrap());
    }

    #[tokio::test]
    async fn find_resolves_files_and_directories() {
        let (_dir, backend) = fs_backend().await;
        backend.write("out/a.json", b"[]").await.unwrap();
        backend.write("out/sub/b.json", b"[]").await.unwrap();

        assert_eq!(backend.find("out/a.json").await.unwrap(), vec!["out/a.json"]);
        assert_eq!(backend.find("out").await.unwrap().len(), 2);
        assert!(backend.find("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stat_reports_size_and_mtime() {
        let (_dir, backend) = fs_backend().await;
        backend.write("f.csv", b"1,2\n").await.unwrap();

        let meta = backend.stat("f.csv").await.unwrap();
        assert_eq!(meta.size, 4);
        assert!(!meta.is_dir);
        assert!(meta.last_modified.is_some());
    }
}
