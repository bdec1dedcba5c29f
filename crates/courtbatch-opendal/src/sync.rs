//! One-way, timestamp-based, non-destructive sync between two backends.

use crate::TRACING_TARGET_SYNC;
use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::location::Location;

/// Which way a sync moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Remote source, local destination.
    Download,
    /// Local source, remote destination.
    Upload,
}

impl SyncDirection {
    /// Determines the direction from the two endpoints.
    ///
    /// Exactly one side must be remote.
    pub fn resolve(source: &Location, dest: &Location) -> StorageResult<Self> {
        match (source.is_remote(), dest.is_remote()) {
            (true, false) => Ok(Self::Download),
            (false, true) => Ok(Self::Upload),
            _ => Err(StorageError::AmbiguousSyncDirection {
                source_location: source.to_string(),
                dest: dest.to_string(),
            }),
        }
    }
}

/// Outcome of a sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Destination keys that were copied, or would be under a dry run.
    pub copied: Vec<String>,
    /// Number of objects already up to date at the destination.
    pub skipped: usize,
    pub dry_run: bool,
}

impl SyncReport {
    /// Number of copied objects.
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }
}

/// Copies every file under `source_prefix` on `source` to `dest`.
///
/// Each file's key, relative to the source backend root, is joined onto
/// `dest_prefix`. A file is copied when it is missing at the destination or
/// strictly newer there than the destination copy; when either modification
/// time is unknown it is copied. Nothing at the destination is ever deleted.
/// Under `dry_run` the copy set is logged and reported but nothing moves.
pub async fn sync_tree(
    source: &StorageBackend,
    source_prefix: &str,
    dest: &StorageBackend,
    dest_prefix: &str,
    dry_run: bool,
) -> StorageResult<SyncReport> {
    let files = source.find(source_prefix).await?;

    tracing::debug!(
        target: TRACING_TARGET_SYNC,
        source = source.backend_name(),
        prefix = %source_prefix,
        count = files.len(),
        "Found files to consider"
    );

    let mut report = SyncReport {
        dry_run,
        ..SyncReport::default()
    };

    for file in files {
        let dest_key = join_key(dest_prefix, &file);

        if !is_outdated(source, &file, dest, &dest_key).await? {
            report.skipped += 1;
            continue;
        }

        tracing::info!(
            target: TRACING_TARGET_SYNC,
            from = %file,
            to = %dest_key,
            dry_run,
            "Syncing file"
        );

        if !dry_run {
            let data = source.read(&file).await?;
            dest.write(&dest_key, &data).await?;
        }

        report.copied.push(dest_key);
    }

    tracing::info!(
        target: TRACING_TARGET_SYNC,
        copied = report.copied.len(),
        skipped = report.skipped,
        dry_run,
        "Sync complete"
    );

    Ok(report)
}

async fn is_outdated(
    source: &StorageBackend,
    source_key: &str,
    dest: &StorageBackend,
    dest_key: &str,
) -> StorageResult<bool> {
    let dest_meta = match dest.stat(dest_key).await {
        Ok(meta) => meta,
        Err(err) if err.is_not_found() => return Ok(true),
        Err(err) => return Err(err),
    };

    let source_meta = source.stat(source_key).await?;
    Ok(match (source_meta.last_modified, dest_meta.last_modified) {
        (Some(src), Some(dst)) => src > dst,
        _ => true,
    })
}

fn join_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}/{key}")
    }
}
