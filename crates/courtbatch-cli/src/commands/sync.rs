//! `sync-from-remote` and `sync-to-remote`.

use anyhow::Context;
use courtbatch_opendal::{Location, Storage, SyncReport};

use crate::TRACING_TARGET_COMMAND;
use crate::config::SyncArgs;

/// Remote tree into the data directory.
pub async fn download(storage: &Storage, args: &SyncArgs) -> anyhow::Result<()> {
    let source = Location::remote(bucket(storage)?, &args.prefix);
    let dest = local_root(storage);
    let report = storage
        .sync(&source, &dest, args.dry_run)
        .await
        .with_context(|| format!("failed to sync '{source}' into '{dest}'"))?;

    log_report(&report);
    Ok(())
}

/// Local tree into the bucket.
pub async fn upload(storage: &Storage, args: &SyncArgs) -> anyhow::Result<()> {
    let source = local_root(storage).join(&args.prefix);
    let dest = Location::remote(bucket(storage)?, "");
    let report = storage
        .sync(&source, &dest, args.dry_run)
        .await
        .with_context(|| format!("failed to sync '{source}' into '{dest}'"))?;

    log_report(&report);
    Ok(())
}

fn bucket(storage: &Storage) -> anyhow::Result<&str> {
    storage
        .bucket()
        .context("no bucket configured, set --bucket or COURTBATCH_BUCKET")
}

fn local_root(storage: &Storage) -> Location {
    Location::local(storage.local_root().to_string_lossy())
}

fn log_report(report: &SyncReport) {
    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        copied = report.copied_count(),
        skipped = report.skipped,
        dry_run = report.dry_run,
        "Sync finished"
    );
}
