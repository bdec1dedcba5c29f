//! Chunk worker.
//!
//! One worker loads the dataset, takes its partition, scrapes every record
//! and writes the chunk's artifacts under the run's output folder.

use courtbatch_core::dataset::encode_rows;
use courtbatch_core::job::ArtifactKind;
use courtbatch_core::scrape::{ScrapeOptions, Scraper};
use courtbatch_core::{Dataset, Error, ErrorPolicy, OutputLayout, RunConfig, partition, sample};
use courtbatch_opendal::{Location, Storage};
use serde::Serialize;
use serde_json::Value;

use crate::{Result, TRACING_TARGET_WORKER};

/// Outcome of one worker's chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    pub pid: usize,
    pub nprocs: usize,
    /// Records in the chunk.
    pub records: usize,
    /// Records scraped successfully.
    pub scraped: usize,
    /// Records that failed and were skipped.
    pub failed: usize,
    /// Locations written, in write order.
    pub written: Vec<String>,
    /// The chunk had no records; nothing was scraped or written.
    pub skipped_empty: bool,
}

/// Runs worker `pid` of `nprocs` for `config`.
///
/// Outputs land in `output_folder`, under `chunks/` when `nprocs > 1` and
/// directly in the folder otherwise. A dry run scrapes but writes nothing.
///
/// # Errors
///
/// Fails on an invalid configuration or partition request, a missing or
/// undecodable input, storage errors, and the first scrape error under
/// [`ErrorPolicy::Raise`].
pub async fn run_chunk(
    storage: &Storage,
    scraper: &dyn Scraper,
    config: &RunConfig,
    output_folder: &str,
    nprocs: usize,
    pid: usize,
) -> Result<ChunkReport> {
    config.validate()?;

    let input = Location::parse(&config.input)?;
    if !storage.exists(&input).await? {
        return Err(Error::invalid_dataset(format!("input '{input}' does not exist")).into());
    }

    let bytes = storage.read(&input).await?;
    let mut dataset = Dataset::decode(config.flavor, input.path(), &bytes)?;
    if let Some(k) = config.sample {
        dataset = sample(&dataset, k, config.seed)?;
    }

    let part = partition(&dataset, nprocs, pid)?;
    let mut report = ChunkReport {
        pid,
        nprocs,
        records: part.len(),
        ..ChunkReport::default()
    };

    if part.is_empty() {
        tracing::info!(
            target: TRACING_TARGET_WORKER,
            pid,
            nprocs,
            "Chunk is empty, nothing to scrape"
        );
        report.skipped_empty = true;
        return Ok(report);
    }

    tracing::info!(
        target: TRACING_TARGET_WORKER,
        pid,
        nprocs,
        records = part.len(),
        flavor = %config.flavor,
        "Scraping chunk"
    );

    let options = ScrapeOptions::from(config);
    let sleep = config.sleep_duration();
    let total = part.len();
    let mut results: Vec<Value> = Vec::with_capacity(total);

    for (index, record) in part.records().iter().enumerate() {
        match scraper.scrape(record, &options).await {
            Ok(value) => {
                results.push(value);
                report.scraped += 1;
            }
            Err(err) if config.errors == ErrorPolicy::Ignore => {
                tracing::warn!(
                    target: TRACING_TARGET_WORKER,
                    pid,
                    record = %err.record,
                    error = %err,
                    "Skipping record"
                );
                report.failed += 1;
            }
            Err(err) => return Err(err.into()),
        }

        let done = index + 1;
        if done % config.log_freq == 0 || done == total {
            tracing::info!(
                target: TRACING_TARGET_WORKER,
                pid,
                done,
                total,
                failed = report.failed,
                "Progress"
            );
        }

        if done < total && !sleep.is_zero() {
            tokio::time::sleep(sleep).await;
        }
    }

    if config.dry_run {
        tracing::info!(
            target: TRACING_TARGET_WORKER,
            pid,
            scraped = report.scraped,
            "Dry run, not saving outputs"
        );
        return Ok(report);
    }

    let layout = OutputLayout::new(output_folder, config.flavor);
    let chunk = part.chunk_index();

    let results_path = layout.artifact(ArtifactKind::Results, chunk);
    let results_bytes = serde_json::to_vec(&results).map_err(Error::from)?;
    write(storage, &results_path, &results_bytes).await?;
    report.written.push(results_path);

    let input_path = layout.artifact(ArtifactKind::EchoedInput, chunk);
    let input_bytes = encode_rows(part.records().iter().map(|r| r.to_csv_fields()))?;
    write(storage, &input_path, &input_bytes).await?;
    report.written.push(input_path);

    let config_path = layout.config_file(chunk);
    let echoed = RunConfig {
        output_folder: Some(output_folder.to_owned()),
        ..config.clone()
    };
    let config_bytes = serde_json::to_vec_pretty(&echoed).map_err(Error::from)?;
    write(storage, &config_path, &config_bytes).await?;
    report.written.push(config_path);

    tracing::info!(
        target: TRACING_TARGET_WORKER,
        pid,
        scraped = report.scraped,
        failed = report.failed,
        folder = %output_folder,
        "Saved chunk outputs"
    );

    Ok(report)
}

async fn write(storage: &Storage, path: &str, bytes: &[u8]) -> Result<()> {
    storage.write(&Location::parse(path)?, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use courtbatch_core::mock::MockScraper;
    use courtbatch_core::{Flavor, SearchBy};
    use serde_json::json;

    use super::*;
    use crate::RuntimeError;

    async fn storage_with_ids(ids: &[&str]) -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let body = ids.iter().map(|id| format!("{id}\n")).collect::<String>();
        storage
            .write(&Location::local("inputs/ids.csv"), body.as_bytes())
            .await
            .unwrap();
        (dir, storage)
    }

    fn config() -> RunConfig {
        RunConfig::new(Flavor::Portal, "inputs/ids.csv")
            .with_search_by(SearchBy::DocketNumber)
            .with_sleep(0)
    }

    async fn read_json(storage: &Storage, path: &str) -> Value {
        let bytes = storage.read(&Location::local(path)).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn writes_chunk_artifacts() {
        let (_dir, storage) = storage_with_ids(&["1", "2", "3", "4", "5"]).await;
        let scraper = MockScraper::new();

        let report = run_chunk(&storage, &scraper, &config(), "out", 2, 1).await.unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.scraped, 2);
        assert_eq!(
            report.written,
            vec![
                "out/chunks/portal_1.json",
                "out/chunks/portal_input_1.csv",
                "out/chunks/config_1.json"
            ]
        );

        assert_eq!(
            read_json(&storage, "out/chunks/portal_1.json").await,
            json!([{"id": 4, "value": "ok"}, {"id": 5, "value": "ok"}])
        );
        let echoed = storage
            .read(&Location::local("out/chunks/portal_input_1.csv"))
            .await
            .unwrap();
        assert_eq!(echoed, b"4\n5\n");

        let persisted = read_json(&storage, "out/chunks/config_1.json").await;
        assert_eq!(persisted["output_folder"], json!("out"));
        assert_eq!(persisted["flavor"], json!("portal"));
    }

    #[tokio::test]
    async fn single_process_writes_unchunked_paths() {
        let (_dir, storage) = storage_with_ids(&["1", "2"]).await;

        let report = run_chunk(&storage, &MockScraper::new(), &config(), "out", 1, 0)
            .await
            .unwrap();

        assert_eq!(report.written[0], "out/portal.json");
        assert_eq!(report.written[2], "out/config.json");
    }

    #[tokio::test]
    async fn ignore_policy_skips_failed_records() {
        let (_dir, storage) = storage_with_ids(&["1", "2", "3"]).await;
        let scraper = MockScraper::new().fail_on("2");

        let report = run_chunk(&storage, &scraper, &config(), "out", 1, 0).await.unwrap();

        assert_eq!(report.scraped, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            read_json(&storage, "out/portal.json").await,
            json!([{"id": 1, "value": "ok"}, {"id": 3, "value": "ok"}])
        );
    }

    #[tokio::test]
    async fn raise_policy_aborts_without_writing() {
        let (_dir, storage) = storage_with_ids(&["1", "2", "3"]).await;
        let scraper = MockScraper::new().fail_on("2");
        let config = config().with_errors(ErrorPolicy::Raise);

        let err = run_chunk(&storage, &scraper, &config, "out", 1, 0).await.unwrap_err();

        assert!(matches!(err, RuntimeError::Scrape(_)));
        assert_eq!(scraper.calls(), 2);
        assert!(!storage.exists(&Location::local("out/portal.json")).await.unwrap());
    }

    #[tokio::test]
    async fn empty_chunk_is_skipped() {
        let (_dir, storage) = storage_with_ids(&["1"]).await;
        let scraper = MockScraper::new();

        let report = run_chunk(&storage, &scraper, &config(), "out", 3, 2).await.unwrap();

        assert!(report.skipped_empty);
        assert!(report.written.is_empty());
        assert_eq!(scraper.calls(), 0);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let (_dir, storage) = storage_with_ids(&["1", "2"]).await;
        let mut config = config();
        config.dry_run = true;

        let report = run_chunk(&storage, &MockScraper::new(), &config, "out", 1, 0)
            .await
            .unwrap();

        assert_eq!(report.scraped, 2);
        assert!(report.written.is_empty());
        assert!(!storage.exists(&Location::local("out/portal.json")).await.unwrap());
    }

    #[tokio::test]
    async fn sample_is_drawn_before_partitioning() {
        let (_dir, storage) = storage_with_ids(&["1", "2", "3", "4", "5", "6"]).await;
        let config = config().with_sample(4, 7);

        let first = run_chunk(&storage, &MockScraper::new(), &config, "out", 2, 0).await.unwrap();
        let second = run_chunk(&storage, &MockScraper::new(), &config, "out", 2, 1).await.unwrap();

        assert_eq!(first.records + second.records, 4);
    }

    #[tokio::test]
    async fn missing_input_is_invalid_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();

        let err = run_chunk(&storage, &MockScraper::new(), &config(), "out", 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Core(Error::InvalidDataset { .. })));
    }

    #[tokio::test]
    async fn out_of_range_pid_is_rejected() {
        let (_dir, storage) = storage_with_ids(&["1"]).await;

        let err = run_chunk(&storage, &MockScraper::new(), &config(), "out", 2, 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Core(Error::InvalidPartitionRequest { pid: 2, nprocs: 2 })
        ));
    }
}
