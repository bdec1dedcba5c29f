//! Scraper delegating each record to an external program.
//!
//! The program receives one JSON request on stdin:
//!
//! ```json
//! {"flavor": "portal", "record": "CP-51-CR-0000001-2024", "options": {...}}
//! ```
//!
//! and must print the scraped value as JSON on stdout and exit with code
//! zero. Any other exit code fails the record with the program's stderr.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use courtbatch_core::scrape::{ScrapeError, ScrapeOptions, Scraper};
use courtbatch_core::{Flavor, Record};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::TRACING_TARGET_PROCESS;

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    flavor: Flavor,
    record: &'a Record,
    options: &'a ScrapeOptions,
}

/// Runs `<program> <args...>` once per record.
#[derive(Debug, Clone)]
pub struct CommandScraper {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandScraper {
    /// Creates a scraper running `program` without extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Sets the arguments passed before the request is written.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kills the program when a record takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait::async_trait]
impl Scraper for CommandScraper {
    async fn scrape(&self, record: &Record, options: &ScrapeOptions) -> Result<Value, ScrapeError> {
        let request = ScrapeRequest {
            flavor: options.flavor,
            record,
            options,
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ScrapeError::new(record, "failed to encode request").with_source(e))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScrapeError::new(
                    record,
                    format!("failed to spawn '{}'", self.program.display()),
                )
                .with_source(e)
            })?;

        let exchange = async move {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(&payload).await.map_err(|e| {
                    ScrapeError::new(record, "failed to write request").with_source(e)
                })?;
            }
            child
                .wait_with_output()
                .await
                .map_err(|e| ScrapeError::new(record, "failed to wait for scraper").with_source(e))
        };

        // Dropping the exchange on timeout kills the child.
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange).await.map_err(|_| {
                ScrapeError::new(record, format!("timed out after {}ms", timeout.as_millis()))
            })?,
            None => exchange.await,
        }?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                target: TRACING_TARGET_PROCESS,
                program = %self.program.display(),
                code = ?output.status.code(),
                "Scraper exited with failure"
            );
            return Err(ScrapeError::new(
                record,
                format!("scraper exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ScrapeError::new(record, "scraper printed invalid JSON").with_source(e))
    }
}
