//! Scraper interface.
//!
//! Fetching and parsing court data is done by an external collaborator; the
//! worker only needs "record in, JSON value out, or a recoverable error".

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BoxedError, Browser, Flavor, Record, RunConfig, SearchBy};

/// A single record could not be scraped.
///
/// Whether this aborts the chunk is decided by the run's
/// [`ErrorPolicy`](crate::ErrorPolicy).
#[derive(Debug, thiserror::Error)]
#[error("failed to scrape '{record}': {message}")]
pub struct ScrapeError {
    /// Short label of the failing record.
    pub record: String,
    pub message: Cow<'static, str>,
    #[source]
    pub source: Option<BoxedError>,
}

impl ScrapeError {
    /// Creates a scrape error for `record`.
    pub fn new(record: &Record, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            record: label(record),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Returns a short human-readable label for a record.
pub fn label(record: &Record) -> String {
    match record {
        Record::Identifier(id) => id.clone(),
        Record::Structured(map) => Value::Object(map.clone()).to_string(),
    }
}

/// Options handed to the scraper with every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeOptions {
    pub flavor: Flavor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_by: Option<SearchBy>,
    pub browser: Browser,
    /// Download polling interval, in seconds.
    pub interval: u64,
    /// Total download wait, in seconds.
    pub time_limit: u64,
    pub debug: bool,
}

impl From<&RunConfig> for ScrapeOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            flavor: config.flavor,
            search_by: config.search_by,
            browser: config.browser,
            interval: config.interval,
            time_limit: config.time_limit,
            debug: config.debug,
        }
    }
}

/// Scrapes one input record.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the scraped value for `record`.
    async fn scrape(&self, record: &Record, options: &ScrapeOptions) -> Result<Value, ScrapeError>;
}
