//! Mock scraper.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use crate::Record;
use crate::scrape::{ScrapeError, ScrapeOptions, Scraper, label};

/// Scraper returning `{"id": <record>, "value": "ok"}` for every record.
///
/// Records whose label was registered with [`fail_on`](Self::fail_on) fail
/// with a [`ScrapeError`].
#[derive(Debug, Default)]
pub struct MockScraper {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MockScraper {
    /// Creates a scraper that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the record with this label fail.
    pub fn fail_on(mut self, record: impl Into<String>) -> Self {
        self.failing.insert(record.into());
        self
    }

    /// Number of records scraped so far, failures included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Scraper for MockScraper {
    async fn scrape(&self, record: &Record, _options: &ScrapeOptions) -> Result<Value, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&label(record)) {
            return Err(ScrapeError::new(record, "scripted failure"));
        }

        let id = match record {
            Record::Identifier(id) => id
                .parse::<i64>()
                .map_or_else(|_| Value::String(id.clone()), Value::from),
            Record::Structured(map) => map.get("id").cloned().unwrap_or(Value::Null),
        };

        Ok(json!({ "id": id, "value": "ok" }))
    }
}
