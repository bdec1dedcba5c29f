//! Run configuration shared by the orchestrator and every worker.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::dataset::InputFormat;
use crate::{Error, Result};

/// Default number of records between progress log lines.
pub const DEFAULT_LOG_FREQ: usize = 10;

/// Default seed for sampling.
pub const DEFAULT_SEED: u64 = 42;

/// Default pause between scrape calls, in seconds.
pub const DEFAULT_SLEEP_SECS: u64 = 2;

/// Default polling interval for downloads, in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// Default total download wait, in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 20;

/// Kind of data being scraped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Flavor {
    /// Search results from the court portal.
    #[cfg_attr(feature = "config", value(name = "portal"))]
    Portal,
    /// Court summary reports.
    #[cfg_attr(feature = "config", value(name = "court_summary"))]
    CourtSummary,
}

impl Flavor {
    /// Returns the format the input dataset must be stored in.
    pub fn input_format(self) -> InputFormat {
        match self {
            Self::Portal => InputFormat::Csv,
            Self::CourtSummary => InputFormat::Json,
        }
    }
}

/// How the portal is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
pub enum SearchBy {
    /// Search by incident number.
    #[serde(rename = "Incident Number")]
    #[strum(serialize = "Incident Number")]
    #[cfg_attr(feature = "config", value(name = "Incident Number", alias = "incident-number"))]
    IncidentNumber,
    /// Search by docket number.
    #[serde(rename = "Docket Number")]
    #[strum(serialize = "Docket Number")]
    #[cfg_attr(feature = "config", value(name = "Docket Number", alias = "docket-number"))]
    DocketNumber,
}

/// Browser driven by the scraper.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

/// What happens when a single record fails to scrape.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and omit the record from the chunk's results.
    #[default]
    Ignore,
    /// Abort the whole chunk.
    Raise,
}

/// Every option of a scrape run, as one explicit value.
///
/// The orchestrator forwards it to each worker through
/// [`worker_args`](Self::worker_args) and each worker persists it next to its
/// outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Kind of data being scraped.
    pub flavor: Flavor,
    /// Location of the input dataset (`s3://bucket/key` or a local path).
    pub input: String,
    /// Explicit output folder; derived from the dataset and tag when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<String>,
    /// Tag naming the run folder; defaults to the submission date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Portal search strategy; required for [`Flavor::Portal`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_by: Option<SearchBy>,
    #[serde(default)]
    pub browser: Browser,
    /// Scrape but do not persist anything.
    #[serde(default)]
    pub dry_run: bool,
    /// Size of the seeded random sample drawn before partitioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<usize>,
    pub seed: u64,
    pub log_freq: usize,
    #[serde(default)]
    pub errors: ErrorPolicy,
    /// Pause between scrape calls, in seconds.
    pub sleep: u64,
    /// Download polling interval, in seconds.
    pub interval: u64,
    /// Total download wait, in seconds.
    pub time_limit: u64,
    #[serde(default)]
    pub debug: bool,
}

impl RunConfig {
    /// Creates a configuration with default options.
    pub fn new(flavor: Flavor, input: impl Into<String>) -> Self {
        Self {
            flavor,
            input: input.into(),
            output_folder: None,
            tag: None,
            search_by: None,
            browser: Browser::default(),
            dry_run: false,
            sample: None,
            seed: DEFAULT_SEED,
            log_freq: DEFAULT_LOG_FREQ,
            errors: ErrorPolicy::default(),
            sleep: DEFAULT_SLEEP_SECS,
            interval: DEFAULT_INTERVAL_SECS,
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            debug: false,
        }
    }

    /// Sets the portal search strategy.
    pub fn with_search_by(mut self, search_by: SearchBy) -> Self {
        self.search_by = Some(search_by);
        self
    }

    /// Sets an explicit output folder.
    pub fn with_output_folder(mut self, folder: impl Into<String>) -> Self {
        self.output_folder = Some(folder.into());
        self
    }

    /// Sets the sample size and seed.
    pub fn with_sample(mut self, sample: usize, seed: u64) -> Self {
        self.sample = Some(sample);
        self.seed = seed;
        self
    }

    /// Sets the pause between scrape calls, in seconds.
    pub fn with_sleep(mut self, sleep: u64) -> Self {
        self.sleep = sleep;
        self
    }

    /// Sets the per-record error policy.
    pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }

    /// Returns the pause between scrape calls.
    pub fn sleep_duration(&self) -> Duration {
        Duration::from_secs(self.sleep)
    }

    /// Returns the dataset name: the input file name without its extension.
    pub fn dataset_name(&self) -> &str {
        let file = self
            .input
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.input);
        file.rsplit_once('.').map_or(file, |(stem, _)| stem)
    }

    /// Checks options that depend on each other.
    pub fn validate(&self) -> Result<()> {
        if self.flavor == Flavor::Portal && self.search_by.is_none() {
            return Err(Error::invalid_config(
                "'search_by' must be specified for flavor 'portal'",
            ));
        }

        if self.input.is_empty() {
            return Err(Error::invalid_config("input location is empty"));
        }

        if self.log_freq == 0 {
            return Err(Error::invalid_config("'log_freq' must be at least 1"));
        }

        Ok(())
    }

    /// Builds the `scrape` argument list one worker runs with.
    ///
    /// The list starts at the subcommand name; the scheduler prepends the
    /// program. `output_folder` is the resolved run folder shared by all
    /// workers.
    pub fn worker_args(&self, output_folder: &str, pid: usize, nprocs: usize) -> Vec<String> {
        let mut args = vec![
            "scrape".to_owned(),
            self.flavor.to_string(),
            self.input.clone(),
            format!("--nprocs={nprocs}"),
            format!("--pid={pid}"),
            format!("--browser={}", self.browser),
            format!("--sleep={}", self.sleep),
            format!("--errors={}", self.errors),
            format!("--log-freq={}", self.log_freq),
            format!("--seed={}", self.seed),
            format!("--interval={}", self.interval),
            format!("--time-limit={}", self.time_limit),
            format!("--output-folder={output_folder}"),
        ];

        if let Some(search_by) = self.search_by {
            args.push(format!("--search-by={search_by}"));
        }
        if let Some(sample) = self.sample {
            args.push(format!("--sample={sample}"));
        }
        if let Some(tag) = &self.tag {
            args.push(format!("--tag={tag}"));
        }
        if self.dry_run {
            args.push("--dry-run".to_owned());
        }
        if self.debug {
            args.push("--debug".to_owned());
        }

        args
    }
}
