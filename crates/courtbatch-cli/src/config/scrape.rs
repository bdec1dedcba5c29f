//! `scrape` subcommand options.

use clap::Args;
use courtbatch_core::job::{
    DEFAULT_INTERVAL_SECS, DEFAULT_LOG_FREQ, DEFAULT_SEED, DEFAULT_SLEEP_SECS,
    DEFAULT_TIME_LIMIT_SECS,
};
use courtbatch_core::{Browser, ErrorPolicy, Flavor, RunConfig, SearchBy};

use super::SchedulerArgs;

/// Scrape a dataset, as one worker or as the orchestrator of many.
///
/// Without `--remote` or `--ntasks` this process is worker `--pid` of
/// `--nprocs`. With either, it launches the workers, waits for them and
/// combines their outputs.
#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    #[arg(value_enum)]
    pub flavor: Flavor,

    /// Input dataset: a local path or `s3://bucket/key`.
    pub input: String,

    /// Portal search strategy; required for `portal`.
    #[arg(long, value_enum)]
    pub search_by: Option<SearchBy>,

    #[arg(long, value_enum, default_value = "chrome")]
    pub browser: Browser,

    /// Total number of workers this worker is one of.
    #[arg(long, default_value_t = 1)]
    pub nprocs: usize,

    /// Index of this worker.
    #[arg(long, default_value_t = 0)]
    pub pid: usize,

    /// Scrape but save nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Scrape a seeded random sample of this many records.
    #[arg(long)]
    pub sample: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Records between progress lines.
    #[arg(long, default_value_t = DEFAULT_LOG_FREQ)]
    pub log_freq: usize,

    /// What to do when a record fails.
    #[arg(long, value_enum, default_value = "ignore")]
    pub errors: ErrorPolicy,

    /// Seconds to pause between records.
    #[arg(long, default_value_t = DEFAULT_SLEEP_SECS)]
    pub sleep: u64,

    /// Seconds between download checks.
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Seconds to wait for a download.
    #[arg(long, default_value_t = DEFAULT_TIME_LIMIT_SECS)]
    pub time_limit: u64,

    /// Overrides the run folder `results/<dataset>/<tag>`.
    #[arg(long)]
    pub output_folder: Option<String>,

    /// Run folder tag; defaults to today's UTC date.
    #[arg(long)]
    pub tag: Option<String>,

    /// Debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Run workers off this machine, exchanging data through the bucket.
    #[arg(long)]
    pub remote: bool,

    /// Number of workers to launch.
    #[arg(long)]
    pub ntasks: Option<usize>,

    /// Return right after submitting the workers.
    #[arg(long)]
    pub no_wait: bool,

    #[clap(flatten)]
    pub scheduler: SchedulerArgs,
}

impl ScrapeArgs {
    /// Returns `true` when this process launches workers instead of being one.
    pub fn is_orchestrator(&self) -> bool {
        self.remote || self.ntasks.is_some()
    }

    /// Number of workers an orchestrated run launches.
    pub fn ntasks(&self) -> usize {
        self.ntasks.unwrap_or(1)
    }

    /// The typed run configuration these options describe.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            flavor: self.flavor,
            input: self.input.clone(),
            output_folder: self.output_folder.clone(),
            tag: self.tag.clone(),
            search_by: self.search_by,
            browser: self.browser,
            dry_run: self.dry_run,
            sample: self.sample,
            seed: self.seed,
            log_freq: self.log_freq,
            errors: self.errors,
            sleep: self.sleep,
            interval: self.interval,
            time_limit: self.time_limit,
            debug: self.debug,
        }
    }
}
