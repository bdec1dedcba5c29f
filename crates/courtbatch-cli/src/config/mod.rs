//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── storage: StorageArgs        # data dir, bucket, S3 credentials
//! ├── scraper: ScraperArgs        # external scraper program
//! └── command
//!     ├── scrape                  # worker or orchestrator
//!     ├── sync-from-remote
//!     ├── sync-to-remote
//!     └── combine
//! ```
//!
//! Every option can also come from its environment variable; see `--help`.

mod scheduler;
mod scraper;
mod scrape;
mod storage;

use std::process;

use clap::{Args, Parser, Subcommand};
use courtbatch_core::Flavor;
pub use scheduler::{SchedulerArgs, SchedulerKind};
pub use scrape::ScrapeArgs;
pub use scraper::ScraperArgs;
pub use storage::StorageArgs;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "courtbatch")]
#[command(about = "Partitioned court-record scraping with distributed workers")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub storage: StorageArgs,

    #[clap(flatten)]
    pub scraper: ScraperArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Scrape a dataset, as one worker or as the orchestrator of many.
    Scrape(Box<ScrapeArgs>),
    /// Copy the remote results tree into the data directory.
    SyncFromRemote(SyncArgs),
    /// Copy the local results tree into the bucket.
    SyncToRemote(SyncArgs),
    /// Merge the chunk outputs in a directory.
    Combine(CombineArgs),
}

/// Options of the sync subcommands.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Tree to sync, relative to both roots.
    #[arg(long, default_value = "results")]
    pub prefix: String,

    /// Report what would be copied without copying.
    #[arg(long)]
    pub dry_run: bool,
}

/// Options of the `combine` subcommand.
#[derive(Debug, Clone, Args)]
pub struct CombineArgs {
    #[arg(value_enum)]
    pub flavor: Flavor,

    /// Directory holding the chunk files, local or `s3://`.
    pub chunks_dir: String,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Returns `true` when debug logging was requested.
    pub fn debug(&self) -> bool {
        matches!(&self.command, Command::Scrape(args) if args.debug)
    }

    /// Arguments a child worker needs ahead of its `scrape` arguments.
    pub fn worker_prefix(&self) -> Vec<String> {
        let mut args = self.storage.forwarded_args();
        args.extend(self.scraper.forwarded_args());
        args
    }

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.storage.log();

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            scraper = ?self.scraper.scraper_command,
            scraper_timeout = ?self.scraper.scraper_timeout,
            "Scraper configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use courtbatch_core::{ErrorPolicy, SearchBy};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("courtbatch").chain(args.iter().copied())).unwrap()
    }

    fn scrape(cli: Cli) -> ScrapeArgs {
        match cli.command {
            Command::Scrape(args) => *args,
            other => panic!("expected scrape, got {other:?}"),
        }
    }

    #[test]
    fn worker_arguments_parse_back_to_the_same_config() {
        let mut config = courtbatch_core::RunConfig::new(Flavor::Portal, "s3://courts/ids.csv")
            .with_search_by(SearchBy::IncidentNumber)
            .with_sample(20, 7)
            .with_errors(ErrorPolicy::Raise);
        config.tag = Some("rerun".to_owned());
        config.dry_run = true;

        let folder = "s3://courts/results/ids/rerun";
        let worker_args = config.worker_args(folder, 2, 4);
        let mut argv = vec!["--data-dir=/tmp/data"];
        argv.extend(worker_args.iter().map(String::as_str));

        let cli = parse(&argv);
        assert_eq!(cli.storage.data_dir.to_str(), Some("/tmp/data"));

        let args = scrape(cli);
        assert_eq!((args.nprocs, args.pid), (4, 2));
        assert!(!args.is_orchestrator());

        let parsed = args.run_config();
        assert_eq!(parsed.output_folder.as_deref(), Some(folder));
        assert_eq!(parsed, config.with_output_folder(folder));
    }

    #[test]
    fn remote_run_defaults_to_runpod() {
        let args = scrape(parse(&[
            "scrape",
            "court_summary",
            "s3://courts/arrests.json",
            "--remote",
            "--ntasks",
            "8",
            "--no-wait",
        ]));

        assert!(args.is_orchestrator());
        assert_eq!(args.ntasks(), 8);
        assert!(args.no_wait);
        assert_eq!(args.scheduler.kind(args.remote), SchedulerKind::Runpod);
    }

    #[test]
    fn ntasks_alone_uses_local_processes() {
        let args = scrape(parse(&["scrape", "court_summary", "arrests.json", "--ntasks", "3"]));

        assert!(args.is_orchestrator());
        assert_eq!(args.scheduler.kind(args.remote), SchedulerKind::Local);
    }

    #[test]
    fn search_by_accepts_display_name_and_alias() {
        let args = scrape(parse(&["scrape", "portal", "ids.csv", "--search-by", "Docket Number"]));
        assert_eq!(args.search_by, Some(SearchBy::DocketNumber));

        let args = scrape(parse(&["scrape", "portal", "ids.csv", "--search-by", "incident-number"]));
        assert_eq!(args.search_by, Some(SearchBy::IncidentNumber));
    }

    #[test]
    fn sync_and_combine() {
        let cli = parse(&["sync-from-remote", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Command::SyncFromRemote(SyncArgs { ref prefix, dry_run: true }) if prefix == "results"
        ));

        let cli = parse(&["combine", "portal", "results/ids/t/chunks"]);
        assert!(matches!(
            cli.command,
            Command::Combine(CombineArgs { flavor: Flavor::Portal, ref chunks_dir })
                if chunks_dir == "results/ids/t/chunks"
        ));
    }

    #[test]
    fn worker_prefix_forwards_storage_and_scraper() {
        let cli = parse(&[
            "--data-dir=/srv/data",
            "--bucket=courts",
            "--scraper-command=/usr/bin/scrape",
            "--scraper-arg=--headless",
            "combine",
            "portal",
            "x",
        ]);

        let prefix = cli.worker_prefix();
        assert!(prefix.contains(&"--data-dir=/srv/data".to_owned()));
        assert!(prefix.contains(&"--bucket=courts".to_owned()));
        assert!(prefix.contains(&"--scraper-command=/usr/bin/scrape".to_owned()));
        assert!(prefix.contains(&"--scraper-arg=--headless".to_owned()));
    }
}
