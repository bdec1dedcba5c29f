//! External scraper options.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use courtbatch_runtime::CommandScraper;

/// Program invoked once per record.
#[derive(Debug, Clone, Args)]
pub struct ScraperArgs {
    /// Scraper program. Reads a JSON request on stdin, prints JSON on stdout.
    #[arg(long, env = "COURTBATCH_SCRAPER", global = true)]
    pub scraper_command: Option<PathBuf>,

    /// Extra argument for the scraper program; repeat for several.
    #[arg(long = "scraper-arg", allow_hyphen_values = true, global = true)]
    pub scraper_args: Vec<String>,

    /// Seconds before a single record's scrape is abandoned.
    #[arg(long, env = "COURTBATCH_SCRAPER_TIMEOUT", global = true)]
    pub scraper_timeout: Option<u64>,
}

impl ScraperArgs {
    /// Builds the scraper, if a program is configured.
    pub fn build(&self) -> Option<CommandScraper> {
        let program = self.scraper_command.as_ref()?;
        let mut scraper = CommandScraper::new(program).with_args(self.scraper_args.iter().cloned());
        if let Some(secs) = self.scraper_timeout {
            scraper = scraper.with_timeout(Duration::from_secs(secs));
        }
        Some(scraper)
    }

    /// Options a child worker process needs to scrape the same way.
    pub fn forwarded_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(program) = &self.scraper_command {
            args.push(format!("--scraper-command={}", program.display()));
        }
        args.extend(self.scraper_args.iter().map(|a| format!("--scraper-arg={a}")));
        if let Some(secs) = self.scraper_timeout {
            args.push(format!("--scraper-timeout={secs}"));
        }
        args
    }
}
