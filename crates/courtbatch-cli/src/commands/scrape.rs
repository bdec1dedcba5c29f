//! `scrape`: one worker, or the orchestrator of many.

use anyhow::Context;
use courtbatch_opendal::Storage;
use courtbatch_runtime::{Orchestrator, date_tag, resolve_output_folder, run_chunk};

use crate::TRACING_TARGET_COMMAND;
use crate::config::{Cli, ScrapeArgs};

pub async fn execute(cli: &Cli, storage: &Storage, args: &ScrapeArgs) -> anyhow::Result<()> {
    if args.is_orchestrator() {
        orchestrate(cli, storage, args).await
    } else {
        work(cli, storage, args).await
    }
}

async fn orchestrate(cli: &Cli, storage: &Storage, args: &ScrapeArgs) -> anyhow::Result<()> {
    let config = args.run_config();
    let scheduler = args
        .scheduler
        .build(args.remote, cli.worker_prefix())
        .context("failed to create task scheduler")?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        scheduler = scheduler.name(),
        ntasks = args.ntasks(),
        remote = args.remote,
        wait = !args.no_wait,
        "Orchestrating scrape"
    );

    let report = Orchestrator::new(storage, scheduler.as_ref())
        .with_poll_interval(args.scheduler.poll_interval())
        .with_max_attempts(args.scheduler.max_attempts)
        .with_remote(args.remote)
        .run(&config, args.ntasks(), !args.no_wait)
        .await
        .context("scrape run failed")?;

    super::print_report(&report)?;
    report.into_result()?;
    Ok(())
}

async fn work(cli: &Cli, storage: &Storage, args: &ScrapeArgs) -> anyhow::Result<()> {
    let config = args.run_config();
    let scraper = cli
        .scraper
        .build()
        .context("no scraper configured, set --scraper-command or COURTBATCH_SCRAPER")?;
    let output_folder = resolve_output_folder(&config, &date_tag())?;

    let report = run_chunk(storage, &scraper, &config, &output_folder, args.nprocs, args.pid)
        .await
        .with_context(|| format!("worker {} of {} failed", args.pid, args.nprocs))?;

    super::print_report(&report)
}
