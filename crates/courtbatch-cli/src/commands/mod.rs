//! Subcommand execution.

mod combine;
mod scrape;
mod sync;

use crate::config::{Cli, Command};

/// Runs the parsed command.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let storage = cli.storage.build().await?;

    match &cli.command {
        Command::Scrape(args) => scrape::execute(&cli, &storage, args).await,
        Command::SyncFromRemote(args) => sync::download(&storage, args).await,
        Command::SyncToRemote(args) => sync::upload(&storage, args).await,
        Command::Combine(args) => combine::execute(&storage, args).await,
    }
}

/// Prints a report as pretty JSON on stdout.
fn print_report(report: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
