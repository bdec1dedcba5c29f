//! Built-in [`Scraper`](courtbatch_core::scrape::Scraper) bindings.

mod command;

pub use command::CommandScraper;
