//! Scripted implementations of the scheduler and scraper traits for testing.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! courtbatch-core = { version = "...", features = ["test-utils"] }
//! ```

mod scheduler;
mod scraper;

pub use scheduler::MockScheduler;
pub use scraper::MockScraper;
