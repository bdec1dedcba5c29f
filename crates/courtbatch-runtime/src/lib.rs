#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for task submission.
pub const TRACING_TARGET_SUBMIT: &str = "courtbatch_runtime::submit";

/// Tracing target for the completion wait loop.
pub const TRACING_TARGET_WAIT: &str = "courtbatch_runtime::wait";

/// Tracing target for failure arbitration.
pub const TRACING_TARGET_ARBITER: &str = "courtbatch_runtime::arbiter";

/// Tracing target for combining chunk outputs.
pub const TRACING_TARGET_COMBINE: &str = "courtbatch_runtime::combine";

/// Tracing target for chunk workers.
pub const TRACING_TARGET_WORKER: &str = "courtbatch_runtime::worker";

/// Tracing target for the built-in scheduler and scraper bindings.
pub const TRACING_TARGET_PROCESS: &str = "courtbatch_runtime::process";

/// Tracing target for the orchestrator.
pub const TRACING_TARGET_ORCHESTRATOR: &str = "courtbatch_runtime::orchestrator";

mod error;
mod layout;

pub mod arbiter;
pub mod combine;
pub mod orchestrator;
pub mod scheduler;
pub mod scraper;
pub mod submit;
pub mod wait;
pub mod worker;

#[doc(hidden)]
pub mod prelude;

pub use arbiter::{RunOutcome, classify, enforce_provisioning};
pub use combine::{CombinedArtifact, combine};
pub use error::{Result, RuntimeError};
pub use layout::{date_tag, resolve_output_folder};
pub use orchestrator::{Orchestrator, RunReport};
pub use scheduler::LocalScheduler;
pub use scraper::CommandScraper;
pub use submit::submit;
pub use wait::{WaitReport, wait};
pub use worker::{ChunkReport, run_chunk};
