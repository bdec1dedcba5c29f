//! Prelude module for convenient imports.

pub use crate::arbiter::{RunOutcome, classify, enforce_provisioning};
pub use crate::combine::{CombinedArtifact, combine};
pub use crate::error::{Result, RuntimeError};
pub use crate::orchestrator::{Orchestrator, RunReport};
pub use crate::scheduler::LocalScheduler;
pub use crate::scraper::CommandScraper;
pub use crate::submit::submit;
pub use crate::wait::{WaitReport, wait};
pub use crate::worker::{ChunkReport, run_chunk};
