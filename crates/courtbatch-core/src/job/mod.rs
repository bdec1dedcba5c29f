//! Typed run configuration and persisted output layout.

mod config;
mod layout;

pub use config::{
    Browser, DEFAULT_INTERVAL_SECS, DEFAULT_LOG_FREQ, DEFAULT_SEED, DEFAULT_SLEEP_SECS,
    DEFAULT_TIME_LIMIT_SECS, ErrorPolicy, Flavor, RunConfig, SearchBy,
};
pub use layout::{ArtifactKind, OutputLayout, join_path, parent_path};
