#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for dataset loading and encoding.
pub const TRACING_TARGET_DATASET: &str = "courtbatch_core::dataset";

/// Tracing target for partitioning and sampling.
pub const TRACING_TARGET_PARTITION: &str = "courtbatch_core::partition";

mod error;

pub mod dataset;
pub mod job;
pub mod partition;
pub mod scheduler;
pub mod scrape;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use dataset::{Dataset, Record};
pub use error::{BoxedError, Error, Result};
pub use job::{Browser, ErrorPolicy, Flavor, OutputLayout, RunConfig, SearchBy};
pub use partition::{Partition, partition, sample};
