//! Built-in [`TaskScheduler`](courtbatch_core::scheduler::TaskScheduler)
//! implementations.

mod local;

pub use local::LocalScheduler;
