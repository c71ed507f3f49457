//! BatchRun Runtime
//!
//! Runs the batches produced by `batchrun-core` with two nested levels of
//! bounded parallelism:
//!
//! - [`Dispatcher`] runs up to `max_concurrent_batches` batches at once.
//! - [`BatchRunner`] runs up to `max_parallel_per_batch` items of one batch
//!   at once, each through the caller's [`Executor`].
//!
//! Peak concurrency is the product of the two bounds. Item failures, panics
//! and timeouts are recorded as outcomes and never abort the run.

pub mod dispatcher;
pub mod executor;
pub mod runner;

pub use dispatcher::Dispatcher;
pub use executor::{ExecutionContext, ExecutionOutput, Executor, ExecutorError};
pub use runner::BatchRunner;
