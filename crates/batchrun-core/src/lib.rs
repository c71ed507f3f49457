//! BatchRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - Process spawning or other I/O
//! - The executor that performs the actual work
//!
//! Everything here is deterministic: partitioning a work-item set into
//! batches, describing per-item outcomes and folding them into a report.

pub mod batch;
pub mod config;
pub mod error;
pub mod ids;
pub mod item;
pub mod outcome;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use batch::{split, split_into, split_with_ceiling, Batch, BatchPlan, PlannedBatch};
pub use config::{DispatchConfig, DEFAULT_BATCH_SIZE_CEILING};
pub use error::CoreError;
pub use ids::ItemId;
pub use item::{WorkItem, WorkItemSet};
pub use outcome::{BatchResult, ItemOutcome, INTERNAL_ERROR_PREFIX};
pub use report::Report;
pub use status::{ItemStatus, OverallStatus};
