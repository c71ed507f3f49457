//! The executor seam: how one work item actually gets done.

use async_trait::async_trait;
use batchrun_core::WorkItem;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors an executor reports for a work item.
///
/// Every variant ends up as a `Failure` outcome carrying the error's
/// message.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

impl ExecutorError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Output of a successful execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Diagnostic text to keep on the outcome.
    pub message: Option<String>,
}

impl ExecutionOutput {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Per-call context handed to the executor.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Batch the item belongs to.
    pub batch_index: usize,

    /// Cancelled when the batch fails fast. Honoring it is optional.
    pub cancel: CancellationToken,
}

/// Performs the unit of work for one item.
///
/// Called concurrently from many tasks with distinct items, so
/// implementations must be `Send + Sync`. A panic inside `execute` is
/// contained by the runner and recorded as an internal-error failure.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        item: &WorkItem,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionOutput, ExecutorError>;
}
