//! Dispatch configuration.

use serde::{Deserialize, Serialize};

use crate::batch::{self, check_batch_size, Batch};
use crate::{CoreError, WorkItemSet};

/// Largest batch size accepted unless a different ceiling is configured.
///
/// Matches the per-workflow matrix job limit of GitHub Actions.
pub const DEFAULT_BATCH_SIZE_CEILING: usize = 256;

/// Dispatch configuration.
///
/// Unset parallelism bounds mean "unrestricted". The two bounds multiply:
/// at most `max_concurrent_batches * max_parallel_per_batch` executor calls
/// are in flight at once, see [`DispatchConfig::peak_concurrency`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum items per batch, in `[1, batch_size_ceiling]`.
    pub max_batch_size: usize,

    /// Platform limit `max_batch_size` is checked against.
    pub batch_size_ceiling: usize,

    /// Split into this many near-equal batches instead of cutting at
    /// `max_batch_size`.
    pub batch_count: Option<usize>,

    /// Concurrent executor calls within one batch.
    pub max_parallel_per_batch: Option<usize>,

    /// Batches running at the same time.
    pub max_concurrent_batches: Option<usize>,

    /// Stop starting new items in a batch after its first failure.
    pub fail_fast_per_batch: bool,

    /// Per-item timeout in milliseconds, 0 disables it.
    pub per_item_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_BATCH_SIZE_CEILING,
            batch_size_ceiling: DEFAULT_BATCH_SIZE_CEILING,
            batch_count: None,
            max_parallel_per_batch: None,
            max_concurrent_batches: None,
            fail_fast_per_batch: false,
            per_item_timeout_ms: 0,
        }
    }
}

impl DispatchConfig {
    /// Check every option, returning the first problem found.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_batch_size(self.max_batch_size, self.batch_size_ceiling)?;

        if self.batch_count == Some(0) {
            return Err(CoreError::invalid_config("batch count must be at least 1"));
        }
        if self.max_parallel_per_batch == Some(0) {
            return Err(CoreError::invalid_config(
                "max parallel per batch must be at least 1",
            ));
        }
        if self.max_concurrent_batches == Some(0) {
            return Err(CoreError::invalid_config(
                "max concurrent batches must be at least 1",
            ));
        }
        Ok(())
    }

    /// Upper bound on simultaneous executor calls, or `None` when either
    /// parallelism bound is unrestricted.
    pub fn peak_concurrency(&self) -> Option<usize> {
        match (self.max_concurrent_batches, self.max_parallel_per_batch) {
            (Some(batches), Some(per_batch)) => Some(batches.saturating_mul(per_batch)),
            _ => None,
        }
    }

    /// Validate, then partition `items` the way this configuration asks.
    pub fn plan_batches(&self, items: &WorkItemSet) -> Result<Vec<Batch>, CoreError> {
        self.validate()?;
        match self.batch_count {
            Some(count) => batch::split_into(items, count, self.batch_size_ceiling),
            None => batch::split_with_ceiling(items, self.max_batch_size, self.batch_size_ceiling),
        }
    }

    /// Per-item timeout, if enabled.
    pub fn per_item_timeout(&self) -> Option<std::time::Duration> {
        (self.per_item_timeout_ms > 0)
            .then(|| std::time::Duration::from_millis(self.per_item_timeout_ms))
    }
}
