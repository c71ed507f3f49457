//! Dispatcher - fans batches out to runners and gathers their results.

use std::collections::HashMap;
use std::sync::Arc;

use batchrun_core::{
    Batch, BatchResult, CoreError, DispatchConfig, ItemId, ItemOutcome, Report, WorkItemSet,
};
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::executor::Executor;
use crate::runner::BatchRunner;

/// Runs batches concurrently, up to `max_concurrent_batches` at a time.
///
/// Batches are independent: a failing batch never stops or cancels the
/// others. Combined with the per-batch bound, at most
/// [`DispatchConfig::peak_concurrency`] executor calls are in flight, which
/// is the number to budget against any external rate limit.
pub struct Dispatcher {
    runner: Arc<BatchRunner>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a dispatcher, rejecting invalid configuration up front.
    pub fn new(executor: Arc<dyn Executor>, config: DispatchConfig) -> Result<Self, CoreError> {
        let runner = BatchRunner::new(executor, &config)?;
        Ok(Self {
            runner: Arc::new(runner),
            config,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Partition, run and aggregate in one call.
    pub async fn run(&self, items: &WorkItemSet) -> Result<Report, CoreError> {
        let batches = self.config.plan_batches(items)?;
        let results = self.dispatch(batches).await;
        Ok(Report::aggregate(results))
    }

    /// Run every batch and return their results in batch-index order.
    pub async fn dispatch(&self, batches: Vec<Batch>) -> Vec<BatchResult> {
        let item_count: usize = batches.iter().map(Batch::len).sum();
        info!(
            batches = batches.len(),
            items = item_count,
            max_concurrent_batches = ?self.config.max_concurrent_batches,
            max_parallel_per_batch = ?self.config.max_parallel_per_batch,
            peak_concurrency = ?self.config.peak_concurrency(),
            "Starting dispatch"
        );

        let limit = self
            .config
            .max_concurrent_batches
            .map_or(batches.len(), |b| b.min(batches.len()))
            .max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        // Ids per batch, to account for a batch whose task dies.
        let mut expected: HashMap<usize, Vec<ItemId>> = batches
            .iter()
            .map(|b| (b.index(), b.items().iter().map(|i| i.id().clone()).collect()))
            .collect();
        let mut tasks = JoinSet::new();

        for batch in batches {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let runner = self.runner.clone();
            info!(batch_index = batch.index(), size = batch.len(), "Batch started");
            tasks.spawn(async move {
                let result = runner.run(batch).await;
                drop(permit);
                result
            });
        }

        let mut results = Vec::with_capacity(expected.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    expected.remove(&result.batch_index);
                    results.push(result);
                }
                Err(e) => warn!(error = %e, "Batch task failed"),
            }
        }

        // Anything left never reported back; keep the counts whole.
        for (batch_index, ids) in expected {
            warn!(batch_index, items = ids.len(), "Batch produced no result");
            let now = Utc::now();
            results.push(BatchResult {
                batch_index,
                outcomes: ids
                    .into_iter()
                    .map(|id| {
                        ItemOutcome::internal_error(id, 0, "batch runner ended without reporting")
                    })
                    .collect(),
                started_at: now,
                finished_at: now,
            });
        }

        results.sort_by_key(|r| r.batch_index);

        let failed_batches = results.iter().filter(|r| r.has_failures()).count();
        info!(batches = results.len(), failed_batches, "Dispatch finished");
        results
    }
}
