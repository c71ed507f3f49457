//! Runs the items of one batch with bounded parallelism.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use batchrun_core::{
    Batch, BatchResult, CoreError, DispatchConfig, ItemId, ItemOutcome, ItemStatus, WorkItem,
};
use chrono::Utc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::{ExecutionContext, Executor};

/// Runs every item of a batch through the executor.
///
/// Items start in batch order, at most `max_parallel` at a time. Each call
/// runs in its own task so a failing, panicking or hanging item never takes
/// its siblings down with it.
pub struct BatchRunner {
    executor: Arc<dyn Executor>,
    max_parallel: Option<usize>,
    fail_fast: bool,
    item_timeout: Option<Duration>,
}

impl BatchRunner {
    /// Create a runner from a validated configuration.
    pub fn new(executor: Arc<dyn Executor>, config: &DispatchConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            executor,
            max_parallel: config.max_parallel_per_batch,
            fail_fast: config.fail_fast_per_batch,
            item_timeout: config.per_item_timeout(),
        })
    }

    /// Run the batch to completion.
    ///
    /// Returns once every item has a terminal outcome. Outcomes are in the
    /// batch's item order, whatever order the items finished in.
    pub async fn run(&self, batch: Batch) -> BatchResult {
        let batch_index = batch.index();
        let started_at = Utc::now();
        let items = batch.into_items();
        let ids: Vec<ItemId> = items.iter().map(|i| i.id().clone()).collect();

        debug!(batch_index, items = items.len(), "Running batch");

        // Clamped to the item count so any limit fits the semaphore.
        let limit = self
            .max_parallel
            .map_or(items.len(), |p| p.min(items.len()))
            .max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel::<(usize, ItemOutcome)>(items.len().max(1));
        let mut slots: Vec<Option<ItemOutcome>> = vec![None; items.len()];

        for (position, item) in items.into_iter().enumerate() {
            // Waiting here keeps the queue in batch order.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    slots[position] = Some(ItemOutcome::internal_error(
                        item.id().clone(),
                        0,
                        "concurrency limiter closed",
                    ));
                    continue;
                }
            };

            if self.fail_fast && cancel.is_cancelled() {
                debug!(batch_index, item_id = %item.id(), "Skipping item after batch failure");
                slots[position] = Some(ItemOutcome::skipped(item.id().clone()));
                continue;
            }

            let task = ItemTask {
                executor: self.executor.clone(),
                item,
                ctx: ExecutionContext {
                    batch_index,
                    cancel: cancel.clone(),
                },
                timeout: self.item_timeout,
                fail_fast: self.fail_fast,
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = task.run(permit).await;
                let _ = tx.send((position, outcome)).await;
            });
        }
        drop(tx);

        while let Some((position, outcome)) = rx.recv().await {
            slots[position] = Some(outcome);
        }

        let outcomes: Vec<ItemOutcome> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.unwrap_or_else(|| {
                    warn!(batch_index, item_id = %id, "Item task vanished without an outcome");
                    ItemOutcome::internal_error(id, 0, "item task ended without reporting")
                })
            })
            .collect();

        let result = BatchResult {
            batch_index,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            batch_index,
            succeeded = result.count(ItemStatus::Success),
            failed = result.count(ItemStatus::Failure),
            skipped = result.count(ItemStatus::Skipped),
            duration_ms = result.duration_ms(),
            "Batch finished"
        );

        result
    }
}

/// Everything one item's task needs, moved into the task.
struct ItemTask {
    executor: Arc<dyn Executor>,
    item: WorkItem,
    ctx: ExecutionContext,
    timeout: Option<Duration>,
    fail_fast: bool,
}

impl ItemTask {
    async fn run(self, permit: OwnedSemaphorePermit) -> ItemOutcome {
        let item_id = self.item.id().clone();
        let batch_index = self.ctx.batch_index;
        let cancel = self.ctx.cancel.clone();
        let start = Instant::now();

        // Inner task so a panicking executor surfaces as a JoinError.
        let executor = self.executor;
        let item = self.item;
        let ctx = self.ctx;
        let mut handle = tokio::spawn(async move { executor.execute(&item, &ctx).await });

        let joined = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, &mut handle).await;
                match waited {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        handle.abort();
                        None
                    }
                }
            }
            None => Some(handle.await),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let outcome = match joined {
            None => {
                let limit_ms = self.timeout.map(|d| d.as_millis() as u64).unwrap_or_default();
                warn!(batch_index, item_id = %item_id, timeout_ms = limit_ms, "Item timed out");
                ItemOutcome::timed_out(item_id, limit_ms)
            }
            Some(Ok(Ok(output))) => {
                debug!(batch_index, item_id = %item_id, duration_ms = elapsed_ms, "Item succeeded");
                ItemOutcome::success(item_id, elapsed_ms, output.message)
            }
            Some(Ok(Err(e))) => {
                warn!(batch_index, item_id = %item_id, error = %e, "Item failed");
                ItemOutcome::failure(item_id, elapsed_ms, e.to_string())
            }
            Some(Err(join_err)) => {
                let detail = if join_err.is_panic() {
                    format!("executor panicked: {}", panic_message(join_err.into_panic()))
                } else {
                    format!("executor task aborted: {}", join_err)
                };
                warn!(batch_index, item_id = %item_id, error = %detail, "Executor broke on item");
                ItemOutcome::internal_error(item_id, elapsed_ms, &detail)
            }
        };

        // Trip before releasing the slot so the next queued item sees it.
        if self.fail_fast && outcome.status.is_failure() {
            cancel.cancel();
        }
        drop(permit);
        outcome
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
