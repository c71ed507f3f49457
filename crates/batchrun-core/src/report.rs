//! Final report of a dispatch run and the aggregator that builds it.

use serde::{Deserialize, Serialize};

use crate::{BatchResult, ItemOutcome, ItemStatus, OverallStatus};

/// Aggregated summary of one complete dispatch run.
///
/// Built in one step by [`Report::aggregate`] and read-only afterwards.
/// `succeeded + failed + skipped == total_items` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    total_items: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    overall_status: OverallStatus,
    batch_results: Vec<BatchResult>,
}

impl Report {
    /// Fold batch results into a report.
    ///
    /// Results may arrive in any order; they are sorted by batch index.
    /// Skipped items do not fail the run on their own, so callers wanting a
    /// stricter policy should look at [`Report::skipped`].
    pub fn aggregate(mut results: Vec<BatchResult>) -> Self {
        results.sort_by_key(|r| r.batch_index);

        let (mut succeeded, mut failed, mut skipped) = (0, 0, 0);
        for outcome in results.iter().flat_map(|r| &r.outcomes) {
            match outcome.status {
                ItemStatus::Success => succeeded += 1,
                ItemStatus::Failure => failed += 1,
                ItemStatus::Skipped => skipped += 1,
            }
        }

        let overall_status = if failed == 0 {
            OverallStatus::Success
        } else {
            OverallStatus::Failure
        };

        Self {
            total_items: succeeded + failed + skipped,
            succeeded,
            failed,
            skipped,
            overall_status,
            batch_results: results,
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn overall_status(&self) -> OverallStatus {
        self.overall_status
    }

    pub fn is_success(&self) -> bool {
        self.overall_status.is_success()
    }

    /// Batch results in batch-index order.
    pub fn batch_results(&self) -> &[BatchResult] {
        &self.batch_results
    }

    /// Every outcome, batch by batch, in original item order.
    pub fn outcomes(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.batch_results.iter().flat_map(|r| r.outcomes.iter())
    }

    /// Failed outcomes in original item order.
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes().filter(|o| o.status.is_failure())
    }
}
