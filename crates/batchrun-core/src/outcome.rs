//! Per-item outcomes and per-batch results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemId, ItemStatus};

/// Prefix on the message of outcomes produced by a misbehaving executor
/// (a panic rather than a returned failure).
pub const INTERNAL_ERROR_PREFIX: &str = "internal error: ";

/// Terminal result of one work item. Produced exactly once per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item_id: ItemId,
    pub status: ItemStatus,
    /// Wall time spent in the executor; 0 for skipped items.
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ItemOutcome {
    /// Successful outcome with optional diagnostic output.
    pub fn success(item_id: ItemId, duration_ms: u64, message: Option<String>) -> Self {
        Self {
            item_id,
            status: ItemStatus::Success,
            duration_ms,
            message,
        }
    }

    /// Failed outcome carrying the failure message.
    pub fn failure(item_id: ItemId, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            item_id,
            status: ItemStatus::Failure,
            duration_ms,
            message: Some(message.into()),
        }
    }

    /// Failure caused by the executor itself breaking (e.g. panicking).
    pub fn internal_error(item_id: ItemId, duration_ms: u64, detail: &str) -> Self {
        Self::failure(
            item_id,
            duration_ms,
            format!("{}{}", INTERNAL_ERROR_PREFIX, detail),
        )
    }

    /// Failure caused by exceeding the per-item timeout.
    pub fn timed_out(item_id: ItemId, timeout_ms: u64) -> Self {
        Self::failure(item_id, timeout_ms, format!("timed out after {}ms", timeout_ms))
    }

    /// Item never started because its batch failed fast.
    pub fn skipped(item_id: ItemId) -> Self {
        Self {
            item_id,
            status: ItemStatus::Skipped,
            duration_ms: 0,
            message: Some("skipped: batch failed fast".to_string()),
        }
    }

    /// Returns true if this failure came from a broken executor.
    pub fn is_internal_error(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.starts_with(INTERNAL_ERROR_PREFIX))
    }
}

/// Outcomes of one batch, positionally matching the batch's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_index: usize,
    pub outcomes: Vec<ItemOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    /// Number of outcomes with the given status.
    pub fn count(&self, status: ItemStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failure())
    }

    /// Wall time from first start to last finish.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
