//! Core domain errors.

use thiserror::Error;

use crate::ItemId;

/// Core domain errors for BatchRun.
///
/// Only setup problems live here. A work item that fails is recorded as an
/// [`ItemOutcome`](crate::ItemOutcome), never raised as an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration rejected before any batch runs.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The same item id appeared twice in a work-item set.
    #[error("Duplicate work item: {0}")]
    DuplicateItem(ItemId),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// Shorthand for building an `InvalidConfiguration` error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Returns true for errors caused by configuration or input rather than
    /// by the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::DuplicateItem(_) | Self::InvalidInput(_)
        )
    }
}
