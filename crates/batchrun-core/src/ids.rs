//! Newtype wrapper for work item identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a work item within a [`WorkItemSet`](crate::WorkItemSet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new ItemId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = ItemId::new("tests/unit/parser");
        assert_eq!(format!("{}", id), "tests/unit/parser");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ItemId::from("api");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"api\"");
    }
}
