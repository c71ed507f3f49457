//! Work items and the ordered, duplicate-free set they are batched from.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{CoreError, ItemId};

/// A single unit of work, identified by its id.
///
/// Immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Identifier, unique within its set.
    id: ItemId,

    /// Free-form metadata handed to the executor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl WorkItem {
    /// Create a new WorkItem with no metadata.
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Builder method to add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Look up a single metadata value.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Ordered sequence of work items with unique ids.
///
/// Input order is preserved and is the order batches are cut in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkItemSet {
    items: Vec<WorkItem>,
}

impl WorkItemSet {
    /// Build a set, failing on the first id seen twice.
    pub fn new(items: Vec<WorkItem>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(CoreError::DuplicateItem(item.id().clone()));
            }
        }
        Ok(Self { items })
    }

    /// Build a set of metadata-free items from bare ids.
    pub fn from_ids<I, S>(ids: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        Self::new(ids.into_iter().map(WorkItem::new).collect())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[WorkItem] {
        &self.items
    }

    /// Ids in set order.
    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter().map(WorkItem::id)
    }
}

impl<'a> IntoIterator for &'a WorkItemSet {
    type Item = &'a WorkItem;
    type IntoIter = std::slice::Iter<'a, WorkItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_order() {
        let set = WorkItemSet::from_ids(["c", "a", "b"]).unwrap();
        let ids: Vec<&str> = set.ids().map(ItemId::as_str).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = WorkItemSet::from_ids(["api", "web", "api"]);
        match result {
            Err(CoreError::DuplicateItem(id)) => assert_eq!(id.as_str(), "api"),
            other => panic!("expected DuplicateItem, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_set_is_legal() {
        let set = WorkItemSet::new(Vec::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_metadata_round_trip_from_json() {
        let item: WorkItem =
            serde_json::from_str(r#"{"id": "db", "metadata": {"suite": "integration"}}"#).unwrap();
        assert_eq!(item.id().as_str(), "db");
        assert_eq!(item.meta("suite"), Some("integration"));

        let bare: WorkItem = serde_json::from_str(r#"{"id": "ui"}"#).unwrap();
        assert!(bare.metadata().is_empty());
    }
}
