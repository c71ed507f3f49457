//! Batches and the batcher that cuts a work-item set into them.
//!
//! Batching is pure and deterministic: items are cut into contiguous
//! slices in set order, the last batch may be short, and empty batches are
//! never produced. Concatenating every batch in index order gives back the
//! original set.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BATCH_SIZE_CEILING;
use crate::{CoreError, ItemId, WorkItem, WorkItemSet};

/// A size-bounded, ordered slice of a work-item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    items: Vec<WorkItem>,
}

impl Batch {
    /// Position of this batch in the partition, counted from 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the batch, yielding its items in order.
    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }
}

/// Split `items` into batches of at most `max_batch_size`, checked against
/// the default ceiling of [`DEFAULT_BATCH_SIZE_CEILING`].
pub fn split(items: &WorkItemSet, max_batch_size: usize) -> Result<Vec<Batch>, CoreError> {
    split_with_ceiling(items, max_batch_size, DEFAULT_BATCH_SIZE_CEILING)
}

/// Split `items` into batches of at most `max_batch_size`, which must lie in
/// `[1, ceiling]`.
pub fn split_with_ceiling(
    items: &WorkItemSet,
    max_batch_size: usize,
    ceiling: usize,
) -> Result<Vec<Batch>, CoreError> {
    check_batch_size(max_batch_size, ceiling)?;
    Ok(chunk(items, max_batch_size))
}

/// Split `items` into at most `batch_count` batches of near-equal size.
///
/// Every batch except possibly the last holds `ceil(n / batch_count)` items.
/// When there are fewer items than requested batches, fewer batches come
/// back rather than empty ones.
pub fn split_into(
    items: &WorkItemSet,
    batch_count: usize,
    ceiling: usize,
) -> Result<Vec<Batch>, CoreError> {
    if batch_count == 0 {
        return Err(CoreError::invalid_config("batch count must be at least 1"));
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let size = items.len().div_ceil(batch_count);
    if size > ceiling {
        return Err(CoreError::invalid_config(format!(
            "{} items in {} batches needs {} items per batch, above the ceiling of {}",
            items.len(),
            batch_count,
            size,
            ceiling
        )));
    }
    Ok(chunk(items, size))
}

pub(crate) fn check_batch_size(max_batch_size: usize, ceiling: usize) -> Result<(), CoreError> {
    if ceiling == 0 {
        return Err(CoreError::invalid_config(
            "batch size ceiling must be at least 1",
        ));
    }
    if max_batch_size == 0 || max_batch_size > ceiling {
        return Err(CoreError::invalid_config(format!(
            "max batch size must be between 1 and {}, got {}",
            ceiling, max_batch_size
        )));
    }
    Ok(())
}

fn chunk(items: &WorkItemSet, size: usize) -> Vec<Batch> {
    items
        .as_slice()
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            items: chunk.to_vec(),
        })
        .collect()
}

/// Serializable description of a batch partition.
///
/// This is the matrix a CI system would fan out over: one entry per batch
/// listing the item ids it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub batch_count: usize,
    pub total_items: usize,
    pub batches: Vec<PlannedBatch>,
}

/// One entry of a [`BatchPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBatch {
    pub index: usize,
    pub items: Vec<ItemId>,
}

impl BatchPlan {
    pub fn from_batches(batches: &[Batch]) -> Self {
        let batches: Vec<PlannedBatch> = batches
            .iter()
            .map(|b| PlannedBatch {
                index: b.index(),
                items: b.items().iter().map(|i| i.id().clone()).collect(),
            })
            .collect();
        Self {
            batch_count: batches.len(),
            total_items: batches.iter().map(|b| b.items.len()).sum(),
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(n: usize) -> WorkItemSet {
        WorkItemSet::from_ids((0..n).map(|i| format!("item-{i:04}"))).unwrap()
    }

    fn sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(Batch::len).collect()
    }

    fn flatten(batches: &[Batch]) -> Vec<WorkItem> {
        batches.iter().flat_map(|b| b.items().to_vec()).collect()
    }

    #[test]
    fn test_split_boundary_sizes() {
        assert!(split(&set_of(0), 256).unwrap().is_empty());
        assert_eq!(sizes(&split(&set_of(256), 256).unwrap()), vec![256]);
        assert_eq!(sizes(&split(&set_of(257), 256).unwrap()), vec![256, 1]);
        assert_eq!(
            sizes(&split(&set_of(1000), 256).unwrap()),
            vec![256, 256, 256, 232]
        );
    }

    #[test]
    fn test_split_preserves_order_and_count() {
        for n in [1, 7, 64, 255, 513] {
            for m in [1, 3, 10, 256] {
                let set = set_of(n);
                let batches = split(&set, m).unwrap();

                assert_eq!(batches.len(), n.div_ceil(m));
                assert!(batches.iter().all(|b| b.len() <= m && !b.is_empty()));
                assert_eq!(flatten(&batches), set.as_slice().to_vec());
                for (expected, batch) in batches.iter().enumerate() {
                    assert_eq!(batch.index(), expected);
                }
            }
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let set = set_of(600);
        assert_eq!(split(&set, 100).unwrap(), split(&set, 100).unwrap());
    }

    #[test]
    fn test_split_rejects_out_of_range_sizes() {
        let set = set_of(10);
        assert!(matches!(
            split(&set, 0),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            split(&set, 300),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_ceiling_is_configurable() {
        let set = set_of(1200);
        let batches = split_with_ceiling(&set, 1000, 1000).unwrap();
        assert_eq!(sizes(&batches), vec![1000, 200]);
        assert!(split_with_ceiling(&set, 20, 16).is_err());
    }

    #[test]
    fn test_split_into_even_batches() {
        let batches = split_into(&set_of(10), 3, 256).unwrap();
        assert_eq!(sizes(&batches), vec![4, 4, 2]);

        // fewer items than batches: no empty batches
        let batches = split_into(&set_of(2), 5, 256).unwrap();
        assert_eq!(sizes(&batches), vec![1, 1]);

        assert!(split_into(&set_of(0), 4, 256).unwrap().is_empty());
    }

    #[test]
    fn test_split_into_rejects_oversized_batches() {
        assert!(matches!(
            split_into(&set_of(600), 2, 256),
            Err(CoreError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            split_into(&set_of(5), 0, 256),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_plan_lists_ids_per_batch() {
        let set = WorkItemSet::from_ids(["a", "b", "c"]).unwrap();
        let plan = BatchPlan::from_batches(&split(&set, 2).unwrap());

        assert_eq!(plan.batch_count, 2);
        assert_eq!(plan.total_items, 3);
        assert_eq!(plan.batches[1].items, vec![ItemId::from("c")]);

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["batches"][0]["items"], serde_json::json!(["a", "b"]));
    }
}
