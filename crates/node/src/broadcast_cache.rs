//! Heights at which pooled transaction sets were last announced to peers.

use std::collections::HashMap;

use rivd_consensus::BlockHeight;

use crate::txpool::TransactionSetId;

#[derive(Debug, Default)]
pub struct BroadcastCache {
    entries: HashMap<TransactionSetId, BlockHeight>,
}

impl BroadcastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a first announcement at `height`. An existing entry keeps its
    /// height so re-admission after a reorg does not delay the next relay.
    pub fn add(&mut self, id: TransactionSetId, height: BlockHeight) {
        self.entries.entry(id).or_insert(height);
    }

    pub fn delete(&mut self, id: &TransactionSetId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn height(&self, id: &TransactionSetId) -> Option<BlockHeight> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &TransactionSetId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&TransactionSetId) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }

    /// Ids announced strictly below `height`, restamped with `height`.
    /// Returned in ascending id order.
    pub fn take_due(&mut self, height: BlockHeight) -> Vec<TransactionSetId> {
        let mut due = Vec::new();
        for (id, announced) in self.entries.iter_mut() {
            if *announced < height {
                *announced = height;
                due.push(*id);
            }
        }
        due.sort_unstable();
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_first_height() {
        let mut cache = BroadcastCache::new();
        cache.add([1; 32], 10);
        cache.add([1; 32], 12);
        assert_eq!(cache.height(&[1; 32]), Some(10));
    }

    #[test]
    fn due_sets_are_restamped_once() {
        let mut cache = BroadcastCache::new();
        cache.add([2; 32], 5);
        cache.add([1; 32], 4);
        cache.add([3; 32], 9);
        assert_eq!(cache.take_due(9), vec![[1; 32], [2; 32]]);
        assert_eq!(cache.height(&[1; 32]), Some(9));
        assert!(cache.take_due(9).is_empty());
        assert_eq!(cache.take_due(10).len(), 3);
    }

    #[test]
    fn retain_and_delete() {
        let mut cache = BroadcastCache::new();
        cache.add([1; 32], 1);
        cache.add([2; 32], 1);
        cache.retain(|id| id[0] == 2);
        assert!(!cache.contains(&[1; 32]));
        assert!(cache.delete(&[2; 32]));
        assert!(!cache.delete(&[2; 32]));
        assert!(cache.is_empty());
    }
}
