use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::{Column, KeyValueStore, PrefixVisitor, ScanResult, StoreError, WriteBatch, WriteOp};

type ColumnMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-process store used by tests and ephemeral nodes.
pub struct MemoryStore {
    columns: RwLock<Vec<ColumnMap>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            columns: RwLock::new(vec![ColumnMap::new(); Column::ALL.len()]),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `column`.
    pub fn len(&self, column: Column) -> usize {
        self.columns.read()[column.index()].len()
    }

    pub fn is_empty(&self, column: Column) -> bool {
        self.len(column) == 0
    }

    /// Full copy of one column, for comparing store states in tests.
    pub fn snapshot(&self, column: Column) -> ColumnMap {
        self.columns.read()[column.index()].clone()
    }
}

fn collect_prefix(map: &ColumnMap, prefix: &[u8]) -> ScanResult {
    map.range(prefix.to_vec()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.columns.read()[column.index()].get(key).cloned())
    }

    fn put(&self, column: Column, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.columns.write()[column.index()].insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, column: Column, key: &[u8]) -> Result<(), StoreError> {
        self.columns.write()[column.index()].remove(key);
        Ok(())
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        Ok(collect_prefix(&self.columns.read()[column.index()], prefix))
    }

    fn for_each_prefix<'a>(
        &self,
        column: Column,
        prefix: &[u8],
        visitor: &mut PrefixVisitor<'a>,
    ) -> Result<(), StoreError> {
        // Visit a snapshot so the visitor may call back into the store.
        let entries = self.scan_prefix(column, prefix)?;
        for (key, value) in &entries {
            visitor(key, value)?;
        }
        Ok(())
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut columns = self.columns.write();
        for op in batch.iter() {
            match op {
                WriteOp::Put { column, key, value } => {
                    columns[column.index()].insert(key.as_slice().to_vec(), value.clone());
                }
                WriteOp::Delete { column, key } => {
                    columns[column.index()].remove(key.as_slice());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_scan_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.put(Column::BlockMap, b"b2", b"2").expect("put");
        store.put(Column::BlockMap, b"a9", b"x").expect("put");
        store.put(Column::BlockMap, b"b1", b"1").expect("put");
        store.put(Column::CoinOutputs, b"b0", b"other").expect("put");
        let entries = store.scan_prefix(Column::BlockMap, b"b").expect("scan");
        assert_eq!(
            entries,
            vec![
                (b"b1".to_vec(), b"1".to_vec()),
                (b"b2".to_vec(), b"2".to_vec()),
            ]
        );
    }

    #[test]
    fn batch_applies_in_order() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put(Column::Meta, b"k", b"first".to_vec());
        batch.put(Column::Meta, b"k", b"second".to_vec());
        batch.delete(Column::Meta, b"gone");
        store.write_batch(&batch).expect("batch");
        assert_eq!(
            store.get(Column::Meta, b"k").expect("get"),
            Some(b"second".to_vec())
        );
    }
}
