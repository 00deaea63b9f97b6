#![cfg(feature = "fjall")]

use rivd_storage::fjall::{FjallOptions, FjallStore};
use rivd_storage::{Column, KeyValueStore, WriteBatch};

#[test]
fn fjall_batch_and_ordered_scan() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FjallStore::open(dir.path()).expect("open fjall");

    let mut batch = WriteBatch::new();
    batch.put(Column::CoinOutputs, [2u8; 32], b"two".to_vec());
    batch.put(Column::CoinOutputs, [1u8; 32], b"one".to_vec());
    batch.put(Column::Meta, b"version", b"1.0.5".to_vec());
    store.write_batch(&batch).expect("commit");

    let keys: Vec<Vec<u8>> = store
        .scan_prefix(Column::CoinOutputs, &[])
        .expect("scan")
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, vec![vec![1u8; 32], vec![2u8; 32]]);

    let mut batch = WriteBatch::new();
    batch.delete(Column::CoinOutputs, [1u8; 32]);
    store.write_batch(&batch).expect("commit delete");
    assert!(store.get(Column::CoinOutputs, &[1u8; 32]).expect("get").is_none());
}

#[test]
fn fjall_reopen_keeps_synced_batches() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = FjallOptions {
        sync_batches: true,
        ..FjallOptions::default()
    };
    {
        let store = FjallStore::open_with_options(dir.path(), options.clone()).expect("open");
        let mut batch = WriteBatch::new();
        batch.put(Column::ConfirmedTransactions, [7u8; 32], Vec::new());
        store.write_batch(&batch).expect("commit");
    }
    let store = FjallStore::open_with_options(dir.path(), options).expect("reopen");
    assert!(store
        .contains(Column::ConfirmedTransactions, &[7u8; 32])
        .expect("contains"));
}
