use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rivd::{
    ConsensusSet, Gateway, LockedConsensus, PoolConfig, TransactionPool, ValidationError,
};
use rivd_chainstate::{ConsensusChange, ConsensusChangeId};
use rivd_consensus::BlockHeight;
use rivd_log::Level;
use rivd_primitives::{Block, Transaction};
use rivd_storage::memory::MemoryStore;
use rivd_storage::{Column, KeyValueStore, PrefixVisitor, ScanResult, StoreError, WriteBatch};

struct FlakyStore {
    inner: MemoryStore,
    fail_batches: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(column, key)
    }

    fn put(&self, column: Column, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.inner.put(column, key, value)
    }

    fn delete(&self, column: Column, key: &[u8]) -> Result<(), StoreError> {
        self.inner.delete(column, key)
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        self.inner.scan_prefix(column, prefix)
    }

    fn for_each_prefix<'a>(
        &self,
        column: Column,
        prefix: &[u8],
        visitor: &mut PrefixVisitor<'a>,
    ) -> Result<(), StoreError> {
        self.inner.for_each_prefix(column, prefix, visitor)
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.write_batch(batch)
    }
}

#[derive(Default)]
struct StaticConsensus {
    lock: Mutex<()>,
}

impl LockedConsensus for StaticConsensus {
    fn height(&self) -> BlockHeight {
        4
    }

    fn try_transaction_set(&self, _txns: &[Transaction]) -> Result<ConsensusChange, ValidationError> {
        Ok(ConsensusChange::default())
    }
}

impl ConsensusSet for StaticConsensus {
    fn with_locked<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&dyn LockedConsensus) -> R,
    {
        let _guard = self.lock.lock();
        f(self)
    }
}

struct NoPeers;

impl Gateway for NoPeers {
    fn peers(&self) -> Vec<SocketAddr> {
        Vec::new()
    }

    fn broadcast(&self, _kind: &str, _payload: &[u8], _peers: &[SocketAddr]) -> Result<(), String> {
        Ok(())
    }
}

fn txn(tag: u8) -> Transaction {
    Transaction {
        arbitrary_data: vec![tag],
        ..Transaction::default()
    }
}

#[test]
fn failed_index_write_is_logged_and_pool_still_reconciles() {
    rivd_log::set_stderr_enabled(false);
    rivd_log::enable_capture(64);
    rivd_log::clear_captured_logs();

    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        fail_batches: AtomicBool::new(false),
    });
    let consensus = Arc::new(StaticConsensus::default());
    let pool = TransactionPool::new(
        Arc::clone(&store),
        Arc::clone(&consensus),
        Arc::new(NoPeers),
        PoolConfig::default(),
    )
    .expect("pool");
    pool.accept_transaction_set(vec![txn(1), txn(2)])
        .expect("accept");

    store.fail_batches.store(true, Ordering::SeqCst);
    let change = ConsensusChange {
        id: ConsensusChangeId([7; 32]),
        applied_blocks: vec![Block {
            transactions: vec![txn(1)],
            ..Block::default()
        }],
        ..ConsensusChange::default()
    };
    consensus.with_locked(|locked| pool.process_consensus_change(locked, &change));

    assert_eq!(pool.transaction_list(), vec![txn(2)]);
    assert!(!pool.is_confirmed(&txn(1).id()).expect("lookup"));
    assert_eq!(
        pool.recent_consensus_change().expect("recent"),
        ConsensusChangeId::BEGINNING
    );

    let logs = rivd_log::capture_snapshot(64);
    let failure = logs
        .iter()
        .find(|record| record.level == Level::Error)
        .expect("error logged");
    assert!(failure.msg.contains(&change.id.to_string()), "{}", failure.msg);
    assert!(failure.msg.contains("disk full"), "{}", failure.msg);
    rivd_log::disable_capture();
}
