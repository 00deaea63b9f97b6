//! Durable index of confirmed transaction ids kept by the transaction pool.

use rivd_chainstate::{open_with_metadata, ConsensusChange, ConsensusChangeId, Metadata};
use rivd_consensus::{TRANSACTION_POOL_DB_HEADER, TRANSACTION_POOL_DB_VERSION};
use rivd_primitives::encoding::{decode, encode};
use rivd_primitives::TransactionId;
use rivd_storage::{Column, KeyValueStore, WriteBatch};

use crate::txpool::PoolError;

pub const RECENT_CONSENSUS_CHANGE_KEY: &[u8] = b"recent_consensus_change";

pub fn pool_db_metadata() -> Metadata {
    Metadata::new(TRANSACTION_POOL_DB_HEADER, TRANSACTION_POOL_DB_VERSION)
}

/// Queues the index updates for `change`: reverted ids are removed and
/// applied ids added, each in block order, then the change id recorded.
pub fn stage_consensus_change(batch: &mut WriteBatch, change: &ConsensusChange) {
    for block in &change.reverted_blocks {
        for txn in &block.transactions {
            batch.delete(Column::ConfirmedTransactions, txn.id());
        }
    }
    for block in &change.applied_blocks {
        for txn in &block.transactions {
            batch.put(Column::ConfirmedTransactions, txn.id(), Vec::<u8>::new());
        }
    }
    batch.put(Column::Meta, RECENT_CONSENSUS_CHANGE_KEY, encode(&change.id));
}

pub struct PoolDb<S> {
    store: S,
}

impl<S: KeyValueStore> PoolDb<S> {
    pub fn open(store: S) -> Result<Self, PoolError> {
        open_with_metadata(&store, &pool_db_metadata())?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_confirmed(&self, txid: &TransactionId) -> Result<bool, PoolError> {
        Ok(self.store.contains(Column::ConfirmedTransactions, txid)?)
    }

    /// Id of the last change recorded, or the beginning when none was.
    pub fn recent_consensus_change(&self) -> Result<ConsensusChangeId, PoolError> {
        match self.store.get(Column::Meta, RECENT_CONSENSUS_CHANGE_KEY)? {
            Some(bytes) => Ok(decode(&bytes)?),
            None => Ok(ConsensusChangeId::BEGINNING),
        }
    }

    pub fn commit(&self, batch: &WriteBatch) -> Result<(), PoolError> {
        self.store.write_batch(batch)?;
        Ok(())
    }

    /// Forgets every confirmed id and rewinds the change id to the beginning.
    pub fn reset(&self) -> Result<(), PoolError> {
        let mut batch = WriteBatch::new();
        for (key, _) in self.store.scan_prefix(Column::ConfirmedTransactions, &[])? {
            batch.delete(Column::ConfirmedTransactions, key);
        }
        batch.put(
            Column::Meta,
            RECENT_CONSENSUS_CHANGE_KEY,
            encode(&ConsensusChangeId::BEGINNING),
        );
        self.commit(&batch)
    }
}
