//! Reconciles the transaction pool with consensus changes.

use parking_lot::RwLockWriteGuard;
use rivd_chainstate::ConsensusChange;
use rivd_log::{log_debug, log_error};
use rivd_primitives::encoding::encode;
use rivd_primitives::{hash256_to_hex, Transaction};
use rivd_storage::{KeyValueStore, WriteBatch};

use crate::confirmed::stage_consensus_change;
use crate::consensus_set::{ConsensusSet, LockedConsensus};
use crate::relay::RelayJob;
use crate::txpool::{notify_subscribers, transaction_set_id, PoolState, TransactionPool};

impl<S: KeyValueStore, C: ConsensusSet> TransactionPool<S, C> {
    /// Applies one consensus change to the pool.
    ///
    /// Called by the consensus engine while it holds its own lock; `locked` is
    /// that engine state. Transactions confirmed by the applied blocks leave
    /// the pool, every remaining set is revalidated against the new state,
    /// and sets that no longer validate are dropped. Transactions of reverted
    /// blocks are not returned to the pool.
    pub fn process_consensus_change(&self, locked: &dyn LockedConsensus, change: &ConsensusChange) {
        let mut state = self.state.write();

        let mut batch = WriteBatch::new();
        stage_consensus_change(&mut batch, change);
        if let Err(err) = self.db.commit(&batch) {
            // The in-memory pool is still reconciled below; only the durable
            // index disagrees with the chain from here on.
            log_error!(
                "failed to record consensus change {} in the transaction pool database: {err}",
                change.id
            );
        }

        for block in &change.applied_blocks {
            for txn in &block.transactions {
                let single = transaction_set_id(std::slice::from_ref(txn));
                state.broadcast_cache.delete(&single);
            }
        }

        let confirmed = change.applied_transaction_ids();
        let unconfirmed: Vec<Vec<Transaction>> = state
            .sorted_set_ids()
            .iter()
            .filter_map(|id| state.transaction_sets.get(id))
            .map(|set| {
                set.iter()
                    .filter(|txn| !confirmed.contains(&txn.id()))
                    .cloned()
                    .collect()
            })
            .collect();
        let held = unconfirmed.len();

        state.purge();

        let mut dropped = 0usize;
        for set in unconfirmed {
            let id = transaction_set_id(&set);
            if let Err(err) = self.accept_locked(&mut state, locked, set) {
                log_debug!(
                    "dropping transaction set {} after consensus change: {err}",
                    hash256_to_hex(&id)
                );
                state.broadcast_cache.delete(&id);
                dropped += 1;
            }
        }
        let PoolState {
            broadcast_cache,
            transaction_sets,
            ..
        } = &mut *state;
        broadcast_cache.retain(|id| transaction_sets.contains_key(id));

        let mut relayed = 0usize;
        if change.synced {
            let height = locked.height();
            for id in state.broadcast_cache.take_due(height) {
                let Some(set) = state.transaction_sets.get(&id) else {
                    continue;
                };
                if self.relay.submit(RelayJob {
                    set_id: id,
                    payload: encode(set.as_slice()),
                }) {
                    relayed += 1;
                }
            }
        }

        log_debug!(
            "consensus change {}: -{} +{} blocks, {held} sets held, {dropped} dropped, {relayed} relayed",
            change.id,
            change.reverted_blocks.len(),
            change.applied_blocks.len()
        );

        let state = RwLockWriteGuard::downgrade(state);
        notify_subscribers(&state);
    }
}
