//! Pool of unconfirmed transaction sets.
//!
//! A transaction set is an ordered list of transactions that is valid as a
//! unit; later transactions may spend outputs created by earlier ones. Sets
//! that touch the same inputs or outputs are merged into one superset on
//! admission, so every object is owned by at most one pooled set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rivd_chainstate::{ConsensusChange, ConsensusChangeId, MetadataError};
use rivd_consensus::constants::{
    DEFAULT_RELAY_QUEUE, DEFAULT_RELAY_WORKERS, TRANSACTION_POOL_SIZE_LIMIT,
    TRANSACTION_SET_SIZE_LIMIT,
};
use rivd_consensus::{BlockHeight, Hash256};
use rivd_log::log_debug;
use rivd_primitives::encoding::encode;
use rivd_primitives::{hash256_to_hex, hash_object, DecodeError, Transaction, TransactionId};
use rivd_storage::{KeyValueStore, StoreError};
use thiserror::Error;

use crate::broadcast_cache::BroadcastCache;
use crate::confirmed::PoolDb;
use crate::consensus_set::{ConsensusSet, LockedConsensus};
use crate::relay::{Gateway, Relay, RelayJob};

pub type TransactionSetId = Hash256;
/// An input spent or an output created by a pooled transaction.
pub type ObjectId = Hash256;

pub fn transaction_set_id(txns: &[Transaction]) -> TransactionSetId {
    hash_object(txns)
}

fn related_objects(txn: &Transaction) -> Vec<ObjectId> {
    let mut objects = Vec::with_capacity(
        txn.coin_inputs.len()
            + txn.block_stake_inputs.len()
            + txn.coin_outputs.len()
            + txn.block_stake_outputs.len(),
    );
    objects.extend(txn.coin_inputs.iter().map(|input| input.parent_id));
    objects.extend(txn.block_stake_inputs.iter().map(|input| input.parent_id));
    objects.extend(txn.coin_output_ids());
    objects.extend(txn.block_stake_output_ids());
    objects
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PoolErrorKind {
    EmptySet,
    DuplicateSet,
    SetTooLarge,
    PoolFull,
    AlreadyConfirmed,
    Invalid,
    Database,
}

#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct PoolError {
    pub kind: PoolErrorKind,
    pub message: String,
}

impl PoolError {
    pub fn new(kind: PoolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<StoreError> for PoolError {
    fn from(err: StoreError) -> Self {
        PoolError::new(PoolErrorKind::Database, err.to_string())
    }
}

impl From<MetadataError> for PoolError {
    fn from(err: MetadataError) -> Self {
        PoolError::new(PoolErrorKind::Database, err.to_string())
    }
}

impl From<DecodeError> for PoolError {
    fn from(err: DecodeError) -> Self {
        PoolError::new(PoolErrorKind::Database, format!("corrupt pool record: {err}"))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    pub max_pool_bytes: usize,
    pub max_set_bytes: usize,
    pub relay_workers: usize,
    pub relay_queue: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_bytes: TRANSACTION_POOL_SIZE_LIMIT,
            max_set_bytes: TRANSACTION_SET_SIZE_LIMIT,
            relay_workers: DEFAULT_RELAY_WORKERS,
            relay_queue: DEFAULT_RELAY_QUEUE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    pub transaction_sets: usize,
    pub transactions: usize,
    pub size_bytes: usize,
    pub known_objects: usize,
    pub broadcast_cache_entries: usize,
    pub relay_queued: usize,
}

pub trait TransactionPoolSubscriber: Send + Sync {
    /// Called after every pool update while the pool is held shared. The
    /// subscriber may read the pool but must not modify it.
    fn on_transaction_pool_update(&self, view: &PoolView<'_>);
}

#[derive(Default)]
pub(crate) struct PoolState {
    pub(crate) known_objects: HashMap<ObjectId, TransactionSetId>,
    pub(crate) transaction_sets: HashMap<TransactionSetId, Vec<Transaction>>,
    pub(crate) transaction_set_diffs: HashMap<TransactionSetId, ConsensusChange>,
    pub(crate) transaction_list_size: usize,
    pub(crate) broadcast_cache: BroadcastCache,
    pub(crate) subscribers: Vec<Arc<dyn TransactionPoolSubscriber>>,
}

impl PoolState {
    /// Drops every pooled set. The broadcast cache is left to the caller.
    pub(crate) fn purge(&mut self) {
        self.known_objects.clear();
        self.transaction_sets.clear();
        self.transaction_set_diffs.clear();
        self.transaction_list_size = 0;
    }

    pub(crate) fn sorted_set_ids(&self) -> Vec<TransactionSetId> {
        let mut ids: Vec<_> = self.transaction_sets.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn conflicting_sets(&self, txns: &[Transaction]) -> Vec<TransactionSetId> {
        let mut conflicts: Vec<TransactionSetId> = txns
            .iter()
            .flat_map(related_objects)
            .filter_map(|object| self.known_objects.get(&object).copied())
            .collect();
        conflicts.sort_unstable();
        conflicts.dedup();
        conflicts
    }

    fn insert_set(
        &mut self,
        id: TransactionSetId,
        txns: Vec<Transaction>,
        diffs: ConsensusChange,
        size: usize,
    ) {
        for txn in &txns {
            for object in related_objects(txn) {
                self.known_objects.insert(object, id);
            }
        }
        self.transaction_sets.insert(id, txns);
        self.transaction_set_diffs.insert(id, diffs);
        self.transaction_list_size += size;
    }

    fn remove_set(&mut self, id: &TransactionSetId) -> Option<Vec<Transaction>> {
        let txns = self.transaction_sets.remove(id)?;
        for txn in &txns {
            for object in related_objects(txn) {
                if self.known_objects.get(&object) == Some(id) {
                    self.known_objects.remove(&object);
                }
            }
        }
        self.transaction_set_diffs.remove(id);
        self.transaction_list_size = self
            .transaction_list_size
            .saturating_sub(encode(txns.as_slice()).len());
        Some(txns)
    }
}

pub(crate) fn notify_subscribers(state: &PoolState) {
    let view = PoolView { state };
    for subscriber in &state.subscribers {
        subscriber.on_transaction_pool_update(&view);
    }
}

/// Read-only view of the pool handed to subscribers.
pub struct PoolView<'a> {
    state: &'a PoolState,
}

impl<'a> PoolView<'a> {
    pub fn set_ids(&self) -> Vec<TransactionSetId> {
        self.state.sorted_set_ids()
    }

    pub fn transaction_set(&self, id: &TransactionSetId) -> Option<&'a [Transaction]> {
        self.state.transaction_sets.get(id).map(Vec::as_slice)
    }

    pub fn transaction_set_diffs(&self, id: &TransactionSetId) -> Option<&'a ConsensusChange> {
        self.state.transaction_set_diffs.get(id)
    }

    /// Every pooled transaction, grouped by set in ascending set id order.
    pub fn transaction_list(&self) -> Vec<Transaction> {
        self.set_ids()
            .iter()
            .filter_map(|id| self.state.transaction_sets.get(id))
            .flat_map(|set| set.iter().cloned())
            .collect()
    }

    pub fn set_count(&self) -> usize {
        self.state.transaction_sets.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.state.transaction_list_size
    }
}

pub struct TransactionPool<S, C> {
    pub(crate) db: PoolDb<S>,
    pub(crate) consensus: Arc<C>,
    pub(crate) relay: Relay,
    pub(crate) config: PoolConfig,
    pub(crate) state: RwLock<PoolState>,
}

impl<S: KeyValueStore, C: ConsensusSet> TransactionPool<S, C> {
    pub fn new<G: Gateway>(
        store: S,
        consensus: Arc<C>,
        gateway: Arc<G>,
        config: PoolConfig,
    ) -> Result<Self, PoolError> {
        let db = PoolDb::open(store)?;
        let relay = Relay::spawn(gateway, config.relay_workers, config.relay_queue);
        Ok(Self {
            db,
            consensus,
            relay,
            config,
            state: RwLock::new(PoolState::default()),
        })
    }

    /// Validates `txns` against consensus and adds them to the pool, merging
    /// them with any pooled sets they conflict with. On success the stored
    /// set is relayed to peers and its id returned.
    pub fn accept_transaction_set(
        &self,
        txns: Vec<Transaction>,
    ) -> Result<TransactionSetId, PoolError> {
        let (id, payload) = self.consensus.with_locked(|locked: &dyn LockedConsensus| {
            let mut state = self.state.write();
            let id = self.accept_locked(&mut state, locked, txns)?;
            let payload = state
                .transaction_sets
                .get(&id)
                .map(|set| encode(set.as_slice()));
            let state = RwLockWriteGuard::downgrade(state);
            notify_subscribers(&state);
            Ok::<_, PoolError>((id, payload))
        })?;
        if let Some(payload) = payload {
            self.relay.submit(RelayJob {
                set_id: id,
                payload,
            });
        }
        Ok(id)
    }

    /// Admission shared by new submissions and consensus-change re-admission.
    /// The caller holds the consensus lock (proved by `locked`) and the pool
    /// lock (proved by `state`).
    pub(crate) fn accept_locked(
        &self,
        state: &mut PoolState,
        locked: &dyn LockedConsensus,
        txns: Vec<Transaction>,
    ) -> Result<TransactionSetId, PoolError> {
        if txns.is_empty() {
            return Err(PoolError::new(
                PoolErrorKind::EmptySet,
                "transaction set is empty",
            ));
        }
        let id = transaction_set_id(&txns);
        if state.transaction_sets.contains_key(&id) {
            return Err(PoolError::new(
                PoolErrorKind::DuplicateSet,
                "transaction set is already in the pool",
            ));
        }
        let size = encode(txns.as_slice()).len();
        self.check_set_size(size)?;
        for txn in &txns {
            if self.db.is_confirmed(&txn.id())? {
                return Err(PoolError::new(
                    PoolErrorKind::AlreadyConfirmed,
                    format!("transaction {} is already confirmed", hash256_to_hex(&txn.id())),
                ));
            }
        }

        let conflicts = state.conflicting_sets(&txns);
        if !conflicts.is_empty() {
            return self.accept_superset(state, locked, txns, conflicts);
        }

        self.check_pool_capacity(state.transaction_list_size, size)?;
        let diffs = locked
            .try_transaction_set(&txns)
            .map_err(|err| PoolError::new(PoolErrorKind::Invalid, err.to_string()))?;
        state.insert_set(id, txns, diffs, size);
        state.broadcast_cache.add(id, locked.height());
        Ok(id)
    }

    /// Replaces the `conflicts` with one set holding their transactions
    /// followed by the new ones.
    fn accept_superset(
        &self,
        state: &mut PoolState,
        locked: &dyn LockedConsensus,
        txns: Vec<Transaction>,
        conflicts: Vec<TransactionSetId>,
    ) -> Result<TransactionSetId, PoolError> {
        let mut seen: HashSet<TransactionId> = HashSet::new();
        let mut superset = Vec::new();
        let mut released = 0usize;
        for conflict in &conflicts {
            let Some(set) = state.transaction_sets.get(conflict) else {
                continue;
            };
            released += encode(set.as_slice()).len();
            for txn in set {
                if seen.insert(txn.id()) {
                    superset.push(txn.clone());
                }
            }
        }
        let pooled = superset.len();
        for txn in txns {
            if seen.insert(txn.id()) {
                superset.push(txn);
            }
        }
        if superset.len() == pooled {
            return Err(PoolError::new(
                PoolErrorKind::DuplicateSet,
                "every transaction of the set is already in the pool",
            ));
        }

        let size = encode(superset.as_slice()).len();
        self.check_set_size(size)?;
        self.check_pool_capacity(state.transaction_list_size.saturating_sub(released), size)?;
        let diffs = locked
            .try_transaction_set(&superset)
            .map_err(|err| PoolError::new(PoolErrorKind::Invalid, err.to_string()))?;

        for conflict in &conflicts {
            state.remove_set(conflict);
            state.broadcast_cache.delete(conflict);
        }
        let id = transaction_set_id(&superset);
        log_debug!(
            "merged {} pooled transaction sets into {}",
            conflicts.len(),
            hash256_to_hex(&id)
        );
        state.insert_set(id, superset, diffs, size);
        state.broadcast_cache.add(id, locked.height());
        Ok(id)
    }

    fn check_set_size(&self, size: usize) -> Result<(), PoolError> {
        if size > self.config.max_set_bytes {
            return Err(PoolError::new(
                PoolErrorKind::SetTooLarge,
                format!(
                    "transaction set is {size} bytes, limit {}",
                    self.config.max_set_bytes
                ),
            ));
        }
        Ok(())
    }

    fn check_pool_capacity(&self, pooled: usize, size: usize) -> Result<(), PoolError> {
        if pooled.saturating_add(size) > self.config.max_pool_bytes {
            return Err(PoolError::new(
                PoolErrorKind::PoolFull,
                format!(
                    "transaction pool is full ({pooled} of {} bytes used)",
                    self.config.max_pool_bytes
                ),
            ));
        }
        Ok(())
    }

    /// Drops every pooled set along with its broadcast-cache entry. The
    /// confirmed index is kept.
    pub fn purge_transaction_pool(&self) {
        let mut state = self.state.write();
        state.purge();
        state.broadcast_cache.retain(|_| false);
    }

    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        // Recursive so subscribers may read while an update holds the
        // downgraded lock, even with a writer queued.
        self.state.read_recursive()
    }

    pub fn transaction_list(&self) -> Vec<Transaction> {
        let state = self.read();
        PoolView { state: &*state }.transaction_list()
    }

    pub fn transaction_set(&self, id: &TransactionSetId) -> Option<Vec<Transaction>> {
        self.read().transaction_sets.get(id).cloned()
    }

    pub fn transaction_set_ids(&self) -> Vec<TransactionSetId> {
        self.read().sorted_set_ids()
    }

    pub fn contains_transaction(&self, txid: &TransactionId) -> bool {
        self.read()
            .transaction_sets
            .values()
            .flatten()
            .any(|txn| txn.id() == *txid)
    }

    pub fn broadcast_height(&self, id: &TransactionSetId) -> Option<BlockHeight> {
        self.read().broadcast_cache.height(id)
    }

    pub fn is_confirmed(&self, txid: &TransactionId) -> Result<bool, PoolError> {
        self.db.is_confirmed(txid)
    }

    pub fn recent_consensus_change(&self) -> Result<ConsensusChangeId, PoolError> {
        self.db.recent_consensus_change()
    }

    /// Clears the confirmed index so the pool can resubscribe from the
    /// beginning of the chain.
    pub fn reset_durable_state(&self) -> Result<(), PoolError> {
        let _state = self.state.write();
        self.db.reset()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.read();
        PoolStats {
            transaction_sets: state.transaction_sets.len(),
            transactions: state.transaction_sets.values().map(Vec::len).sum(),
            size_bytes: state.transaction_list_size,
            known_objects: state.known_objects.len(),
            broadcast_cache_entries: state.broadcast_cache.len(),
            relay_queued: self.relay.queued(),
        }
    }

    /// Registers `subscriber` and immediately hands it the current pool.
    pub fn subscribe(&self, subscriber: Arc<dyn TransactionPoolSubscriber>) {
        let mut state = self.state.write();
        state.subscribers.push(Arc::clone(&subscriber));
        let state = RwLockWriteGuard::downgrade(state);
        subscriber.on_transaction_pool_update(&PoolView { state: &*state });
    }

    pub fn unsubscribe(&self, subscriber: &Arc<dyn TransactionPoolSubscriber>) {
        let target = Arc::as_ptr(subscriber) as *const ();
        self.state
            .write()
            .subscribers
            .retain(|existing| Arc::as_ptr(existing) as *const () != target);
    }
}
