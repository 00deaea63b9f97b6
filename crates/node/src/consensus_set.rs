//! The slice of the consensus engine the transaction pool depends on.
//!
//! The engine lock always comes before the pool lock. Pool code never takes
//! the engine lock itself on the reactor path: it only receives a
//! [`LockedConsensus`], which exists only inside [`ConsensusSet::with_locked`]
//! or as the argument the engine passes when it delivers a change.

use rivd_chainstate::ConsensusChange;
use rivd_consensus::BlockHeight;
use rivd_primitives::Transaction;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Consensus state as seen by a caller holding the engine lock.
pub trait LockedConsensus {
    fn height(&self) -> BlockHeight;

    /// Validates `txns` in order on top of the current state and returns the
    /// diffs they would produce. Nothing is committed.
    fn try_transaction_set(&self, txns: &[Transaction]) -> Result<ConsensusChange, ValidationError>;
}

pub trait ConsensusSet: Send + Sync {
    /// Runs `f` while holding the engine lock.
    fn with_locked<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&dyn LockedConsensus) -> R;
}
