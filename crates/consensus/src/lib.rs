//! Consensus-wide constants and shared scalar types.

pub mod constants;

pub type Hash256 = [u8; 32];

/// Height of a block above genesis (genesis is 0).
pub type BlockHeight = u64;

pub use constants::{
    CONSENSUS_DB_HEADER, CONSENSUS_DB_LEGACY_VERSION, CONSENSUS_DB_VERSION,
    TRANSACTION_POOL_DB_HEADER, TRANSACTION_POOL_DB_VERSION,
};
