//! Transaction pool, consensus-change reactor and node tooling.

pub mod broadcast_cache;
pub mod config;
pub mod confirmed;
pub mod consensus_set;
pub mod migrate_cli;
pub mod relay;
pub mod txpool;
mod update;

pub use broadcast_cache::BroadcastCache;
pub use config::{ConfigError, NodeConfig};
pub use confirmed::PoolDb;
pub use consensus_set::{ConsensusSet, LockedConsensus, ValidationError};
pub use relay::{Gateway, Relay, RelayJob};
pub use txpool::{
    transaction_set_id, PoolConfig, PoolError, PoolErrorKind, PoolStats, PoolView,
    TransactionPool, TransactionPoolSubscriber, TransactionSetId,
};
