//! Constants shared by the consensus database and the transaction pool.

/// Header stored in the consensus database metadata.
pub const CONSENSUS_DB_HEADER: &str = "Consensus Set Database";
/// Schema version written before unlock conditions existed.
pub const CONSENSUS_DB_LEGACY_VERSION: &str = "0.5.0";
/// Schema version of the current output/diff encoding.
pub const CONSENSUS_DB_VERSION: &str = "1.0.5";

pub const TRANSACTION_POOL_DB_HEADER: &str = "Transaction Pool Database";
pub const TRANSACTION_POOL_DB_VERSION: &str = "1.0.5";

/// Maximum encoded size of a single transaction set.
pub const TRANSACTION_SET_SIZE_LIMIT: usize = 250_000;
/// Maximum aggregate encoded size of all pooled transaction sets.
pub const TRANSACTION_POOL_SIZE_LIMIT: usize = 20_000_000;

/// Default number of relay worker threads.
pub const DEFAULT_RELAY_WORKERS: usize = 2;
/// Default depth of the relay job queue.
pub const DEFAULT_RELAY_QUEUE: usize = 1_024;

/// Message kind used when announcing transaction sets to peers.
pub const RELAY_TRANSACTION_SET: &str = "RelayTransactionSet";
