//! Consensus database records, schema metadata and the legacy store upgrade.

pub mod change;
pub mod database;
pub mod diff;
pub mod legacy;
pub mod metadata;
pub mod migration;
pub mod processed_block;

pub use change::{ConsensusChange, ConsensusChangeId};
pub use database::{ConsensusDb, DatabaseError};
pub use diff::{
    BlockStakeOutputDiff, CoinOutputDiff, DelayedCoinOutputDiff, DiffDirection, TransactionIdDiff,
};
pub use metadata::{open_with_metadata, Metadata, MetadataError};
pub use migration::{
    convert_legacy_database, migrate_records, MigrationError, MigrationReport, Section,
    SectionReport,
};
#[cfg(feature = "fjall")]
pub use migration::convert_legacy_database_at;
pub use processed_block::{BlockDiffs, LegacyProcessedBlock, ProcessedBlock};
