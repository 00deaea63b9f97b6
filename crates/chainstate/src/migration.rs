//! In-place upgrade of a consensus store from the legacy schema.
//!
//! Every record of every migrated column is probed as legacy first and as
//! current second. Legacy records are rewritten in the current layout, current
//! records are left alone, and a record that decodes as neither aborts the
//! whole run. All rewrites and the new metadata tag go into one write batch
//! with the tag last, so an interrupted run leaves the store at the legacy tag
//! and a rerun converges to the same result.

use std::fmt;

use rivd_primitives::encoding::{decode, encode, Decodable, Encodable};
use rivd_primitives::{DecodeError, LegacyOutput, Output};
use rivd_storage::{Column, KeyValueStore, StoreError, WriteBatch};
use thiserror::Error;

use crate::legacy::LegacyProcessedBlock;
use crate::metadata::{Metadata, MetadataError};
use crate::processed_block::ProcessedBlock;

/// Column groups rewritten by the migration, in processing order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Section {
    BlockMap,
    CoinOutputs,
    BlockStakeOutputs,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::BlockMap,
        Section::CoinOutputs,
        Section::BlockStakeOutputs,
    ];

    pub fn column(self) -> Column {
        match self {
            Section::BlockMap => Column::BlockMap,
            Section::CoinOutputs => Column::CoinOutputs,
            Section::BlockStakeOutputs => Column::BlockStakeOutputs,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.column().as_str()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SectionReport {
    pub scanned: u64,
    /// Legacy records queued for rewrite.
    pub rewritten: u64,
    pub already_current: u64,
    /// Legacy records whose current encoding is byte-identical.
    pub unchanged: u64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MigrationReport {
    pub block_map: SectionReport,
    pub coin_outputs: SectionReport,
    pub block_stake_outputs: SectionReport,
}

impl MigrationReport {
    pub fn section(&self, section: Section) -> &SectionReport {
        match section {
            Section::BlockMap => &self.block_map,
            Section::CoinOutputs => &self.coin_outputs,
            Section::BlockStakeOutputs => &self.block_stake_outputs,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut SectionReport {
        match section {
            Section::BlockMap => &mut self.block_map,
            Section::CoinOutputs => &mut self.coin_outputs,
            Section::BlockStakeOutputs => &mut self.block_stake_outputs,
        }
    }

    pub fn total_scanned(&self) -> u64 {
        Section::ALL
            .iter()
            .map(|section| self.section(*section).scanned)
            .sum()
    }

    pub fn total_rewritten(&self) -> u64 {
        Section::ALL
            .iter()
            .map(|section| self.section(*section).rewritten)
            .sum()
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("corrupt record {key} in {section}: legacy decode: {legacy}; current decode: {current}")]
    CorruptRecord {
        section: Section,
        /// Hex-encoded record key.
        key: String,
        legacy: DecodeError,
        current: DecodeError,
    },
}

enum RecordState {
    Legacy(Vec<u8>),
    Current,
}

fn probe<L, C>(value: &[u8], upgrade: fn(L) -> C) -> Result<RecordState, (DecodeError, DecodeError)>
where
    L: Decodable,
    C: Decodable + Encodable,
{
    match decode::<L>(value) {
        Ok(legacy) => Ok(RecordState::Legacy(encode(&upgrade(legacy)))),
        Err(legacy_err) => match decode::<C>(value) {
            Ok(_) => Ok(RecordState::Current),
            Err(current_err) => Err((legacy_err, current_err)),
        },
    }
}

fn classify(section: Section, value: &[u8]) -> Result<RecordState, (DecodeError, DecodeError)> {
    match section {
        Section::BlockMap => {
            probe::<LegacyProcessedBlock, ProcessedBlock>(value, LegacyProcessedBlock::upgrade)
        }
        Section::CoinOutputs | Section::BlockStakeOutputs => {
            probe::<LegacyOutput, Output>(value, Output::from)
        }
    }
}

/// Queues the rewrite of every legacy record in `section` into `batch`.
fn migrate_section<S: KeyValueStore + ?Sized>(
    store: &S,
    section: Section,
    batch: &mut WriteBatch,
    report: &mut SectionReport,
) -> Result<(), MigrationError> {
    let mut failure = None;
    let mut visitor = |key: &[u8], value: &[u8]| -> Result<(), StoreError> {
        report.scanned += 1;
        match classify(section, value) {
            Ok(RecordState::Current) => report.already_current += 1,
            Ok(RecordState::Legacy(upgraded)) if upgraded.as_slice() == value => {
                report.unchanged += 1;
            }
            Ok(RecordState::Legacy(upgraded)) => {
                batch.put(section.column(), key, upgraded);
                report.rewritten += 1;
            }
            Err((legacy, current)) => {
                failure = Some(MigrationError::CorruptRecord {
                    section,
                    key: hex::encode(key),
                    legacy,
                    current,
                });
                return Err(StoreError::Backend("migration aborted".to_string()));
            }
        }
        Ok(())
    };
    let scanned = store.for_each_prefix(section.column(), &[], &mut visitor);
    if let Some(err) = failure {
        return Err(err);
    }
    scanned?;
    Ok(())
}

/// Classifies every record of every section and returns the batch holding the
/// legacy rewrites. Nothing is written to `store`.
pub fn migrate_records<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<(WriteBatch, MigrationReport), MigrationError> {
    let mut batch = WriteBatch::new();
    let mut report = MigrationReport::default();
    for section in Section::ALL {
        migrate_section(store, section, &mut batch, report.section_mut(section))?;
        let counts = report.section(section);
        rivd_log::log_debug!(
            "migration: {section} scanned {} rewritten {} current {} unchanged {}",
            counts.scanned,
            counts.rewritten,
            counts.already_current,
            counts.unchanged
        );
    }
    Ok((batch, report))
}

/// Upgrades a store tagged with the legacy version to the current schema.
///
/// Fails without writing anything unless the store carries the legacy tag.
pub fn convert_legacy_database<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<MigrationReport, MigrationError> {
    let found = Metadata::load(store)?.ok_or(MetadataError::Missing)?;
    found.check(&Metadata::legacy())?;

    rivd_log::log_info!(
        "Upgrading consensus database from version {} to {}",
        found.version,
        Metadata::current().version
    );
    let (mut batch, report) = migrate_records(store)?;
    Metadata::current().save(&mut batch);
    store.write_batch(&batch)?;

    rivd_log::log_info!(
        "Consensus database upgraded: {} records scanned, {} rewritten",
        report.total_scanned(),
        report.total_rewritten()
    );
    Ok(report)
}

/// Opens the on-disk store at `path` and upgrades it in place.
#[cfg(feature = "fjall")]
pub fn convert_legacy_database_at(
    path: impl AsRef<std::path::Path>,
    options: rivd_storage::fjall::FjallOptions,
) -> Result<MigrationReport, MigrationError> {
    let store = rivd_storage::fjall::FjallStore::open_with_options(path, options)?;
    let report = convert_legacy_database(&store)?;
    store.persist()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivd_primitives::unlock::UNLOCK_TYPE_PUBKEY;
    use rivd_primitives::{Currency, UnlockCondition, UnlockHash};
    use rivd_storage::memory::MemoryStore;

    fn legacy_output(tag: u8) -> LegacyOutput {
        LegacyOutput {
            value: Currency::new(u128::from(tag) * 10),
            unlock_hash: UnlockHash::new(UNLOCK_TYPE_PUBKEY, [tag; 32]),
        }
    }

    #[test]
    fn legacy_output_is_upgraded() {
        let legacy = legacy_output(4);
        let bytes = encode(&legacy);
        match classify(Section::CoinOutputs, &bytes) {
            Ok(RecordState::Legacy(upgraded)) => {
                assert_eq!(decode::<Output>(&upgraded).expect("current"), legacy.upgrade());
            }
            _ => panic!("expected legacy classification"),
        }
    }

    #[test]
    fn current_output_is_skipped() {
        let current = Output::new(
            Currency::new(9),
            UnlockCondition::unlock_hash_condition(UnlockHash::new(UNLOCK_TYPE_PUBKEY, [7; 32])),
        );
        assert!(matches!(
            classify(Section::BlockStakeOutputs, &encode(&current)),
            Ok(RecordState::Current)
        ));
    }

    #[test]
    fn garbage_is_reported_with_both_errors() {
        let store = MemoryStore::new();
        store
            .put(Column::CoinOutputs, &[0xab, 0xcd], &[1, 2, 3])
            .expect("put");
        match migrate_records(&store) {
            Err(MigrationError::CorruptRecord { section, key, .. }) => {
                assert_eq!(section, Section::CoinOutputs);
                assert_eq!(key, "abcd");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_store_yields_empty_batch() {
        let store = MemoryStore::new();
        let (batch, report) = migrate_records(&store).expect("migrate");
        assert!(batch.is_empty());
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn unstamped_store_is_refused() {
        let store = MemoryStore::new();
        assert!(matches!(
            convert_legacy_database(&store),
            Err(MigrationError::Metadata(MetadataError::Missing))
        ));
    }
}
