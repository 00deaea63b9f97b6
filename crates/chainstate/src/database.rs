//! Handle on the consensus database at the current schema.

use rivd_primitives::encoding::{decode, encode};
use rivd_primitives::{
    BlockId, BlockStakeOutput, BlockStakeOutputId, CoinOutput, CoinOutputId, DecodeError,
};
use rivd_storage::{Column, KeyValueStore, StoreError, WriteBatch};
use thiserror::Error;

use crate::metadata::{Metadata, MetadataError};
use crate::migration::{convert_legacy_database, MigrationError, MigrationReport};
use crate::processed_block::ProcessedBlock;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("unsupported consensus database version {found:?}")]
    UnsupportedVersion { found: String },
    #[error("undecodable record {key} in {column}: {source}")]
    Decode {
        column: &'static str,
        key: String,
        source: DecodeError,
    },
}

pub struct ConsensusDb<S> {
    store: S,
}

impl<S: KeyValueStore> ConsensusDb<S> {
    /// Opens `store`, stamping a fresh store and upgrading a legacy one.
    pub fn open(store: S) -> Result<Self, DatabaseError> {
        Self::open_with_report(store).map(|(db, _)| db)
    }

    /// Like [`ConsensusDb::open`], also returning the migration report when
    /// an upgrade ran.
    pub fn open_with_report(store: S) -> Result<(Self, Option<MigrationReport>), DatabaseError> {
        let current = Metadata::current();
        let report = match Metadata::load(&store)? {
            None => {
                let mut batch = WriteBatch::new();
                current.save(&mut batch);
                store.write_batch(&batch)?;
                None
            }
            Some(found) if found == current => None,
            Some(found) if found == Metadata::legacy() => Some(convert_legacy_database(&store)?),
            Some(found) if found.header != current.header => {
                return Err(MetadataError::HeaderMismatch {
                    expected: current.header,
                    found: found.header,
                }
                .into());
            }
            Some(found) => {
                return Err(DatabaseError::UnsupportedVersion {
                    found: found.version,
                })
            }
        };
        Ok((Self { store }, report))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn commit(&self, batch: &WriteBatch) -> Result<(), DatabaseError> {
        self.store.write_batch(batch)?;
        Ok(())
    }

    pub fn processed_block(&self, id: &BlockId) -> Result<Option<ProcessedBlock>, DatabaseError> {
        self.read(Column::BlockMap, id)
    }

    pub fn put_processed_block(&self, batch: &mut WriteBatch, block: &ProcessedBlock) {
        batch.put(Column::BlockMap, block.id(), encode(block));
    }

    pub fn coin_output(&self, id: &CoinOutputId) -> Result<Option<CoinOutput>, DatabaseError> {
        self.read(Column::CoinOutputs, id)
    }

    pub fn put_coin_output(&self, batch: &mut WriteBatch, id: CoinOutputId, output: &CoinOutput) {
        batch.put(Column::CoinOutputs, id, encode(output));
    }

    pub fn delete_coin_output(&self, batch: &mut WriteBatch, id: CoinOutputId) {
        batch.delete(Column::CoinOutputs, id);
    }

    pub fn block_stake_output(
        &self,
        id: &BlockStakeOutputId,
    ) -> Result<Option<BlockStakeOutput>, DatabaseError> {
        self.read(Column::BlockStakeOutputs, id)
    }

    pub fn put_block_stake_output(
        &self,
        batch: &mut WriteBatch,
        id: BlockStakeOutputId,
        output: &BlockStakeOutput,
    ) {
        batch.put(Column::BlockStakeOutputs, id, encode(output));
    }

    pub fn delete_block_stake_output(&self, batch: &mut WriteBatch, id: BlockStakeOutputId) {
        batch.delete(Column::BlockStakeOutputs, id);
    }

    fn read<T: rivd_primitives::encoding::Decodable>(
        &self,
        column: Column,
        key: &[u8],
    ) -> Result<Option<T>, DatabaseError> {
        let Some(bytes) = self.store.get(column, key)? else {
            return Ok(None);
        };
        decode(&bytes)
            .map(Some)
            .map_err(|source| DatabaseError::Decode {
                column: column.as_str(),
                key: hex::encode(key),
                source,
            })
    }
}
