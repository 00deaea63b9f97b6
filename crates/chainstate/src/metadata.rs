//! Header/version tag stored in the meta column of every database.

use rivd_consensus::constants::{
    CONSENSUS_DB_HEADER, CONSENSUS_DB_LEGACY_VERSION, CONSENSUS_DB_VERSION,
};
use rivd_storage::{Column, KeyValueStore, StoreError, WriteBatch};
use thiserror::Error;

pub const META_HEADER_KEY: &[u8] = b"header";
pub const META_VERSION_KEY: &[u8] = b"version";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Metadata {
    pub header: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("database header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: String, found: String },
    #[error("database version mismatch: expected {expected:?}, found {found:?}")]
    VersionMismatch { expected: String, found: String },
    #[error("database metadata missing")]
    Missing,
    #[error("corrupt metadata: {0}")]
    Corrupt(&'static str),
}

impl Metadata {
    pub fn new(header: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            version: version.into(),
        }
    }

    /// Tag of a consensus database at the current schema.
    pub fn current() -> Self {
        Self::new(CONSENSUS_DB_HEADER, CONSENSUS_DB_VERSION)
    }

    /// Tag of a consensus database written before the unlock-condition outputs.
    pub fn legacy() -> Self {
        Self::new(CONSENSUS_DB_HEADER, CONSENSUS_DB_LEGACY_VERSION)
    }

    /// Reads the tag; `None` when the store has never been stamped.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Self>, MetadataError> {
        let header = store.get(Column::Meta, META_HEADER_KEY)?;
        let version = store.get(Column::Meta, META_VERSION_KEY)?;
        match (header, version) {
            (None, None) => Ok(None),
            (Some(header), Some(version)) => {
                let header =
                    String::from_utf8(header).map_err(|_| MetadataError::Corrupt("header"))?;
                let version =
                    String::from_utf8(version).map_err(|_| MetadataError::Corrupt("version"))?;
                Ok(Some(Self { header, version }))
            }
            _ => Err(MetadataError::Corrupt("header and version must both be present")),
        }
    }

    pub fn save(&self, batch: &mut WriteBatch) {
        batch.put(Column::Meta, META_HEADER_KEY, self.header.as_bytes());
        batch.put(Column::Meta, META_VERSION_KEY, self.version.as_bytes());
    }

    pub fn check(&self, expected: &Metadata) -> Result<(), MetadataError> {
        if self.header != expected.header {
            return Err(MetadataError::HeaderMismatch {
                expected: expected.header.clone(),
                found: self.header.clone(),
            });
        }
        if self.version != expected.version {
            return Err(MetadataError::VersionMismatch {
                expected: expected.version.clone(),
                found: self.version.clone(),
            });
        }
        Ok(())
    }
}

/// Verifies the store carries `expected`, stamping an unstamped store with it.
pub fn open_with_metadata<S: KeyValueStore + ?Sized>(
    store: &S,
    expected: &Metadata,
) -> Result<(), MetadataError> {
    match Metadata::load(store)? {
        Some(found) => found.check(expected),
        None => {
            let mut batch = WriteBatch::new();
            expected.save(&mut batch);
            store.write_batch(&batch)?;
            Ok(())
        }
    }
}
