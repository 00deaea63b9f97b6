//! Unlock hashes and the polymorphic unlock conditions that own outputs.

use std::fmt;

use rivd_consensus::Hash256;

use crate::encoding::{decode, encode, Decodable, DecodeError, Decoder, Encodable, Encoder};

pub const UNLOCK_TYPE_PUBKEY: u8 = 1;

pub const CONDITION_TYPE_NIL: u8 = 0;
pub const CONDITION_TYPE_UNLOCK_HASH: u8 = 1;

/// Address-like identifier: a type byte followed by a 32-byte hash.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct UnlockHash {
    pub unlock_type: u8,
    pub hash: Hash256,
}

impl UnlockHash {
    pub const ENCODED_LEN: usize = 33;

    pub fn new(unlock_type: u8, hash: Hash256) -> Self {
        Self { unlock_type, hash }
    }

    pub fn nil() -> Self {
        Self::default()
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{}", self.unlock_type, hex::encode(self.hash))
    }
}

impl Encodable for UnlockHash {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.unlock_type);
        encoder.write_hash(&self.hash);
    }
}

impl Decodable for UnlockHash {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let unlock_type = decoder.read_u8()?;
        let hash = decoder.read_hash()?;
        Ok(Self { unlock_type, hash })
    }
}

/// Predicate deciding who may spend an output.
///
/// Condition kinds this node does not interpret are carried as `Unknown` so
/// that records round-trip byte for byte.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum UnlockCondition {
    #[default]
    Nil,
    UnlockHash(UnlockHash),
    Unknown { condition_type: u8, data: Vec<u8> },
}

impl UnlockCondition {
    pub fn unlock_hash_condition(unlock_hash: UnlockHash) -> Self {
        Self::UnlockHash(unlock_hash)
    }

    pub fn condition_type(&self) -> u8 {
        match self {
            Self::Nil => CONDITION_TYPE_NIL,
            Self::UnlockHash(_) => CONDITION_TYPE_UNLOCK_HASH,
            Self::Unknown { condition_type, .. } => *condition_type,
        }
    }

    /// The single unlock hash able to satisfy this condition, if it has one.
    pub fn unlock_hash(&self) -> Option<UnlockHash> {
        match self {
            Self::Nil => Some(UnlockHash::nil()),
            Self::UnlockHash(unlock_hash) => Some(*unlock_hash),
            Self::Unknown { .. } => None,
        }
    }

    pub fn is_satisfied_by(&self, unlock_hash: &UnlockHash) -> bool {
        self.unlock_hash().as_ref() == Some(unlock_hash)
    }

    fn condition_data(&self) -> Vec<u8> {
        match self {
            Self::Nil => Vec::new(),
            Self::UnlockHash(unlock_hash) => encode(unlock_hash),
            Self::Unknown { data, .. } => data.clone(),
        }
    }
}

impl Encodable for UnlockCondition {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.condition_type());
        encoder.write_prefixed_bytes(&self.condition_data());
    }
}

impl Decodable for UnlockCondition {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let condition_type = decoder.read_u8()?;
        let data = decoder.read_prefixed_bytes()?;
        match condition_type {
            CONDITION_TYPE_NIL => {
                if !data.is_empty() {
                    return Err(DecodeError::InvalidData("nil condition carries data"));
                }
                Ok(Self::Nil)
            }
            CONDITION_TYPE_UNLOCK_HASH => Ok(Self::UnlockHash(decode(&data)?)),
            _ => Ok(Self::Unknown {
                condition_type,
                data,
            }),
        }
    }
}
