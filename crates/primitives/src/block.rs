//! Block type.

use rivd_consensus::{BlockHeight, Hash256};

use crate::currency::Currency;
use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::hash_object;
use crate::transaction::Transaction;
use crate::unlock::UnlockHash;

pub type BlockId = Hash256;

/// Locates the block-stake output used to create a block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct BlockStakeOutputIndexes {
    pub block_height: BlockHeight,
    pub transaction_index: u64,
    pub output_index: u64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct MinerPayout {
    pub value: Currency,
    pub unlock_hash: UnlockHash,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Block {
    pub parent_id: BlockId,
    pub timestamp: u64,
    pub pobs_output: BlockStakeOutputIndexes,
    pub miner_payouts: Vec<MinerPayout>,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn id(&self) -> BlockId {
        hash_object(self)
    }
}

impl Encodable for BlockStakeOutputIndexes {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_u64_le(self.block_height);
        encoder.write_u64_le(self.transaction_index);
        encoder.write_u64_le(self.output_index);
    }
}

impl Decodable for BlockStakeOutputIndexes {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            block_height: decoder.read_u64_le()?,
            transaction_index: decoder.read_u64_le()?,
            output_index: decoder.read_u64_le()?,
        })
    }
}

impl Encodable for MinerPayout {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.value.encode_to(encoder);
        self.unlock_hash.encode_to(encoder);
    }
}

impl Decodable for MinerPayout {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let value = Currency::decode_from(decoder)?;
        let unlock_hash = UnlockHash::decode_from(decoder)?;
        Ok(Self { value, unlock_hash })
    }
}

impl Encodable for Block {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_hash(&self.parent_id);
        encoder.write_u64_le(self.timestamp);
        self.pobs_output.encode_to(encoder);
        encoder.write_slice(&self.miner_payouts);
        encoder.write_slice(&self.transactions);
    }
}

impl Decodable for Block {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let parent_id = decoder.read_hash()?;
        let timestamp = decoder.read_u64_le()?;
        let pobs_output = BlockStakeOutputIndexes::decode_from(decoder)?;
        let miner_payouts = decoder.read_vec()?;
        let transactions = decoder.read_vec()?;
        Ok(Self {
            parent_id,
            timestamp,
            pobs_output,
            miner_payouts,
            transactions,
        })
    }
}
