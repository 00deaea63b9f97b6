//! Transactions and the identifiers derived from them.

use rivd_consensus::Hash256;

use crate::currency::Currency;
use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::{hash_object, hash_with_specifier};
use crate::output::{BlockStakeOutput, BlockStakeOutputId, CoinOutput, CoinOutputId, Output};

pub type TransactionId = Hash256;

pub const SPECIFIER_COIN_OUTPUT: &[u8; 16] = b"coin output\0\0\0\0\0";
pub const SPECIFIER_BLOCK_STAKE_OUTPUT: &[u8; 16] = b"blstake output\0\0";

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CoinInput {
    pub parent_id: CoinOutputId,
    pub fulfillment: Vec<u8>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BlockStakeInput {
    pub parent_id: BlockStakeOutputId,
    pub fulfillment: Vec<u8>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Transaction {
    pub version: u8,
    pub coin_inputs: Vec<CoinInput>,
    pub coin_outputs: Vec<CoinOutput>,
    pub block_stake_inputs: Vec<BlockStakeInput>,
    pub block_stake_outputs: Vec<BlockStakeOutput>,
    pub miner_fees: Vec<Currency>,
    pub arbitrary_data: Vec<u8>,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        hash_object(self)
    }

    pub fn coin_output_id(&self, index: u64) -> CoinOutputId {
        hash_with_specifier(SPECIFIER_COIN_OUTPUT, &[&self.id(), &index.to_le_bytes()])
    }

    pub fn block_stake_output_id(&self, index: u64) -> BlockStakeOutputId {
        hash_with_specifier(
            SPECIFIER_BLOCK_STAKE_OUTPUT,
            &[&self.id(), &index.to_le_bytes()],
        )
    }

    pub fn coin_output_ids(&self) -> Vec<CoinOutputId> {
        (0..self.coin_outputs.len() as u64)
            .map(|index| self.coin_output_id(index))
            .collect()
    }

    pub fn block_stake_output_ids(&self) -> Vec<BlockStakeOutputId> {
        (0..self.block_stake_outputs.len() as u64)
            .map(|index| self.block_stake_output_id(index))
            .collect()
    }
}

impl Encodable for CoinInput {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_hash(&self.parent_id);
        encoder.write_prefixed_bytes(&self.fulfillment);
    }
}

impl Decodable for CoinInput {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let parent_id = decoder.read_hash()?;
        let fulfillment = decoder.read_prefixed_bytes()?;
        Ok(Self {
            parent_id,
            fulfillment,
        })
    }
}

impl Encodable for BlockStakeInput {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_hash(&self.parent_id);
        encoder.write_prefixed_bytes(&self.fulfillment);
    }
}

impl Decodable for BlockStakeInput {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let parent_id = decoder.read_hash()?;
        let fulfillment = decoder.read_prefixed_bytes()?;
        Ok(Self {
            parent_id,
            fulfillment,
        })
    }
}

impl Encodable for Transaction {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.version);
        encoder.write_slice(&self.coin_inputs);
        encoder.write_slice(&self.coin_outputs);
        encoder.write_slice(&self.block_stake_inputs);
        encoder.write_slice(&self.block_stake_outputs);
        encoder.write_slice(&self.miner_fees);
        encoder.write_prefixed_bytes(&self.arbitrary_data);
    }
}

impl Decodable for Transaction {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let version = decoder.read_u8()?;
        let coin_inputs = decoder.read_vec()?;
        let coin_outputs = decoder.read_vec::<Output>()?;
        let block_stake_inputs = decoder.read_vec()?;
        let block_stake_outputs = decoder.read_vec::<Output>()?;
        let miner_fees = decoder.read_vec()?;
        let arbitrary_data = decoder.read_prefixed_bytes()?;
        Ok(Self {
            version,
            coin_inputs,
            coin_outputs,
            block_stake_inputs,
            block_stake_outputs,
            miner_fees,
            arbitrary_data,
        })
    }
}
