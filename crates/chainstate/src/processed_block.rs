//! Per-block records kept in the block map.

use rivd_consensus::{BlockHeight, Hash256};
use rivd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use rivd_primitives::{Block, BlockId, LegacyOutput, Output};

use crate::diff::{
    BlockStakeOutputDiff, CoinOutputDiff, DelayedCoinOutputDiff, TransactionIdDiff,
};

pub type Target = [u8; 32];

/// A block as connected by the consensus engine, together with every diff it
/// generated. One record exists for every block ever connected, including
/// blocks on abandoned forks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessedBlock<O = Output> {
    pub block: Block,
    pub height: BlockHeight,
    pub depth: Target,
    pub child_target: Target,

    pub diffs_generated: bool,
    pub coin_output_diffs: Vec<CoinOutputDiff<O>>,
    pub block_stake_output_diffs: Vec<BlockStakeOutputDiff<O>>,
    pub delayed_coin_output_diffs: Vec<DelayedCoinOutputDiff<O>>,
    pub txid_diffs: Vec<TransactionIdDiff>,

    pub consensus_checksum: Hash256,
}

/// Block record as written by stores at the legacy schema version.
pub type LegacyProcessedBlock = ProcessedBlock<LegacyOutput>;

/// The output diffs of one block in a single direction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockDiffs {
    pub coin_output_diffs: Vec<CoinOutputDiff>,
    pub block_stake_output_diffs: Vec<BlockStakeOutputDiff>,
    pub delayed_coin_output_diffs: Vec<DelayedCoinOutputDiff>,
    pub txid_diffs: Vec<TransactionIdDiff>,
}

impl<O> ProcessedBlock<O> {
    pub fn id(&self) -> BlockId {
        self.block.id()
    }

    /// Re-expresses every diff output through `f`; all other fields pass
    /// through unchanged.
    pub fn map_outputs<P>(self, f: impl Fn(O) -> P) -> ProcessedBlock<P>
    where
        O: Clone,
    {
        ProcessedBlock {
            block: self.block,
            height: self.height,
            depth: self.depth,
            child_target: self.child_target,
            diffs_generated: self.diffs_generated,
            coin_output_diffs: self
                .coin_output_diffs
                .into_iter()
                .map(|diff| diff.map_output(&f))
                .collect(),
            block_stake_output_diffs: self
                .block_stake_output_diffs
                .into_iter()
                .map(|diff| diff.map_output(&f))
                .collect(),
            delayed_coin_output_diffs: self
                .delayed_coin_output_diffs
                .into_iter()
                .map(|diff| diff.map_output(&f))
                .collect(),
            txid_diffs: self.txid_diffs,
            consensus_checksum: self.consensus_checksum,
        }
    }
}

impl LegacyProcessedBlock {
    pub fn upgrade(self) -> ProcessedBlock {
        self.map_outputs(|output| output.upgrade())
    }
}

impl ProcessedBlock {
    /// Diffs produced when this block is applied, in application order.
    pub fn apply_diffs(&self) -> BlockDiffs {
        BlockDiffs {
            coin_output_diffs: self.coin_output_diffs.clone(),
            block_stake_output_diffs: self.block_stake_output_diffs.clone(),
            delayed_coin_output_diffs: self.delayed_coin_output_diffs.clone(),
            txid_diffs: self.txid_diffs.clone(),
        }
    }

    /// Diffs produced when this block is reverted: the applied diffs tagged
    /// [`DiffDirection::Revert`](crate::diff::DiffDirection::Revert), undone last-first.
    pub fn revert_diffs(&self) -> BlockDiffs {
        BlockDiffs {
            coin_output_diffs: self
                .coin_output_diffs
                .iter()
                .rev()
                .map(CoinOutputDiff::reversed)
                .collect(),
            block_stake_output_diffs: self
                .block_stake_output_diffs
                .iter()
                .rev()
                .map(BlockStakeOutputDiff::reversed)
                .collect(),
            delayed_coin_output_diffs: self
                .delayed_coin_output_diffs
                .iter()
                .rev()
                .map(DelayedCoinOutputDiff::reversed)
                .collect(),
            txid_diffs: self
                .txid_diffs
                .iter()
                .rev()
                .map(TransactionIdDiff::reversed)
                .collect(),
        }
    }
}

impl<O: Encodable> Encodable for ProcessedBlock<O> {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.block.encode_to(encoder);
        encoder.write_u64_le(self.height);
        encoder.write_bytes(&self.depth);
        encoder.write_bytes(&self.child_target);
        encoder.write_bool(self.diffs_generated);
        encoder.write_slice(&self.coin_output_diffs);
        encoder.write_slice(&self.block_stake_output_diffs);
        encoder.write_slice(&self.delayed_coin_output_diffs);
        encoder.write_slice(&self.txid_diffs);
        encoder.write_hash(&self.consensus_checksum);
    }
}

impl<O: Decodable> Decodable for ProcessedBlock<O> {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            block: Block::decode_from(decoder)?,
            height: decoder.read_u64_le()?,
            depth: decoder.read_fixed()?,
            child_target: decoder.read_fixed()?,
            diffs_generated: decoder.read_bool()?,
            coin_output_diffs: decoder.read_vec()?,
            block_stake_output_diffs: decoder.read_vec()?,
            delayed_coin_output_diffs: decoder.read_vec()?,
            txid_diffs: decoder.read_vec()?,
            consensus_checksum: decoder.read_hash()?,
        })
    }
}
