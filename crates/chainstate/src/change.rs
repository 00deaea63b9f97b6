//! Consensus change notifications delivered to subscribers.

use std::collections::HashSet;
use std::fmt;

use rivd_consensus::Hash256;
use rivd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use rivd_primitives::hash::blake2b_256;
use rivd_primitives::{Block, TransactionId};

use crate::diff::{BlockStakeOutputDiff, CoinOutputDiff, DelayedCoinOutputDiff};
use crate::processed_block::{BlockDiffs, ProcessedBlock};

/// Opaque identifier of a consensus change, assigned by the consensus engine.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ConsensusChangeId(pub Hash256);

impl ConsensusChangeId {
    /// Subscribing from this id replays the chain from genesis.
    pub const BEGINNING: ConsensusChangeId = ConsensusChangeId([0u8; 32]);

    pub fn as_bytes(&self) -> &Hash256 {
        &self.0
    }
}

impl fmt::Display for ConsensusChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Encodable for ConsensusChangeId {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_hash(&self.0);
    }
}

impl Decodable for ConsensusChangeId {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self(decoder.read_hash()?))
    }
}

/// Blocks removed from and added to the canonical chain since the previous
/// change, each list oldest first, with the output diffs they produced.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConsensusChange {
    pub id: ConsensusChangeId,
    pub reverted_blocks: Vec<Block>,
    pub applied_blocks: Vec<Block>,
    pub coin_output_diffs: Vec<CoinOutputDiff>,
    pub block_stake_output_diffs: Vec<BlockStakeOutputDiff>,
    pub delayed_coin_output_diffs: Vec<DelayedCoinOutputDiff>,
    pub synced: bool,
}

impl ConsensusChange {
    /// Builds the change for reverting `reverted` (oldest reversion first) and
    /// then applying `applied` (oldest application first).
    pub fn from_processed_blocks(
        reverted: &[ProcessedBlock],
        applied: &[ProcessedBlock],
        synced: bool,
    ) -> Self {
        let mut change = ConsensusChange {
            id: change_id(reverted, applied),
            synced,
            ..ConsensusChange::default()
        };
        for block in reverted {
            change.reverted_blocks.push(block.block.clone());
            change.extend_diffs(block.revert_diffs());
        }
        for block in applied {
            change.applied_blocks.push(block.block.clone());
            change.extend_diffs(block.apply_diffs());
        }
        change
    }

    fn extend_diffs(&mut self, diffs: BlockDiffs) {
        self.coin_output_diffs.extend(diffs.coin_output_diffs);
        self.block_stake_output_diffs
            .extend(diffs.block_stake_output_diffs);
        self.delayed_coin_output_diffs
            .extend(diffs.delayed_coin_output_diffs);
    }

    /// Ids of every transaction confirmed by the applied blocks.
    pub fn applied_transaction_ids(&self) -> HashSet<TransactionId> {
        self.applied_blocks
            .iter()
            .flat_map(|block| block.transactions.iter())
            .map(|txn| txn.id())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reverted_blocks.is_empty() && self.applied_blocks.is_empty()
    }
}

fn change_id(reverted: &[ProcessedBlock], applied: &[ProcessedBlock]) -> ConsensusChangeId {
    let mut encoder = Encoder::new();
    encoder.write_len(reverted.len());
    for block in reverted {
        encoder.write_hash(&block.id());
    }
    encoder.write_len(applied.len());
    for block in applied {
        encoder.write_hash(&block.id());
    }
    ConsensusChangeId(blake2b_256(&encoder.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffDirection;
    use rivd_primitives::{Currency, Output, Transaction, UnlockCondition};

    fn processed(tag: u8) -> ProcessedBlock {
        let txn = Transaction {
            arbitrary_data: vec![tag],
            ..Transaction::default()
        };
        ProcessedBlock {
            block: Block {
                parent_id: [tag; 32],
                transactions: vec![txn],
                ..Block::default()
            },
            height: u64::from(tag),
            depth: [0u8; 32],
            child_target: [0u8; 32],
            diffs_generated: true,
            coin_output_diffs: vec![
                CoinOutputDiff {
                    direction: DiffDirection::Apply,
                    id: [tag; 32],
                    coin_output: Output::new(Currency::new(1), UnlockCondition::Nil),
                },
                CoinOutputDiff {
                    direction: DiffDirection::Revert,
                    id: [tag.wrapping_add(1); 32],
                    coin_output: Output::new(Currency::new(2), UnlockCondition::Nil),
                },
            ],
            block_stake_output_diffs: Vec::new(),
            delayed_coin_output_diffs: Vec::new(),
            txid_diffs: Vec::new(),
            consensus_checksum: [0u8; 32],
        }
    }

    #[test]
    fn revert_then_apply_diffs_are_mirrored() {
        let block = processed(3);
        let change = ConsensusChange::from_processed_blocks(
            std::slice::from_ref(&block),
            std::slice::from_ref(&block),
            true,
        );
        let (reverted, applied) = change.coin_output_diffs.split_at(2);
        assert_eq!(applied, block.coin_output_diffs.as_slice());
        let undone: Vec<_> = reverted.iter().rev().map(CoinOutputDiff::reversed).collect();
        assert_eq!(undone, block.coin_output_diffs);
    }

    #[test]
    fn id_depends_on_block_order() {
        let a = processed(1);
        let b = processed(2);
        let forward = ConsensusChange::from_processed_blocks(&[], &[a.clone(), b.clone()], false);
        let backward = ConsensusChange::from_processed_blocks(&[], &[b, a], false);
        assert_ne!(forward.id, backward.id);
        assert_ne!(forward.id, ConsensusChangeId::BEGINNING);
    }

    #[test]
    fn applied_transaction_ids_cover_all_blocks() {
        let change =
            ConsensusChange::from_processed_blocks(&[processed(1)], &[processed(2), processed(3)], true);
        assert_eq!(change.applied_transaction_ids().len(), 2);
    }
}
