//! Record shapes of stores tagged with the legacy schema version.
//!
//! Legacy records differ from current ones only in their outputs, which are
//! owned by a bare unlock hash instead of an unlock condition.

pub use rivd_primitives::LegacyOutput;

pub use crate::processed_block::LegacyProcessedBlock;

use crate::diff::{BlockStakeOutputDiff, CoinOutputDiff, DelayedCoinOutputDiff};

pub type LegacyCoinOutputDiff = CoinOutputDiff<LegacyOutput>;
pub type LegacyBlockStakeOutputDiff = BlockStakeOutputDiff<LegacyOutput>;
pub type LegacyDelayedCoinOutputDiff = DelayedCoinOutputDiff<LegacyOutput>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffDirection, TransactionIdDiff};
    use rivd_primitives::encoding::{decode, encode};
    use rivd_primitives::unlock::UNLOCK_TYPE_PUBKEY;
    use rivd_primitives::{Block, Currency, UnlockHash};

    fn owner(tag: u8) -> UnlockHash {
        UnlockHash::new(UNLOCK_TYPE_PUBKEY, [tag; 32])
    }

    fn legacy_block() -> LegacyProcessedBlock {
        LegacyProcessedBlock {
            block: Block {
                parent_id: [1u8; 32],
                timestamp: 1_500_000_000,
                ..Block::default()
            },
            height: 12,
            depth: [2u8; 32],
            child_target: [3u8; 32],
            diffs_generated: true,
            coin_output_diffs: vec![LegacyCoinOutputDiff {
                direction: DiffDirection::Apply,
                id: [4u8; 32],
                coin_output: LegacyOutput {
                    value: Currency::new(1_000),
                    unlock_hash: owner(5),
                },
            }],
            block_stake_output_diffs: vec![LegacyBlockStakeOutputDiff {
                direction: DiffDirection::Revert,
                id: [6u8; 32],
                block_stake_output: LegacyOutput {
                    value: Currency::new(3),
                    unlock_hash: owner(7),
                },
            }],
            delayed_coin_output_diffs: vec![LegacyDelayedCoinOutputDiff {
                direction: DiffDirection::Apply,
                id: [8u8; 32],
                coin_output: LegacyOutput {
                    value: Currency::new(50),
                    unlock_hash: owner(9),
                },
                maturity_height: 156,
            }],
            txid_diffs: vec![TransactionIdDiff {
                direction: DiffDirection::Apply,
                id: [10u8; 32],
            }],
            consensus_checksum: [11u8; 32],
        }
    }

    #[test]
    fn upgrade_passes_non_output_fields_through() {
        let legacy = legacy_block();
        let upgraded = legacy.clone().upgrade();
        assert_eq!(upgraded.block, legacy.block);
        assert_eq!(upgraded.height, legacy.height);
        assert_eq!(upgraded.depth, legacy.depth);
        assert_eq!(upgraded.child_target, legacy.child_target);
        assert_eq!(upgraded.txid_diffs, legacy.txid_diffs);
        assert_eq!(upgraded.consensus_checksum, legacy.consensus_checksum);
        assert_eq!(upgraded.delayed_coin_output_diffs[0].maturity_height, 156);
        assert!(upgraded.block_stake_output_diffs[0]
            .block_stake_output
            .condition
            .is_satisfied_by(&owner(7)));
    }

    #[test]
    fn layouts_do_not_cross_decode() {
        let legacy = legacy_block();
        let legacy_bytes = encode(&legacy);
        let current_bytes = encode(&legacy.clone().upgrade());
        assert_ne!(legacy_bytes, current_bytes);
        assert!(decode::<crate::ProcessedBlock>(&legacy_bytes).is_err());
        assert!(decode::<LegacyProcessedBlock>(&current_bytes).is_err());
        assert_eq!(
            decode::<LegacyProcessedBlock>(&legacy_bytes).expect("legacy"),
            legacy
        );
    }
}
