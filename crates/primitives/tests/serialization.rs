use rivd_primitives::encoding::{decode, encode};
use rivd_primitives::unlock::UNLOCK_TYPE_PUBKEY;
use rivd_primitives::{
    Block, BlockStakeOutputIndexes, CoinInput, Currency, MinerPayout, Output, Transaction,
    UnlockCondition, UnlockHash,
};

fn owner(tag: u8) -> UnlockHash {
    UnlockHash::new(UNLOCK_TYPE_PUBKEY, [tag; 32])
}

fn sample_tx(tag: u8) -> Transaction {
    Transaction {
        version: 1,
        coin_inputs: vec![CoinInput {
            parent_id: [tag; 32],
            fulfillment: vec![tag, tag],
        }],
        coin_outputs: vec![Output::new(
            Currency::new(1_000 + u128::from(tag)),
            UnlockCondition::unlock_hash_condition(owner(tag)),
        )],
        miner_fees: vec![Currency::new(10)],
        ..Transaction::default()
    }
}

#[test]
fn block_with_transactions_decodes_to_same_value() {
    let block = Block {
        parent_id: [9u8; 32],
        timestamp: 1_700_000_000,
        pobs_output: BlockStakeOutputIndexes {
            block_height: 12,
            transaction_index: 1,
            output_index: 0,
        },
        miner_payouts: vec![MinerPayout {
            value: Currency::new(10),
            unlock_hash: owner(4),
        }],
        transactions: vec![sample_tx(1), sample_tx(2)],
    };
    let bytes = encode(&block);
    let decoded: Block = decode(&bytes).expect("decode block");
    assert_eq!(decoded, block);
    assert_eq!(decoded.id(), block.id());
}

#[test]
fn transaction_ids_depend_on_content() {
    let a = sample_tx(1);
    let b = sample_tx(2);
    assert_ne!(a.id(), b.id());
    assert_eq!(a.id(), sample_tx(1).id());
}

#[test]
fn output_ids_are_distinct_per_index_and_kind() {
    let mut tx = sample_tx(1);
    tx.coin_outputs.push(tx.coin_outputs[0].clone());
    tx.block_stake_outputs.push(tx.coin_outputs[0].clone());
    let coin_ids = tx.coin_output_ids();
    assert_eq!(coin_ids.len(), 2);
    assert_ne!(coin_ids[0], coin_ids[1]);
    assert_ne!(coin_ids[0], tx.block_stake_output_id(0));
}

#[test]
fn truncated_transaction_is_rejected() {
    let bytes = encode(&sample_tx(3));
    assert!(decode::<Transaction>(&bytes[..bytes.len() - 1]).is_err());
    let mut extended = bytes.clone();
    extended.push(0);
    assert!(decode::<Transaction>(&extended).is_err());
}
