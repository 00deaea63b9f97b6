//! Core block/transaction/output types and their binary encoding.

pub mod block;
pub mod currency;
pub mod encoding;
pub mod hash;
pub mod output;
pub mod transaction;
pub mod unlock;

pub use block::{Block, BlockId, BlockStakeOutputIndexes, MinerPayout};
pub use currency::Currency;
pub use encoding::{decode, encode, DecodeError};
pub use hash::{blake2b_256, hash256_to_hex, hash_object};
pub use output::{
    BlockStakeOutput, BlockStakeOutputId, CoinOutput, CoinOutputId, LegacyOutput, Output,
};
pub use transaction::{BlockStakeInput, CoinInput, Transaction, TransactionId};
pub use unlock::{UnlockCondition, UnlockHash};
