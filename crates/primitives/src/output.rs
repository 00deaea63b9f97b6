//! Coin and block-stake outputs, current and legacy layouts.

use rivd_consensus::Hash256;

use crate::currency::Currency;
use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::unlock::{UnlockCondition, UnlockHash};

pub type CoinOutputId = Hash256;
pub type BlockStakeOutputId = Hash256;

/// A value owned by an unlock condition.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Output {
    pub value: Currency,
    pub condition: UnlockCondition,
}

pub type CoinOutput = Output;
pub type BlockStakeOutput = Output;

impl Output {
    pub fn new(value: Currency, condition: UnlockCondition) -> Self {
        Self { value, condition }
    }
}

impl Encodable for Output {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.value.encode_to(encoder);
        self.condition.encode_to(encoder);
    }
}

impl Decodable for Output {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let value = Currency::decode_from(decoder)?;
        let condition = UnlockCondition::decode_from(decoder)?;
        Ok(Self { value, condition })
    }
}

/// Output layout that predates unlock conditions: owned by a bare unlock hash.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct LegacyOutput {
    pub value: Currency,
    pub unlock_hash: UnlockHash,
}

impl LegacyOutput {
    /// Wraps the unlock hash in an unlock-by-hash condition. Lossless.
    pub fn upgrade(&self) -> Output {
        Output {
            value: self.value,
            condition: UnlockCondition::unlock_hash_condition(self.unlock_hash),
        }
    }
}

impl From<LegacyOutput> for Output {
    fn from(legacy: LegacyOutput) -> Self {
        legacy.upgrade()
    }
}

impl Encodable for LegacyOutput {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.value.encode_to(encoder);
        self.unlock_hash.encode_to(encoder);
    }
}

impl Decodable for LegacyOutput {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let value = Currency::decode_from(decoder)?;
        let unlock_hash = UnlockHash::decode_from(decoder)?;
        Ok(Self { value, unlock_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode, encode};
    use crate::unlock::UNLOCK_TYPE_PUBKEY;

    #[test]
    fn legacy_upgrade_keeps_value_and_owner() {
        let owner = UnlockHash::new(UNLOCK_TYPE_PUBKEY, [0xab; 32]);
        let legacy = LegacyOutput {
            value: Currency::new(100),
            unlock_hash: owner,
        };
        let output = legacy.upgrade();
        assert_eq!(output.value, Currency::new(100));
        assert_eq!(output.condition.unlock_hash(), Some(owner));
        assert!(output.condition.is_satisfied_by(&owner));
    }

    #[test]
    fn current_bytes_do_not_parse_as_legacy() {
        let output = Output::new(
            Currency::new(5),
            UnlockCondition::unlock_hash_condition(UnlockHash::new(UNLOCK_TYPE_PUBKEY, [3; 32])),
        );
        let bytes = encode(&output);
        assert!(decode::<LegacyOutput>(&bytes).is_err());
        assert_eq!(decode::<Output>(&bytes), Ok(output));
    }

    #[test]
    fn legacy_bytes_do_not_parse_as_current() {
        let legacy = LegacyOutput {
            value: Currency::new(5),
            unlock_hash: UnlockHash::new(UNLOCK_TYPE_PUBKEY, [3; 32]),
        };
        assert!(decode::<Output>(&encode(&legacy)).is_err());
    }
}
