//! Directional descriptions of single state mutations.
//!
//! Diffs are generic over the output layout so the same record shapes serve
//! both the current schema and the legacy one (`LegacyOutput`).

use rivd_consensus::BlockHeight;
use rivd_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use rivd_primitives::{BlockStakeOutputId, CoinOutputId, LegacyOutput, Output, TransactionId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DiffDirection {
    Apply,
    Revert,
}

impl DiffDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Apply => Self::Revert,
            Self::Revert => Self::Apply,
        }
    }
}

impl Encodable for DiffDirection {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_bool(matches!(self, Self::Apply));
    }
}

impl Decodable for DiffDirection {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(if decoder.read_bool()? {
            Self::Apply
        } else {
            Self::Revert
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CoinOutputDiff<O = Output> {
    pub direction: DiffDirection,
    pub id: CoinOutputId,
    pub coin_output: O,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockStakeOutputDiff<O = Output> {
    pub direction: DiffDirection,
    pub id: BlockStakeOutputId,
    pub block_stake_output: O,
}

/// A coin output that only becomes spendable at `maturity_height`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DelayedCoinOutputDiff<O = Output> {
    pub direction: DiffDirection,
    pub id: CoinOutputId,
    pub coin_output: O,
    pub maturity_height: BlockHeight,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TransactionIdDiff {
    pub direction: DiffDirection,
    pub id: TransactionId,
}

impl<O: Clone> CoinOutputDiff<O> {
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self.clone()
        }
    }

    pub fn map_output<P>(self, f: impl FnOnce(O) -> P) -> CoinOutputDiff<P> {
        CoinOutputDiff {
            direction: self.direction,
            id: self.id,
            coin_output: f(self.coin_output),
        }
    }
}

impl<O: Clone> BlockStakeOutputDiff<O> {
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self.clone()
        }
    }

    pub fn map_output<P>(self, f: impl FnOnce(O) -> P) -> BlockStakeOutputDiff<P> {
        BlockStakeOutputDiff {
            direction: self.direction,
            id: self.id,
            block_stake_output: f(self.block_stake_output),
        }
    }
}

impl<O: Clone> DelayedCoinOutputDiff<O> {
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self.clone()
        }
    }

    pub fn map_output<P>(self, f: impl FnOnce(O) -> P) -> DelayedCoinOutputDiff<P> {
        DelayedCoinOutputDiff {
            direction: self.direction,
            id: self.id,
            coin_output: f(self.coin_output),
            maturity_height: self.maturity_height,
        }
    }
}

impl TransactionIdDiff {
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            id: self.id,
        }
    }
}

impl CoinOutputDiff<LegacyOutput> {
    pub fn upgrade(self) -> CoinOutputDiff {
        self.map_output(|output| output.upgrade())
    }
}

impl BlockStakeOutputDiff<LegacyOutput> {
    pub fn upgrade(self) -> BlockStakeOutputDiff {
        self.map_output(|output| output.upgrade())
    }
}

impl DelayedCoinOutputDiff<LegacyOutput> {
    pub fn upgrade(self) -> DelayedCoinOutputDiff {
        self.map_output(|output| output.upgrade())
    }
}

impl<O: Encodable> Encodable for CoinOutputDiff<O> {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.direction.encode_to(encoder);
        encoder.write_hash(&self.id);
        self.coin_output.encode_to(encoder);
    }
}

impl<O: Decodable> Decodable for CoinOutputDiff<O> {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            direction: DiffDirection::decode_from(decoder)?,
            id: decoder.read_hash()?,
            coin_output: O::decode_from(decoder)?,
        })
    }
}

impl<O: Encodable> Encodable for BlockStakeOutputDiff<O> {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.direction.encode_to(encoder);
        encoder.write_hash(&self.id);
        self.block_stake_output.encode_to(encoder);
    }
}

impl<O: Decodable> Decodable for BlockStakeOutputDiff<O> {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            direction: DiffDirection::decode_from(decoder)?,
            id: decoder.read_hash()?,
            block_stake_output: O::decode_from(decoder)?,
        })
    }
}

impl<O: Encodable> Encodable for DelayedCoinOutputDiff<O> {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.direction.encode_to(encoder);
        encoder.write_hash(&self.id);
        self.coin_output.encode_to(encoder);
        encoder.write_u64_le(self.maturity_height);
    }
}

impl<O: Decodable> Decodable for DelayedCoinOutputDiff<O> {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            direction: DiffDirection::decode_from(decoder)?,
            id: decoder.read_hash()?,
            coin_output: O::decode_from(decoder)?,
            maturity_height: decoder.read_u64_le()?,
        })
    }
}

impl Encodable for TransactionIdDiff {
    fn encode_to(&self, encoder: &mut Encoder) {
        self.direction.encode_to(encoder);
        encoder.write_hash(&self.id);
    }
}

impl Decodable for TransactionIdDiff {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            direction: DiffDirection::decode_from(decoder)?,
            id: decoder.read_hash()?,
        })
    }
}
