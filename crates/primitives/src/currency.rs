//! Currency amounts.

use std::fmt;

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};

/// An unsigned amount of the smallest currency unit.
///
/// Encoded as a length-prefixed, minimal big-endian byte string, so zero is
/// the empty string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Currency(pub u128);

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub fn new(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Encodable for Currency {
    fn encode_to(&self, encoder: &mut Encoder) {
        let bytes = self.0.to_be_bytes();
        let first = bytes
            .iter()
            .position(|byte| *byte != 0)
            .unwrap_or(bytes.len());
        encoder.write_prefixed_bytes(&bytes[first..]);
    }
}

impl Decodable for Currency {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let bytes = decoder.read_prefixed_bytes()?;
        if bytes.len() > 16 {
            return Err(DecodeError::InvalidData("currency exceeds 128 bits"));
        }
        if bytes.first() == Some(&0) {
            return Err(DecodeError::InvalidData("currency has leading zero byte"));
        }
        let mut buf = [0u8; 16];
        buf[16 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(u128::from_be_bytes(buf)))
    }
}
