//! Binary encoding used for stored records and object hashing.
//!
//! Integers are little-endian and fixed width, variable-length data carries a
//! u64 length prefix, and booleans are a single byte that must be 0 or 1.
//! Decoding is strict: [`decode`] rejects trailing input so a value never
//! parses under two different record layouts by accident of a short read.

use rivd_consensus::Hash256;
use thiserror::Error;

#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_len(&mut self, len: usize) {
        self.write_u64_le(len as u64);
    }

    pub fn write_prefixed_bytes(&mut self, bytes: &[u8]) {
        self.write_len(bytes.len());
        self.write_bytes(bytes);
    }

    pub fn write_hash(&mut self, hash: &Hash256) {
        self.buf.extend_from_slice(hash);
    }

    pub fn write_slice<T: Encodable>(&mut self, items: &[T]) {
        self.write_len(items.len());
        for item in items {
            item.encode_to(self);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("length prefix {0} exceeds remaining input")]
    LengthOverflow(u64),
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    #[error("{0}")]
    InvalidData(&'static str),
    #[error("{0} trailing bytes after decode")]
    TrailingBytes(usize),
}

pub struct Decoder<'a> {
    input: &'a [u8],
    cursor: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.input.len().saturating_sub(self.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.input[start..start + len])
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    pub fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_fixed::<8>()?))
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_hash(&mut self) -> Result<Hash256, DecodeError> {
        self.read_fixed::<32>()
    }

    /// Reads a length prefix that can be satisfied by the remaining input,
    /// assuming every element occupies at least one byte.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_u64_le()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(DecodeError::LengthOverflow(len)),
        }
    }

    pub fn read_prefixed_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_len()?;
        Ok(self.read_slice(len)?.to_vec())
    }

    pub fn read_vec<T: Decodable>(&mut self) -> Result<Vec<T>, DecodeError> {
        let len = self.read_len()?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(T::decode_from(self)?);
        }
        Ok(out)
    }
}

pub trait Encodable {
    fn encode_to(&self, encoder: &mut Encoder);
}

pub trait Decodable: Sized {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError>;
}

impl<T: Encodable> Encodable for [T] {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_slice(self);
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode_to(&self, encoder: &mut Encoder) {
        encoder.write_slice(self);
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        decoder.read_vec()
    }
}

pub fn encode<T: Encodable + ?Sized>(value: &T) -> Vec<u8> {
    let mut encoder = Encoder::new();
    value.encode_to(&mut encoder);
    encoder.into_inner()
}

pub fn decode<T: Decodable>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    let value = T::decode_from(&mut decoder)?;
    if !decoder.is_empty() {
        return Err(DecodeError::TrailingBytes(decoder.remaining()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_must_be_canonical() {
        let mut decoder = Decoder::new(&[2]);
        assert_eq!(decoder.read_bool(), Err(DecodeError::InvalidBool(2)));
    }

    #[test]
    fn length_prefix_cannot_exceed_input() {
        let mut encoder = Encoder::new();
        encoder.write_u64_le(4);
        encoder.write_bytes(&[1, 2, 3]);
        let bytes = encoder.into_inner();
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(
            decoder.read_prefixed_bytes(),
            Err(DecodeError::LengthOverflow(4))
        );
    }

    #[test]
    fn prefixed_bytes_roundtrip() {
        let mut encoder = Encoder::new();
        encoder.write_prefixed_bytes(b"rivd");
        encoder.write_bool(true);
        let bytes = encoder.into_inner();
        assert_eq!(bytes.len(), 8 + 4 + 1);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.read_prefixed_bytes().expect("bytes"), b"rivd");
        assert!(decoder.read_bool().expect("bool"));
        assert!(decoder.is_empty());
    }
}
