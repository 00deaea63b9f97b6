use blake2b_simd::Params as Blake2bParams;
use rivd_consensus::Hash256;

use crate::encoding::{encode, Encodable};

pub fn blake2b_256(data: &[u8]) -> Hash256 {
    let digest = Blake2bParams::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_bytes());
    out
}

/// Hash of the canonical encoding of `value`.
pub fn hash_object<T: Encodable + ?Sized>(value: &T) -> Hash256 {
    blake2b_256(&encode(value))
}

/// Hash over a 16-byte specifier followed by the encoded parts, used to
/// derive output identifiers.
pub fn hash_with_specifier(specifier: &[u8; 16], parts: &[&[u8]]) -> Hash256 {
    let mut state = Blake2bParams::new().hash_length(32).to_state();
    state.update(specifier);
    for part in parts {
        state.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(state.finalize().as_bytes());
    out
}

pub fn hash256_to_hex(hash: &Hash256) -> String {
    hex::encode(hash)
}
