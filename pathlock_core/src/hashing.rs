//! BLAKE3 byte hashing.

use crate::constants::HASH_BYTES;

/// Computes the 32-byte BLAKE3 digest of `data`.
pub fn blake3_digest(data: &[u8]) -> [u8; HASH_BYTES] {
    *blake3::hash(data).as_bytes()
}
