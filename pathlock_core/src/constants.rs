//! Byte-exact size definitions shared across the crate.
//!
//! The Kyber-768 lengths come straight from the provider's ffi constants so
//! a provider change that altered them would surface as a compile-time
//! mismatch in the size assertions below.

/// Kyber-768 public key length in bytes.
pub const PUBLIC_KEY_BYTES: usize =
    pqcrypto_kyber::ffi::PQCLEAN_KYBER768_CLEAN_CRYPTO_PUBLICKEYBYTES;
/// Kyber-768 secret key length in bytes.
pub const SECRET_KEY_BYTES: usize =
    pqcrypto_kyber::ffi::PQCLEAN_KYBER768_CLEAN_CRYPTO_SECRETKEYBYTES;
/// Kyber-768 KEM ciphertext length in bytes.
pub const KEM_CIPHERTEXT_BYTES: usize =
    pqcrypto_kyber::ffi::PQCLEAN_KYBER768_CLEAN_CRYPTO_CIPHERTEXTBYTES;
/// Kyber-768 shared secret length in bytes; used directly as the AES-256 key.
pub const SHARED_SECRET_BYTES: usize =
    pqcrypto_kyber::ffi::PQCLEAN_KYBER768_CLEAN_CRYPTO_BYTES;

/// Header preimage prefix length supplied by the caller.
pub const HEADER_BYTES: usize = 108;
/// Nonce preimage suffix length supplied by the caller.
pub const NONCE_BYTES: usize = 32;

/// AES-256-CBC ciphertext of the 140-byte `header‖nonce` plaintext.
///
/// 140 bytes is not a multiple of the 16-byte block size, so PKCS#7 padding
/// always brings the ciphertext to exactly 144 bytes.
pub const ENC_BYTES: usize = 144;
/// AES block-size initialization vector.
pub const IV_BYTES: usize = 16;
/// BLAKE3 digest length.
pub const HASH_BYTES: usize = 32;

/// Combined length of `enc ‖ iv ‖ ciphertext_kem`.
pub const TOTAL_BYTES: usize = ENC_BYTES + IV_BYTES + KEM_CIPHERTEXT_BYTES;
/// Full solution length: `enc ‖ iv ‖ ciphertext_kem ‖ path_hash`.
pub const SOLUTION_BYTES: usize = TOTAL_BYTES + HASH_BYTES;

/// Maximum number of graph vertices; matches the 12-bit node index range.
pub const MAX_NODES: usize = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_sizes_match_wire_format() {
        assert_eq!(PUBLIC_KEY_BYTES, 1184);
        assert_eq!(SECRET_KEY_BYTES, 2400);
        assert_eq!(KEM_CIPHERTEXT_BYTES, 1088);
        assert_eq!(SHARED_SECRET_BYTES, 32);
        assert_eq!(TOTAL_BYTES, 1248);
        assert_eq!(SOLUTION_BYTES, 1280);
    }
}
