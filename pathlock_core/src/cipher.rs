//! AES-256-CBC adapter with PKCS#7 padding.
//!
//! The encrypt side draws a fresh IV from the OS RNG on every call; the
//! decrypt side reports wrong keys and mangled padding as `CipherFailure`
//! without distinguishing the two.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::{IV_BYTES, SHARED_SECRET_BYTES};
use crate::error::PuzzleError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypts `plaintext` under `key`, returning the ciphertext and the
/// freshly generated IV.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8; SHARED_SECRET_BYTES],
) -> Result<(Vec<u8>, [u8; IV_BYTES]), PuzzleError> {
    if plaintext.is_empty() {
        return Err(PuzzleError::EmptyInput);
    }

    let mut iv = [0u8; IV_BYTES];
    OsRng.fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    Ok((ciphertext, iv))
}

/// Decrypts `ciphertext` under `key` and `iv`, stripping the PKCS#7 padding.
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8; SHARED_SECRET_BYTES],
    iv: &[u8],
) -> Result<Vec<u8>, PuzzleError> {
    if iv.len() != IV_BYTES {
        return Err(PuzzleError::InvalidIvLength(iv.len()));
    }
    if ciphertext.is_empty() {
        return Err(PuzzleError::EmptyInput);
    }

    let mut iv_arr = [0u8; IV_BYTES];
    iv_arr.copy_from_slice(iv);

    Aes256CbcDec::new(key.into(), &iv_arr.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PuzzleError::CipherFailure)
}
