//! Core types and engines for the pathlock proof-of-work puzzle.
//!
//! A solution binds a block-header-like preimage to a Kyber-768 key
//! encapsulation, an AES-256-CBC encryption of `header‖nonce` under the
//! KEM-derived shared secret, and the BLAKE3 hash of the longest simple
//! path found in a graph derived deterministically from the encrypted
//! bytes. Mining produces a fixed 1280-byte solution; validation
//! reconstructs and re-verifies it bit-exactly using only the secret
//! decapsulation key.

pub mod cipher;
pub mod constants;
pub mod error;
pub mod graph;
pub mod hashing;
pub mod kem;
pub mod pack;
pub mod path;
pub mod puzzle;
pub mod stream;

pub use crate::constants::{
    ENC_BYTES, HASH_BYTES, HEADER_BYTES, IV_BYTES, KEM_CIPHERTEXT_BYTES, MAX_NODES, NONCE_BYTES,
    PUBLIC_KEY_BYTES, SECRET_KEY_BYTES, SHARED_SECRET_BYTES, SOLUTION_BYTES, TOTAL_BYTES,
};
pub use crate::error::PuzzleError;
pub use crate::graph::{BitRow, Graph, GraphView};
pub use crate::hashing::blake3_digest;
pub use crate::kem::{decapsulate, encapsulate, keypair};
pub use crate::pack::pack12;
pub use crate::path::Path;
pub use crate::puzzle::{Puzzle, Solution};
pub use crate::stream::ByteStream;
