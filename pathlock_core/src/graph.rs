//! Graph engine: the adjacency bitmatrix and its derivation from
//! ciphertext bytes.
//!
//! The matrix has `MAX_NODES` rows of `MAX_NODES` bits; row *i* bit *j*
//! encodes the directed edge *i→j*. Derivation walks the 12-bit indices
//! unpacked from the encrypted preimage and gives every row at most one
//! bit, so the result is a functional graph whose shape is fully
//! determined by the ciphertext.

use log::debug;
use zeroize::Zeroize;

use crate::cipher;
use crate::constants::{
    ENC_BYTES, HASH_BYTES, IV_BYTES, KEM_CIPHERTEXT_BYTES, MAX_NODES, PUBLIC_KEY_BYTES,
    SECRET_KEY_BYTES, TOTAL_BYTES,
};
use crate::error::PuzzleError;
use crate::hashing::blake3_digest;
use crate::kem;
use crate::pack::pack12;
use crate::stream::ByteStream;

const ROW_WORDS: usize = MAX_NODES / 64;
const ROW_BYTES: usize = MAX_NODES / 8;

/// One adjacency row: a fixed bit-vector of `MAX_NODES` bits backed by
/// 64-bit words so set-bit iteration can skip empty words.
#[derive(Clone, PartialEq, Eq)]
pub struct BitRow {
    words: [u64; ROW_WORDS],
}

impl BitRow {
    const fn empty() -> Self {
        Self {
            words: [0; ROW_WORDS],
        }
    }

    fn set(&mut self, bit: usize) {
        self.words[bit / 64] |= 1 << (bit % 64);
    }

    fn reset(&mut self) {
        self.words = [0; ROW_WORDS];
    }

    /// Tests whether `bit` is set.
    pub fn test(&self, bit: usize) -> bool {
        self.words[bit / 64] >> (bit % 64) & 1 == 1
    }

    /// True when no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterates the set bit positions in ascending order.
    pub fn iter_set(&self) -> SetBits<'_> {
        SetBits {
            words: &self.words,
            index: 0,
            current: self.words[0],
        }
    }

    /// Appends the row as `ROW_BYTES` bytes, bit *j* in byte `j/8` at
    /// position `j%8`.
    fn write_bytes(&self, out: &mut Vec<u8>) {
        for word in &self.words {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
}

/// Word-skipping iterator over the set bits of a [`BitRow`].
pub struct SetBits<'a> {
    words: &'a [u64; ROW_WORDS],
    index: usize,
    current: u64,
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.index += 1;
            if self.index == ROW_WORDS {
                return None;
            }
            self.current = self.words[self.index];
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(self.index * 64 + bit)
    }
}

/// Read-only capability handed to the path engine: the adjacency rows and
/// the configured DFS thread count, nothing else.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    rows: &'a [BitRow],
    threads: usize,
}

impl GraphView<'_> {
    pub fn row(&self, node: usize) -> &BitRow {
        &self.rows[node]
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

/// Keypair copied into the graph at initialization. The secret half is
/// wiped when the material is dropped or replaced.
struct KeyMaterial {
    public: Box<[u8; PUBLIC_KEY_BYTES]>,
    secret: Box<[u8; SECRET_KEY_BYTES]>,
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Adjacency matrix plus the cryptographic state of the current puzzle
/// instance: header, nonce, and the `enc`/`iv`/KEM-ciphertext triple of
/// the last generate or validate pass.
pub struct Graph {
    rows: Vec<BitRow>,
    header: Vec<u8>,
    nonce: Vec<u8>,
    enc: Vec<u8>,
    iv: [u8; IV_BYTES],
    kem_ct: Box<[u8; KEM_CIPHERTEXT_BYTES]>,
    keys: Option<KeyMaterial>,
    threads: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            rows: vec![BitRow::empty(); MAX_NODES],
            header: Vec::new(),
            nonce: Vec::new(),
            enc: Vec::new(),
            iv: [0; IV_BYTES],
            kem_ct: Box::new([0; KEM_CIPHERTEXT_BYTES]),
            keys: None,
            threads: 1,
        }
    }

    /// Copies the keypair into the graph and clears the matrix.
    pub fn initialize(
        &mut self,
        public_key: &[u8; PUBLIC_KEY_BYTES],
        secret_key: &[u8; SECRET_KEY_BYTES],
    ) {
        self.keys = Some(KeyMaterial {
            public: Box::new(*public_key),
            secret: Box::new(*secret_key),
        });
        self.clear();
    }

    /// Resets every adjacency row.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.reset();
        }
    }

    pub fn set_header(&mut self, bytes: &[u8]) {
        self.header = bytes.to_vec();
    }

    pub fn set_nonce(&mut self, bytes: &[u8]) {
        self.nonce = bytes.to_vec();
    }

    /// Sets the worker count used by the path engine, at least 1.
    pub fn set_num_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    /// Adds the directed edge `from → to`.
    ///
    /// A row that already holds an edge is left untouched and the call
    /// succeeds, keeping the first writer's edge. Self-loops are the
    /// caller's concern; only the index range is checked here.
    pub fn add_edge(&mut self, from: u16, to: u16) -> Result<(), PuzzleError> {
        if from as usize >= MAX_NODES {
            return Err(PuzzleError::NodeOutOfRange(from));
        }
        if to as usize >= MAX_NODES {
            return Err(PuzzleError::NodeOutOfRange(to));
        }
        let row = &mut self.rows[from as usize];
        if row.is_empty() {
            row.set(to as usize);
        }
        Ok(())
    }

    /// Builds `header‖nonce`, encapsulates against the stored public key,
    /// encrypts under the shared secret with a fresh IV, and derives the
    /// adjacency matrix from the encrypted bytes.
    pub fn generate(&mut self) -> Result<(), PuzzleError> {
        let keys = self.keys.as_ref().ok_or(PuzzleError::MissingKey)?;

        let mut preimage = ByteStream::new();
        preimage.put_bytes(&self.header);
        preimage.put_bytes(&self.nonce);

        let (kem_ct, shared) = kem::encapsulate(&keys.public)?;
        let (enc, iv) = cipher::encrypt(preimage.as_slice(), &shared)?;

        self.rebuild_from(&enc)?;
        self.enc = enc;
        self.iv = iv;
        *self.kem_ct = kem_ct;
        Ok(())
    }

    /// Checks that `blob` was generated from the stored header and nonce,
    /// rebuilding the matrix from its `enc` component on success.
    ///
    /// The blob must be exactly `enc ‖ iv ‖ ciphertext_kem`; the shared
    /// secret is recovered with the stored secret key and the decrypted
    /// bytes must equal `header‖nonce`.
    pub fn validate(&mut self, blob: &[u8]) -> Result<(), PuzzleError> {
        if blob.len() != TOTAL_BYTES {
            return Err(PuzzleError::InvalidSolutionSize {
                expected: TOTAL_BYTES,
                actual: blob.len(),
            });
        }
        let keys = self.keys.as_ref().ok_or(PuzzleError::MissingKey)?;

        let mut stream = ByteStream::from_vec(blob.to_vec());
        let mut enc = vec![0u8; ENC_BYTES];
        let mut iv = [0u8; IV_BYTES];
        let mut kem_ct = Box::new([0u8; KEM_CIPHERTEXT_BYTES]);
        stream.read_into(&mut enc)?;
        stream.read_into(&mut iv)?;
        stream.read_into(kem_ct.as_mut())?;

        let shared = kem::decapsulate(&kem_ct, &keys.secret)?;
        let plaintext = cipher::decrypt(&enc, &shared, &iv)?;

        let mut expected = Vec::with_capacity(self.header.len() + self.nonce.len());
        expected.extend_from_slice(&self.header);
        expected.extend_from_slice(&self.nonce);
        if plaintext != expected {
            debug!("decrypted preimage differs from the configured header and nonce");
            return Err(PuzzleError::PlaintextMismatch);
        }

        self.rebuild_from(&enc)?;
        self.enc = enc;
        self.iv = iv;
        self.kem_ct = kem_ct;
        Ok(())
    }

    /// Re-derives the matrix from encrypted bytes. Pure in `data`: the
    /// same input always produces the same matrix.
    pub(crate) fn rebuild_from(&mut self, data: &[u8]) -> Result<(), PuzzleError> {
        self.clear();
        if data.is_empty() {
            return Err(PuzzleError::EmptyInput);
        }
        self.apply_edges(&pack12(data))
    }

    fn apply_edges(&mut self, indices: &[u16]) -> Result<(), PuzzleError> {
        if indices.len() < 2 {
            return Err(PuzzleError::GraphDerivationFailure);
        }
        // A node enters `visited` once it has sourced an edge; later pairs
        // may not target it again, which keeps the walk cycle-free.
        let mut visited = vec![false; MAX_NODES];
        for pair in indices.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if from == to || visited[to as usize] {
                continue;
            }
            self.add_edge(from, to)?;
            visited[from as usize] = true;
        }
        Ok(())
    }

    /// BLAKE3 digest of the serialised matrix (row-major, 512 bytes per
    /// row, LSB-first within each byte).
    pub fn hash(&self) -> [u8; HASH_BYTES] {
        blake3_digest(&self.matrix_bytes())
    }

    fn matrix_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MAX_NODES * ROW_BYTES);
        for row in &self.rows {
            row.write_bytes(&mut data);
        }
        data
    }

    /// Writes the serialised matrix to `path`. Diagnostic only.
    pub fn save_matrix(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, self.matrix_bytes())
    }

    /// Encrypted `header‖nonce` of the last generate/validate pass.
    pub fn enc(&self) -> &[u8] {
        &self.enc
    }

    /// IV of the last generate/validate pass.
    pub fn iv(&self) -> &[u8; IV_BYTES] {
        &self.iv
    }

    /// KEM ciphertext of the last generate/validate pass.
    pub fn kem_ciphertext(&self) -> &[u8; KEM_CIPHERTEXT_BYTES] {
        &self.kem_ct
    }

    /// Read-only view for the path engine.
    pub fn view(&self) -> GraphView<'_> {
        GraphView {
            rows: &self.rows,
            threads: self.threads,
        }
    }
}
