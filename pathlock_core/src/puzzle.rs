//! Puzzle façade composing KEM, cipher, graph, and path into the
//! mine/validate round trip.
//!
//! The façade owns its graph and path by value and collapses the error
//! kinds of the lower layers into the boolean contract callers expect,
//! logging the kind before it is swallowed.

use std::fmt;

use log::debug;

use crate::constants::{
    HASH_BYTES, PUBLIC_KEY_BYTES, SECRET_KEY_BYTES, SOLUTION_BYTES, TOTAL_BYTES,
};
use crate::error::PuzzleError;
use crate::graph::Graph;
use crate::path::Path;
use crate::stream::ByteStream;

/// The mined solution bytes: `enc ‖ iv ‖ ciphertext_kem ‖ path_hash`.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    bytes: Vec<u8>,
}

impl Solution {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Lowercase hex rendering for logs and files.
    pub fn to_hex(&self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(self.bytes.len() * 2);
        for &byte in &self.bytes {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
        }
        out
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A puzzle instance: graph, path, and the current solution.
#[derive(Default)]
pub struct Puzzle {
    graph: Graph,
    path: Path,
    pub solution: Solution,
}

impl Puzzle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the keypair for subsequent mine/validate cycles.
    pub fn initialize(
        &mut self,
        public_key: &[u8; PUBLIC_KEY_BYTES],
        secret_key: &[u8; SECRET_KEY_BYTES],
    ) {
        self.graph.initialize(public_key, secret_key);
    }

    /// Spreads the path search over all hardware cores.
    pub fn enable_parallel_dfs(&mut self) {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.graph.set_num_threads(cores);
    }

    pub fn set_header(&mut self, bytes: &[u8]) {
        self.graph.set_header(bytes);
    }

    pub fn set_nonce(&mut self, bytes: &[u8]) {
        self.graph.set_nonce(bytes);
    }

    /// Mines a solution for the configured header and nonce.
    ///
    /// On success the solution bytes are stored and `true` is returned; on
    /// any failure the stored solution is left empty.
    pub fn mine(&mut self) -> bool {
        self.solution.clear();

        if let Err(err) = self.graph.generate() {
            debug!("mining failed during graph generation: {err}");
            return false;
        }

        self.path.find_longest(self.graph.view());
        if self.path.is_empty() {
            debug!("mining failed: no path found in the derived graph");
            return false;
        }
        if !self.path.is_valid(self.graph.view()) {
            debug!("mining failed: found path does not follow graph edges");
            return false;
        }

        let mut stream = ByteStream::new();
        stream.put_bytes(self.graph.enc());
        stream.put_bytes(self.graph.iv());
        stream.put_bytes(self.graph.kem_ciphertext());
        stream.put_bytes(&self.path.hash());
        debug_assert_eq!(stream.len(), SOLUTION_BYTES);

        self.solution.bytes = stream.into_vec();
        true
    }

    /// Checks a candidate solution against the configured header and nonce.
    pub fn validate(&mut self, solution: &[u8]) -> bool {
        match self.validate_inner(solution) {
            Ok(()) => true,
            Err(err) => {
                debug!("solution rejected: {err}");
                false
            }
        }
    }

    fn validate_inner(&mut self, solution: &[u8]) -> Result<(), PuzzleError> {
        if solution.len() < SOLUTION_BYTES {
            return Err(PuzzleError::InvalidSolutionSize {
                expected: SOLUTION_BYTES,
                actual: solution.len(),
            });
        }

        let mut stream = ByteStream::from_vec(solution.to_vec());
        let mut blob = vec![0u8; TOTAL_BYTES];
        let mut path_hash = [0u8; HASH_BYTES];
        stream.read_into(&mut blob)?;
        stream.read_into(&mut path_hash)?;

        self.graph.validate(&blob)?;
        self.path.validate(&path_hash, self.graph.view())
    }

    /// True when the current path is a valid walk of the current graph.
    pub fn is_valid(&self) -> bool {
        self.path.is_valid(self.graph.view())
    }

    /// Read access to the composed graph, for diagnostics.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Read access to the found path, for diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
