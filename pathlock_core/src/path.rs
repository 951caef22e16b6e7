//! Path engine: parallel longest-path search over a graph view.
//!
//! Start nodes are split into contiguous ranges, one range per configured
//! thread. Each worker runs a depth-first search with its own visited
//! buffer and path stack; only the best path found so far is shared, behind
//! a mutex. Because every row holds at most one edge, each search is a
//! linear walk and the partitioning changes nothing but wall-clock time.

use std::sync::Mutex;
use std::thread;

use crate::constants::{HASH_BYTES, MAX_NODES};
use crate::error::PuzzleError;
use crate::graph::GraphView;
use crate::hashing::blake3_digest;
use crate::stream::ByteStream;

/// An ordered sequence of node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<u16>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<u16>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[u16] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Finds the longest root-anchored simple path in `graph`, overwriting
    /// the stored sequence with the result.
    ///
    /// If the graph has no populated row the result is empty. Among paths
    /// of equal maximum length the first one reported wins; lengths are
    /// deterministic for a given graph either way.
    pub fn find_longest(&mut self, graph: GraphView<'_>) -> &[u16] {
        self.nodes.clear();

        let threads = graph.threads().clamp(1, MAX_NODES);
        let nodes_per_thread = MAX_NODES / threads;
        let longest = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for index in 0..threads {
                let longest = &longest;
                scope.spawn(move || {
                    let start = index * nodes_per_thread;
                    let end = if index + 1 == threads {
                        MAX_NODES
                    } else {
                        start + nodes_per_thread
                    };
                    let mut visited = vec![false; MAX_NODES];
                    let mut current = Vec::new();
                    for node in start..end {
                        if graph.row(node).is_empty() {
                            continue;
                        }
                        dfs(graph, node, &mut visited, &mut current, longest);
                    }
                });
            }
        });

        self.nodes = longest.into_inner().expect("longest-path mutex poisoned");
        &self.nodes
    }

    /// BLAKE3 of the node sequence serialised as little-endian u16s.
    pub fn hash(&self) -> [u8; HASH_BYTES] {
        let mut stream = ByteStream::new();
        for &node in &self.nodes {
            stream.put_u16(node);
        }
        blake3_digest(stream.as_slice())
    }

    /// True when the sequence is non-empty and every consecutive pair is an
    /// edge of `graph`.
    pub fn is_valid(&self, graph: GraphView<'_>) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.windows(2).all(|pair| {
            let (from, to) = (pair[0] as usize, pair[1] as usize);
            from < MAX_NODES && to < MAX_NODES && graph.row(from).test(to)
        })
    }

    /// Reruns the search on `graph` and checks the result hashes to
    /// `expected`.
    pub fn validate(
        &mut self,
        expected: &[u8; HASH_BYTES],
        graph: GraphView<'_>,
    ) -> Result<(), PuzzleError> {
        self.find_longest(graph);
        if self.hash() != *expected {
            return Err(PuzzleError::PathMismatch);
        }
        Ok(())
    }

    /// Writes the node sequence as little-endian u16s to `path`.
    /// Diagnostic only.
    pub fn save_nodes(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let mut stream = ByteStream::new();
        for &node in &self.nodes {
            stream.put_u16(node);
        }
        std::fs::write(path, stream.as_slice())
    }
}

fn dfs(
    graph: GraphView<'_>,
    node: usize,
    visited: &mut [bool],
    current: &mut Vec<u16>,
    longest: &Mutex<Vec<u16>>,
) {
    visited[node] = true;
    current.push(node as u16);

    let row = graph.row(node);
    for next in row.iter_set() {
        if !visited[next] {
            dfs(graph, next, visited, current, longest);
        }
    }

    // A node without outgoing edges ends the walk; publish if it beats the
    // best path seen so far.
    if row.is_empty() {
        let mut best = longest.lock().expect("longest-path mutex poisoned");
        if current.len() > best.len() {
            *best = current.clone();
        }
    }

    current.pop();
    visited[node] = false;
}
