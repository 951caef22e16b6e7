use thiserror::Error;

/// Failure kinds surfaced by the puzzle core.
///
/// Every fallible operation returns one of these; the puzzle façade
/// collapses them into a boolean for `mine`/`validate` after logging the
/// kind to the diagnostic sink.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("public or secret key material has not been provided")]
    MissingKey,

    #[error("key encapsulation primitive failed")]
    KemFailure,

    #[error("symmetric cipher operation failed")]
    CipherFailure,

    #[error("initialization vector must be 16 bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("empty input where data is required")]
    EmptyInput,

    #[error("stream read of {requested} bytes exceeds the {remaining} remaining")]
    StreamUnderflow { requested: usize, remaining: usize },

    #[error("node index {0} is out of range")]
    NodeOutOfRange(u16),

    #[error("not enough packed indices to derive a graph")]
    GraphDerivationFailure,

    #[error("solution size mismatch: expected {expected}, got {actual}")]
    InvalidSolutionSize { expected: usize, actual: usize },

    #[error("decrypted plaintext does not match header and nonce")]
    PlaintextMismatch,

    #[error("recomputed path hash does not match the expected digest")]
    PathMismatch,
}
