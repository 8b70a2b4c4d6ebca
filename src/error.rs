//! Error types for key-space search.

use thiserror::Error;

/// Failures raised by a [`CipherOracle`](crate::oracle::CipherOracle).
///
/// Any of these aborts the whole search: a broken cipher call means the
/// result cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Ciphertext is not a whole number of cipher blocks.
    #[error("ciphertext length {0} is not a multiple of the 16-byte block size")]
    InvalidCiphertextLength(usize),
    /// PKCS#7 padding was malformed after decryption.
    #[error("padding check failed after decryption")]
    Padding,
    /// Provider-specific failure.
    #[error("cipher provider failure: {0}")]
    Provider(String),
}

/// Errors produced while configuring or running a search.
#[derive(Debug, Error)]
pub enum KeySweepError {
    /// Prefix, segment and suffix do not add up to the cipher key length.
    #[error("key layout covers {actual} bytes, cipher needs {expected}")]
    KeyLength { expected: usize, actual: usize },
    /// Variable segment width is zero.
    #[error("variable key segment must be at least one byte wide")]
    EmptySegment,
    /// Candidate byte range is inverted.
    #[error("invalid candidate byte range [{start}, {end}]")]
    InvalidByteRange { start: u8, end: u8 },
    /// R^W does not fit in a 64-bit index.
    #[error("key space of radix {radix} and width {width} overflows a 64-bit index")]
    KeySpaceOverflow { radix: u64, width: usize },
    /// Key or IV input is not exactly one block long.
    #[error("expected a 16-byte key or IV, got {0} bytes")]
    InvalidBlockLength(usize),
    /// Ciphertext to attack is empty or not a whole number of blocks.
    #[error("ciphertext of {0} bytes is not a non-empty multiple of the 16-byte block size")]
    CiphertextLength(usize),
    /// Hex input could not be decoded.
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// A cipher call failed during the search.
    #[error("cipher oracle failed: {0}")]
    Oracle(#[from] OracleError),
    /// A worker thread could not be started.
    #[error("failed to spawn search worker: {0}")]
    Spawn(#[from] std::io::Error),
    /// A worker thread panicked before reporting.
    #[error("search worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },
}

pub type Result<T> = std::result::Result<T, KeySweepError>;
