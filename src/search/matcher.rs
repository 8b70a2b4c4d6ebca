//! Deciding whether a candidate key is the one being searched for.

use crate::error::OracleError;
use crate::oracle::{BLOCK_LEN, CipherOracle, Iv, Key};
use std::sync::Arc;

/// Test applied by workers to every candidate key.
pub trait CandidateMatcher: Send + Sync {
    /// Whether `candidate` is a solution.
    ///
    /// An error aborts the whole search.
    fn matches(&self, candidate: &Key) -> Result<bool, OracleError>;
}

/// Byte-for-byte comparison with a known key (self-test mode).
#[derive(Debug, Clone)]
pub struct TargetKeyMatcher {
    target: Key,
}

impl TargetKeyMatcher {
    pub fn new(target: Key) -> Self {
        Self { target }
    }
}

impl CandidateMatcher for TargetKeyMatcher {
    fn matches(&self, candidate: &Key) -> Result<bool, OracleError> {
        Ok(*candidate == self.target)
    }
}

/// Encrypts a known plaintext under each candidate and compares against the
/// observed ciphertext.
///
/// Only the first plaintext block is encrypted up front. In CBC the first
/// ciphertext block depends on nothing else, so a mismatch there rejects the
/// candidate; the full message is encrypted only on a first-block hit.
pub struct KnownPlaintextMatcher<O> {
    oracle: Arc<O>,
    plaintext: Vec<u8>,
    ciphertext: Arc<[u8]>,
    iv: Iv,
}

impl<O: CipherOracle> KnownPlaintextMatcher<O> {
    pub fn new(oracle: Arc<O>, plaintext: impl Into<Vec<u8>>, ciphertext: Arc<[u8]>, iv: Iv) -> Self {
        Self {
            oracle,
            plaintext: plaintext.into(),
            ciphertext,
            iv,
        }
    }
}

impl<O: CipherOracle> CandidateMatcher for KnownPlaintextMatcher<O> {
    fn matches(&self, candidate: &Key) -> Result<bool, OracleError> {
        let head = &self.plaintext[..self.plaintext.len().min(BLOCK_LEN)];
        let produced = self.oracle.encrypt(head, candidate, &self.iv)?;
        if produced.get(..BLOCK_LEN) != self.ciphertext.get(..BLOCK_LEN) {
            return Ok(false);
        }
        if head.len() == self.plaintext.len() {
            return Ok(produced[..] == self.ciphertext[..]);
        }

        let produced = self.oracle.encrypt(&self.plaintext, candidate, &self.iv)?;
        Ok(produced[..] == self.ciphertext[..])
    }
}
