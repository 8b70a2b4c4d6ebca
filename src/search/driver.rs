//! Ready-made search setups.
//!
//! [`SelfTest`] hides part of a known key and checks the search recovers it.
//! [`KnownPlaintextAttack`] recovers an unknown key from a ciphertext and the
//! plaintext it encrypts.

use crate::error::{KeySweepError, Result};
use crate::oracle::{BLOCK_LEN, CipherOracle, Iv, Key};
use crate::search::config::KeyLayout;
use crate::search::keyspace::KeySpace;
use crate::search::matcher::{KnownPlaintextMatcher, TargetKeyMatcher};
use crate::search::parallel::{
    CancelToken, ParallelConfig, SearchJob, run_parallel_search_with_cancel,
};
use crate::search::result::SearchOutcome;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Encrypt a message under `true_key`, then search for that key.
#[derive(Debug, Clone)]
pub struct SelfTest {
    pub layout: KeyLayout,
    pub true_key: Key,
    pub plaintext: Vec<u8>,
    pub iv: Iv,
}

impl SelfTest {
    /// The reference run: key `######9Hb3######`, message `Please work...`.
    pub fn reference() -> Self {
        Self {
            layout: KeyLayout::default(),
            true_key: *b"######9Hb3######",
            plaintext: b"Please work...".to_vec(),
            iv: *b"0123456789012345",
        }
    }

    pub fn run<O>(&self, oracle: Arc<O>, config: &ParallelConfig) -> Result<SearchOutcome>
    where
        O: CipherOracle + 'static,
    {
        self.run_with_cancel(oracle, config, CancelToken::new())
    }

    pub fn run_with_cancel<O>(
        &self,
        oracle: Arc<O>,
        config: &ParallelConfig,
        cancel: CancelToken,
    ) -> Result<SearchOutcome>
    where
        O: CipherOracle + 'static,
    {
        let space = KeySpace::new(&self.layout)?;
        if space.index_of(&self.true_key).is_none() {
            warn!("true key lies outside the searchable space; the search cannot succeed");
        }

        // Timing starts before the reference ciphertext is produced.
        let started_at = Instant::now();
        let ciphertext = oracle.encrypt(&self.plaintext, &self.true_key, &self.iv)?;
        debug!(ciphertext = %hex::encode(&ciphertext), "reference ciphertext");

        let job = SearchJob::new(space, ciphertext, self.iv).with_start_time(started_at);
        let matcher = Arc::new(TargetKeyMatcher::new(self.true_key));
        run_parallel_search_with_cancel(&job, matcher, oracle, config, cancel)
    }
}

/// Search for the key that turns `plaintext` into `ciphertext`.
#[derive(Debug, Clone)]
pub struct KnownPlaintextAttack {
    pub layout: KeyLayout,
    pub plaintext: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub iv: Iv,
}

impl KnownPlaintextAttack {
    pub fn run<O>(&self, oracle: Arc<O>, config: &ParallelConfig) -> Result<SearchOutcome>
    where
        O: CipherOracle + 'static,
    {
        let space = KeySpace::new(&self.layout)?;
        if self.ciphertext.is_empty() || self.ciphertext.len() % BLOCK_LEN != 0 {
            return Err(KeySweepError::CiphertextLength(self.ciphertext.len()));
        }
        let job = SearchJob::new(space, self.ciphertext.clone(), self.iv);
        let matcher = Arc::new(KnownPlaintextMatcher::new(
            Arc::clone(&oracle),
            self.plaintext.clone(),
            Arc::clone(&job.ciphertext),
            self.iv,
        ));
        run_parallel_search_with_cancel(&job, matcher, oracle, config, CancelToken::new())
    }
}
