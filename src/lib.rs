//! Parallel brute-force recovery of a partially known AES-128-CBC key.
//!
//! A key is modelled as a known prefix, an unknown segment of `W` bytes and a
//! known suffix. Every segment byte ranges over a fixed interval (printable
//! ASCII `33..=122` by default), giving `R^W` candidates. The space is
//! flattened into one index range, split across a fixed pool of worker
//! threads, and swept until one worker matches. That worker decrypts the
//! ciphertext under a lock, publishes the result once, and raises a shared
//! stop flag the other workers poll.
//!
//! # Examples
//!
//! Hide four bytes of a key and recover them:
//!
//! ```no_run
//! use keysweep::oracle::Aes128CbcOracle;
//! use keysweep::search::{ParallelConfig, SelfTest};
//! use std::sync::Arc;
//!
//! let outcome = SelfTest::reference()
//!     .run(Arc::new(Aes128CbcOracle), &ParallelConfig::default())
//!     .unwrap();
//! assert_eq!(outcome.matched_key(), Some(b"######9Hb3######"));
//! ```

pub mod error;
pub mod oracle;
pub mod search;

pub use error::{KeySweepError, OracleError, Result};
