//! Parallel search execution over a partitioned key space.
//!
//! # Architecture
//!
//! The parallel search system consists of:
//! - A **coordinator** that spawns a fixed pool of workers, enforces the
//!   optional deadline and joins every worker before returning
//! - Multiple **workers** that each sweep a disjoint share of the key space
//! - A **channel** carrying each worker's final report to the coordinator
//! - **Shared state**: the stop flag workers poll between batches and the
//!   write-once cell holding the first published match
//!
//! # Example
//!
//! ```no_run
//! use keysweep::oracle::Aes128CbcOracle;
//! use keysweep::search::{KeyLayout, KeySpace, ParallelConfig, SearchJob, TargetKeyMatcher};
//! use keysweep::search::run_parallel_search;
//! use std::sync::Arc;
//!
//! let space = KeySpace::new(&KeyLayout::default()).unwrap();
//! let job = SearchJob::new(space, vec![0u8; 16], *b"0123456789012345");
//! let matcher = Arc::new(TargetKeyMatcher::new(*b"######9Hb3######"));
//! let config = ParallelConfig::default().with_workers(4);
//!
//! let outcome = run_parallel_search(&job, matcher, Arc::new(Aes128CbcOracle), &config);
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;

pub use channel::CancelToken;
pub use config::ParallelConfig;
pub use coordinator::{SearchJob, run_parallel_search, run_parallel_search_with_cancel};
