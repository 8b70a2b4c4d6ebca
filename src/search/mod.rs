//! Exhaustive search over a partially known key
//!
//! This module provides the pieces of a key-space sweep:
//! - Key space: the flattened enumeration of candidate keys
//! - Partition: disjoint per-worker assignments of that space
//! - Matcher: the per-candidate test
//! - Parallel: the worker pool with first-match-wins cancellation
//! - Driver: ready-made self-test and known-plaintext setups

pub mod config;
pub mod driver;
pub mod keyspace;
pub mod matcher;
pub mod parallel;
pub mod partition;
pub mod result;

pub use config::{ASCII_END, ASCII_START, KeyLayout, PartitionStrategy};
pub use driver::{KnownPlaintextAttack, SelfTest};
pub use keyspace::KeySpace;
pub use matcher::{CandidateMatcher, KnownPlaintextMatcher, TargetKeyMatcher};
pub use parallel::{
    CancelToken, ParallelConfig, SearchJob, run_parallel_search, run_parallel_search_with_cancel,
};
pub use partition::Assignment;
pub use result::{Discovery, SearchOutcome, SearchStatistics, SearchStatus, WorkerStatistics};
