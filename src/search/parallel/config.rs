//! Configuration for parallel search execution.

use crate::search::config::PartitionStrategy;
use std::time::Duration;

/// Worker pool size used when none is given.
pub const DEFAULT_WORKERS: usize = 4;
/// Candidates per chunk for [`PartitionStrategy::Chunked`].
pub const DEFAULT_CHUNK_SIZE: u64 = 4096;
/// Candidates tested between two looks at the stop flag.
pub const DEFAULT_CHECK_INTERVAL: u64 = 1024;

/// Configuration for parallel search execution.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads to spawn.
    pub num_workers: usize,
    /// How the index range is split between workers.
    pub partition: PartitionStrategy,
    /// Chunk size for chunked partitioning.
    pub chunk_size: u64,
    /// Candidates a worker tests between stop-flag checks.
    pub check_interval: u64,
    /// Overall timeout for the parallel search.
    pub timeout: Option<Duration>,
    /// How often the coordinator wakes to check deadline and progress.
    pub poll_interval: Duration,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            partition: PartitionStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
            timeout: None,
            poll_interval: Duration::from_millis(100),
            show_progress: false,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel config with the specified number of workers.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Use one worker per logical CPU.
    pub fn with_all_cores(self) -> Self {
        self.with_workers(num_cpus::get())
    }

    pub fn with_partition(mut self, partition: PartitionStrategy) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval.max(1);
        self
    }

    /// Set the overall timeout for parallel search.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the overall timeout from an Option.
    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}
