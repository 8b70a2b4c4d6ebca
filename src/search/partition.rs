//! Splitting the flattened key space between workers.

use crate::search::config::PartitionStrategy;
use std::ops::Range;

/// Subranges of `[0, total)` owned by one worker.
///
/// For a fixed `total`, `workers` and strategy, the assignments of workers
/// `0..workers` are pairwise disjoint and their union is the whole range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    strategy: PartitionStrategy,
    total: u64,
    workers: u64,
    worker_id: u64,
    chunk_size: u64,
}

impl Assignment {
    /// Assignment for `worker_id` of `workers`.
    ///
    /// `chunk_size` only matters for [`PartitionStrategy::Chunked`] and is
    /// clamped to at least 1.
    pub fn new(
        strategy: PartitionStrategy,
        total: u64,
        workers: usize,
        worker_id: usize,
        chunk_size: u64,
    ) -> Self {
        let workers = workers.max(1) as u64;
        debug_assert!((worker_id as u64) < workers);
        Self {
            strategy,
            total,
            workers,
            worker_id: worker_id as u64,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of indices this worker owns.
    pub fn len(&self) -> u64 {
        self.ranges().map(|r| r.end - r.start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The owned subranges, in increasing order.
    pub fn ranges(&self) -> Ranges {
        match self.strategy {
            PartitionStrategy::Block => {
                let range = block_bounds(self.total, self.workers, self.worker_id);
                Ranges {
                    next: range.start,
                    end: range.end,
                    step: range.end - range.start,
                    width: range.end - range.start,
                }
            }
            PartitionStrategy::Chunked => Ranges {
                next: self.worker_id.saturating_mul(self.chunk_size),
                end: self.total,
                step: self.workers.saturating_mul(self.chunk_size),
                width: self.chunk_size,
            },
        }
    }
}

/// Near-equal contiguous split; the first `total % workers` blocks get one
/// extra index.
fn block_bounds(total: u64, workers: u64, worker_id: u64) -> Range<u64> {
    let base = total / workers;
    let extra = total % workers;
    let start = worker_id * base + worker_id.min(extra);
    let len = base + u64::from(worker_id < extra);
    start..start + len
}

/// Iterator over the subranges of an [`Assignment`].
#[derive(Debug, Clone)]
pub struct Ranges {
    next: u64,
    end: u64,
    step: u64,
    width: u64,
}

impl Iterator for Ranges {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end || self.width == 0 {
            return None;
        }
        let start = self.next;
        let stop = start.saturating_add(self.width).min(self.end);
        self.next = start.saturating_add(self.step);
        Some(start..stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(strategy: PartitionStrategy, total: u64, workers: usize, chunk: u64) -> Vec<u8> {
        let mut hits = vec![0u8; total as usize];
        for worker_id in 0..workers {
            let assignment = Assignment::new(strategy, total, workers, worker_id, chunk);
            for range in assignment.ranges() {
                for index in range {
                    hits[index as usize] += 1;
                }
            }
        }
        hits
    }

    #[test]
    fn test_block_partition_covers_exactly_once() {
        for workers in [1, 2, 4, 8] {
            for total in [0u64, 1, 7, 90, 8100, 8101] {
                let hits = covered(PartitionStrategy::Block, total, workers, 1);
                assert!(
                    hits.iter().all(|&h| h == 1),
                    "block: total={} workers={}",
                    total,
                    workers
                );
            }
        }
    }

    #[test]
    fn test_chunked_partition_covers_exactly_once() {
        for workers in [1, 2, 4, 8] {
            for chunk in [1u64, 3, 64, 10_000] {
                for total in [0u64, 1, 7, 90, 8100, 8101] {
                    let hits = covered(PartitionStrategy::Chunked, total, workers, chunk);
                    assert!(
                        hits.iter().all(|&h| h == 1),
                        "chunked: total={} workers={} chunk={}",
                        total,
                        workers,
                        chunk
                    );
                }
            }
        }
    }

    #[test]
    fn test_more_workers_than_indices() {
        let hits = covered(PartitionStrategy::Block, 3, 8, 1);
        assert_eq!(hits, vec![1, 1, 1]);

        let idle = Assignment::new(PartitionStrategy::Block, 3, 8, 7, 1);
        assert!(idle.is_empty());
        assert_eq!(idle.ranges().count(), 0);
    }

    #[test]
    fn test_block_sizes_are_balanced() {
        let lens: Vec<u64> = (0..4)
            .map(|id| Assignment::new(PartitionStrategy::Block, 10, 4, id, 1).len())
            .collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
    }

    #[test]
    fn test_chunked_ranges_interleave() {
        let assignment = Assignment::new(PartitionStrategy::Chunked, 20, 2, 1, 4);
        let ranges: Vec<Range<u64>> = assignment.ranges().collect();
        assert_eq!(ranges, vec![4..8, 12..16]);
    }

    #[test]
    fn test_zero_chunk_is_clamped() {
        let assignment = Assignment::new(PartitionStrategy::Chunked, 5, 1, 0, 0);
        assert_eq!(assignment.len(), 5);
    }
}
