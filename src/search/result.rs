//! Search outcome and statistics

use crate::oracle::Key;
use std::time::Duration;

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// A worker matched a candidate and published it
    Found,
    /// Every candidate was tested without a match
    Exhausted,
    /// Stopped by an external cancel request
    Cancelled,
    /// Stopped because the configured deadline passed
    TimedOut,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStatus::Found => write!(f, "found"),
            SearchStatus::Exhausted => write!(f, "exhausted"),
            SearchStatus::Cancelled => write!(f, "cancelled"),
            SearchStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// The single published match.
///
/// Every field comes from the same discovery event: the key a worker matched,
/// the plaintext recovered with that key and the time at which it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Matched candidate key
    pub key: Key,
    /// Ciphertext decrypted with `key`
    pub plaintext: Vec<u8>,
    /// Time from job start to confirmation
    pub elapsed: Duration,
    /// Worker that found the key
    pub worker_id: usize,
    /// Linear index of the key in the key space
    pub index: u64,
}

impl Discovery {
    /// Key as text, with non-printable bytes escaped.
    pub fn key_text(&self) -> String {
        self.key.escape_ascii().to_string()
    }

    /// Plaintext as text, lossily decoded.
    pub fn plaintext_text(&self) -> String {
        String::from_utf8_lossy(&self.plaintext).into_owned()
    }
}

/// Per-worker counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStatistics {
    pub worker_id: usize,
    /// Candidates this worker tested
    pub candidates_evaluated: u64,
    /// Candidates this worker was assigned
    pub candidates_assigned: u64,
    /// Whether the worker ran to the end of its assignment
    pub completed: bool,
}

/// Statistics from a search
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Total time spent searching
    pub elapsed_time: Duration,
    /// Size of the key space
    pub key_space_size: u64,
    /// Candidates evaluated across all workers
    pub candidates_evaluated: u64,
    /// Number of workers that ran
    pub workers: usize,
    /// Per-worker breakdown, ordered by worker id
    pub per_worker: Vec<WorkerStatistics>,
}

impl SearchStatistics {
    /// Get candidates evaluated per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.candidates_evaluated as f64 / secs
        }
    }

    /// Fraction of the key space that was tested (0.0 to 1.0)
    pub fn coverage(&self) -> f64 {
        if self.key_space_size == 0 {
            0.0
        } else {
            self.candidates_evaluated as f64 / self.key_space_size as f64
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Workers: {}\n", self.workers));
        s.push_str(&format!(
            "Candidates evaluated: {} of {} ({:.2}%)\n",
            self.candidates_evaluated,
            self.key_space_size,
            self.coverage() * 100.0
        ));
        s.push_str(&format!(
            "Throughput: {:.0} candidates/sec\n",
            self.throughput()
        ));
        for worker in &self.per_worker {
            s.push_str(&format!(
                "  worker {}: {} of {}{}\n",
                worker.worker_id,
                worker.candidates_evaluated,
                worker.candidates_assigned,
                if worker.completed { "" } else { " (stopped early)" }
            ));
        }
        s
    }
}

/// Result of a search operation
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    /// Published match, present exactly when `status` is `Found`
    pub discovery: Option<Discovery>,
    pub statistics: SearchStatistics,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        self.discovery.is_some()
    }

    pub fn matched_key(&self) -> Option<&Key> {
        self.discovery.as_ref().map(|d| &d.key)
    }

    pub fn decrypted_plaintext(&self) -> Option<&[u8]> {
        self.discovery.as_ref().map(|d| d.plaintext.as_slice())
    }

    /// Seconds from job start to the match, if there was one.
    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.discovery.as_ref().map(|d| d.elapsed.as_secs_f64())
    }
}

impl std::fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.discovery {
            Some(discovery) => {
                writeln!(f, "KEY FOUND... {}", discovery.key_text())?;
                writeln!(f, "Decrypted text using generated key is:")?;
                writeln!(f, "{}", discovery.plaintext_text())?;
                writeln!(
                    f,
                    "Solution found in {:.6} seconds",
                    discovery.elapsed.as_secs_f64()
                )?;
            }
            None => {
                writeln!(
                    f,
                    "No key found ({} after {} of {} candidates)",
                    self.status,
                    self.statistics.candidates_evaluated,
                    self.statistics.key_space_size
                )?;
            }
        }
        Ok(())
    }
}
