//! Shared state and messaging between search workers and the coordinator.

use crate::error::OracleError;
use crate::search::result::Discovery;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Message sent from workers to the coordinator.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Worker left its loop, either at the end of its assignment or because
    /// the stop flag was raised.
    Finished {
        worker_id: usize,
        candidates_evaluated: u64,
        completed: bool,
    },
    /// A cipher call failed; the search must be abandoned.
    Failed {
        worker_id: usize,
        candidates_evaluated: u64,
        error: OracleError,
    },
}

/// Cooperative stop signal.
///
/// Clones share one flag. The coordinator raises it on a match or timeout;
/// callers may raise it from outside to cancel a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker to stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Write-once holder for the winning [`Discovery`].
#[derive(Debug, Default)]
pub struct DiscoveryCell {
    slot: Mutex<Option<Discovery>>,
}

impl DiscoveryCell {
    /// Publish the value built by `make` unless something is already there.
    ///
    /// `make` and `on_published` run while the cell is locked, so a second
    /// caller waits for the first to finish and then returns `Ok(false)`
    /// without calling its own `make`. If `make` fails the cell stays empty.
    pub fn try_publish<E>(
        &self,
        make: impl FnOnce() -> Result<Discovery, E>,
        on_published: impl FnOnce(&Discovery),
    ) -> Result<bool, E> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Ok(false);
        }
        let discovery = slot.insert(make()?);
        on_published(discovery);
        Ok(true)
    }

    pub fn get(&self) -> Option<Discovery> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Discovery>> {
        // A panic elsewhere cannot leave a half-written Option behind.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State every worker reads without going through the channel.
#[derive(Debug, Default)]
pub struct SharedSearchState {
    stop: CancelToken,
    discovery: DiscoveryCell,
    evaluated: AtomicU64,
}

impl SharedSearchState {
    /// Shared state whose stop flag is tied to `stop`.
    pub fn with_token(stop: CancelToken) -> Self {
        Self {
            stop,
            ..Self::default()
        }
    }

    /// Check if we should stop searching.
    pub fn should_stop(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Signal all workers to stop.
    pub fn signal_stop(&self) {
        self.stop.cancel();
    }

    /// First-match-wins publication: build and store the discovery, then
    /// raise the stop flag, all under one lock.
    pub fn publish(
        &self,
        make: impl FnOnce() -> Result<Discovery, OracleError>,
    ) -> Result<bool, OracleError> {
        self.discovery.try_publish(make, |_| self.stop.cancel())
    }

    pub fn discovery(&self) -> Option<Discovery> {
        self.discovery.get()
    }

    /// Add to the running count of tested candidates.
    pub fn record_progress(&self, candidates: u64) {
        self.evaluated.fetch_add(candidates, Ordering::Relaxed);
    }

    pub fn candidates_evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }
}

/// Channel endpoints for a worker.
pub struct WorkerChannels {
    /// Send messages to coordinator.
    pub to_coordinator: Sender<WorkerMessage>,
    /// Shared stop flag, discovery cell and counters.
    pub shared: Arc<SharedSearchState>,
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    /// Receive messages from workers.
    pub from_workers: Receiver<WorkerMessage>,
    /// Shared state.
    pub shared: Arc<SharedSearchState>,
}

/// Create channels for parallel search with the given number of workers.
pub fn create_channels(
    num_workers: usize,
    stop: CancelToken,
) -> (CoordinatorChannels, Vec<WorkerChannels>) {
    let shared = Arc::new(SharedSearchState::with_token(stop));

    // Unbounded so a finishing worker never blocks on the coordinator.
    let (worker_tx, coordinator_rx) = unbounded();

    let worker_channels = (0..num_workers)
        .map(|_| WorkerChannels {
            to_coordinator: worker_tx.clone(),
            shared: Arc::clone(&shared),
        })
        .collect();

    let coordinator = CoordinatorChannels {
        from_workers: coordinator_rx,
        shared,
    };

    (coordinator, worker_channels)
}
