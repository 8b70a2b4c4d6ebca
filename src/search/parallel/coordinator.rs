//! Parallel search coordinator that manages worker threads.

use crate::error::{KeySweepError, OracleError, Result};
use crate::oracle::{CipherOracle, Iv, Key};
use crate::search::keyspace::KeySpace;
use crate::search::matcher::CandidateMatcher;
use crate::search::parallel::channel::{
    CancelToken, CoordinatorChannels, SharedSearchState, WorkerChannels, WorkerMessage,
    create_channels,
};
use crate::search::parallel::config::ParallelConfig;
use crate::search::partition::Assignment;
use crate::search::result::{
    Discovery, SearchOutcome, SearchStatistics, SearchStatus, WorkerStatistics,
};
use crossbeam_channel::RecvTimeoutError;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a search needs besides the matcher and the cipher.
#[derive(Debug, Clone)]
pub struct SearchJob {
    /// Candidate keys to sweep
    pub space: KeySpace,
    /// Reference ciphertext, decrypted once with the winning key
    pub ciphertext: Arc<[u8]>,
    pub iv: Iv,
    /// Origin for the reported solve time
    pub started_at: Instant,
}

impl SearchJob {
    pub fn new(space: KeySpace, ciphertext: impl Into<Arc<[u8]>>, iv: Iv) -> Self {
        Self {
            space,
            ciphertext: ciphertext.into(),
            iv,
            started_at: Instant::now(),
        }
    }

    /// Measure elapsed time from `started_at` instead of job creation.
    pub fn with_start_time(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }
}

/// Run parallel search with the given configuration.
pub fn run_parallel_search<M, O>(
    job: &SearchJob,
    matcher: Arc<M>,
    oracle: Arc<O>,
    config: &ParallelConfig,
) -> Result<SearchOutcome>
where
    M: CandidateMatcher + 'static,
    O: CipherOracle + 'static,
{
    run_parallel_search_with_cancel(job, matcher, oracle, config, CancelToken::new())
}

/// Run parallel search that also stops when `cancel` is raised.
///
/// Returns only after every worker thread has been joined.
pub fn run_parallel_search_with_cancel<M, O>(
    job: &SearchJob,
    matcher: Arc<M>,
    oracle: Arc<O>,
    config: &ParallelConfig,
    cancel: CancelToken,
) -> Result<SearchOutcome>
where
    M: CandidateMatcher + 'static,
    O: CipherOracle + 'static,
{
    let start_time = Instant::now();
    let num_workers = config.num_workers.max(1);
    let total = job.space.total_size();

    info!(
        key_space = total,
        radix = job.space.radix(),
        workers = num_workers,
        partition = %config.partition,
        "starting key search"
    );

    let (coordinator_channels, worker_channels) = create_channels(num_workers, cancel);
    let job = Arc::new(job.clone());

    let assignments: Vec<Assignment> = (0..num_workers)
        .map(|worker_id| {
            Assignment::new(
                config.partition,
                total,
                num_workers,
                worker_id,
                config.chunk_size,
            )
        })
        .collect();

    let mut worker_handles = Vec::with_capacity(num_workers);
    for ((worker_id, channels), assignment) in
        worker_channels.into_iter().enumerate().zip(&assignments)
    {
        let job = Arc::clone(&job);
        let matcher = Arc::clone(&matcher);
        let oracle = Arc::clone(&oracle);
        let assignment = assignment.clone();
        let check_interval = config.check_interval.max(1);

        let spawned = std::thread::Builder::new()
            .name(format!("sweep-worker-{}", worker_id))
            .spawn(move || {
                run_worker(
                    worker_id,
                    &job,
                    &assignment,
                    matcher.as_ref(),
                    oracle.as_ref(),
                    check_interval,
                    channels,
                )
            });

        match spawned {
            Ok(handle) => worker_handles.push(handle),
            Err(e) => {
                error!(worker_id, "failed to spawn search worker: {}", e);
                coordinator_channels.shared.signal_stop();
                // Already running workers must not outlive this call.
                let _ = join_workers(worker_handles);
                return Err(KeySweepError::Spawn(e));
            }
        }
    }

    let report = run_coordinator(&coordinator_channels, config, &assignments, start_time);

    // Wait for all workers to finish
    let panicked = join_workers(worker_handles);

    if let Some(error) = report.failure {
        return Err(error.into());
    }
    if let Some(worker_id) = panicked {
        return Err(KeySweepError::WorkerPanicked { worker_id });
    }

    let shared = &coordinator_channels.shared;
    let mut per_worker = report.per_worker;
    per_worker.sort_by_key(|w| w.worker_id);

    let statistics = SearchStatistics {
        elapsed_time: start_time.elapsed(),
        key_space_size: total,
        candidates_evaluated: per_worker.iter().map(|w| w.candidates_evaluated).sum(),
        workers: num_workers,
        per_worker,
    };

    let discovery = shared.discovery();
    let status = if discovery.is_some() {
        SearchStatus::Found
    } else if statistics.per_worker.len() == num_workers
        && statistics.per_worker.iter().all(|w| w.completed)
    {
        SearchStatus::Exhausted
    } else if report.timed_out {
        SearchStatus::TimedOut
    } else {
        SearchStatus::Cancelled
    };

    match &discovery {
        Some(d) => info!(
            worker_id = d.worker_id,
            index = d.index,
            elapsed = ?d.elapsed,
            "key search finished with a match"
        ),
        None => info!(
            %status,
            candidates = statistics.candidates_evaluated,
            "key search finished without a match"
        ),
    }

    Ok(SearchOutcome {
        status,
        discovery,
        statistics,
    })
}

/// What the coordinator loop learned from the workers.
struct CoordinatorReport {
    per_worker: Vec<WorkerStatistics>,
    failure: Option<OracleError>,
    timed_out: bool,
}

/// Coordinator loop that receives messages from workers until all are done.
fn run_coordinator(
    channels: &CoordinatorChannels,
    config: &ParallelConfig,
    assignments: &[Assignment],
    start_time: Instant,
) -> CoordinatorReport {
    let total_workers = assignments.len();
    let mut per_worker = Vec::with_capacity(total_workers);
    let mut failure = None;
    let mut timed_out = false;

    let deadline = config.timeout.map(|t| start_time + t);
    let progress = progress_bar(config, assignments.iter().map(Assignment::len).sum());

    while per_worker.len() < total_workers {
        // Check if we've exceeded timeout
        if !timed_out
            && deadline.is_some_and(|d| Instant::now() >= d)
            && !channels.shared.should_stop()
        {
            warn!("search deadline reached, stopping workers");
            timed_out = true;
            channels.shared.signal_stop();
        }

        match channels.from_workers.recv_timeout(config.poll_interval) {
            Ok(WorkerMessage::Finished {
                worker_id,
                candidates_evaluated,
                completed,
            }) => {
                debug!(worker_id, candidates_evaluated, completed, "worker finished");
                per_worker.push(WorkerStatistics {
                    worker_id,
                    candidates_evaluated,
                    candidates_assigned: assignments[worker_id].len(),
                    completed,
                });
            }
            Ok(WorkerMessage::Failed {
                worker_id,
                candidates_evaluated,
                error,
            }) => {
                error!(worker_id, "cipher oracle failed, aborting search: {}", error);
                channels.shared.signal_stop();
                failure.get_or_insert(error);
                per_worker.push(WorkerStatistics {
                    worker_id,
                    candidates_evaluated,
                    candidates_assigned: assignments[worker_id].len(),
                    completed: false,
                });
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Every sender is gone; remaining workers died without reporting.
                break;
            }
        }

        progress.set_position(channels.shared.candidates_evaluated());
    }

    progress.finish_and_clear();

    CoordinatorReport {
        per_worker,
        failure,
        timed_out,
    }
}

fn progress_bar(config: &ParallelConfig, total: u64) -> ProgressBar {
    if !config.show_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} ({per_sec}, eta {eta})",
    ) {
        bar.set_style(style);
    }
    bar
}

/// Join every worker; returns the id of one that panicked, if any.
fn join_workers(handles: Vec<JoinHandle<()>>) -> Option<usize> {
    let mut panicked = None;
    for (worker_id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            error!(worker_id, "search worker panicked");
            panicked.get_or_insert(worker_id);
        }
    }
    panicked
}

/// Raises the stop flag if the worker unwinds, so the rest of the pool
/// stops instead of sweeping to the end of their assignments.
struct StopOnPanic<'a> {
    worker_id: usize,
    shared: &'a SharedSearchState,
}

impl Drop for StopOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!(worker_id = self.worker_id, "search worker panicking, stopping search");
            self.shared.signal_stop();
        }
    }
}

/// How a worker's sweep ended.
struct Sweep {
    evaluated: u64,
    completed: bool,
}

/// Worker function: sweep the assignment, then report to the coordinator.
fn run_worker<M, O>(
    worker_id: usize,
    job: &SearchJob,
    assignment: &Assignment,
    matcher: &M,
    oracle: &O,
    check_interval: u64,
    channels: WorkerChannels,
) where
    M: CandidateMatcher + ?Sized,
    O: CipherOracle + ?Sized,
{
    debug!(worker_id, assigned = assignment.len(), "worker starting");

    let shared = channels.shared.as_ref();
    let _guard = StopOnPanic { worker_id, shared };
    let message = match sweep(worker_id, job, assignment, matcher, oracle, check_interval, shared) {
        Ok(sweep) => WorkerMessage::Finished {
            worker_id,
            candidates_evaluated: sweep.evaluated,
            completed: sweep.completed,
        },
        Err((evaluated, error)) => {
            // Abort everyone now rather than waiting for the coordinator.
            shared.signal_stop();
            WorkerMessage::Failed {
                worker_id,
                candidates_evaluated: evaluated,
                error,
            }
        }
    };

    let _ = channels.to_coordinator.send(message);
}

/// Test candidates in order, looking at the stop flag every
/// `check_interval` candidates.
fn sweep<M, O>(
    worker_id: usize,
    job: &SearchJob,
    assignment: &Assignment,
    matcher: &M,
    oracle: &O,
    check_interval: u64,
    shared: &SharedSearchState,
) -> std::result::Result<Sweep, (u64, OracleError)>
where
    M: CandidateMatcher + ?Sized,
    O: CipherOracle + ?Sized,
{
    let mut evaluated = 0u64;
    let mut unreported = 0u64;

    if shared.should_stop() {
        return Ok(Sweep {
            evaluated,
            completed: false,
        });
    }

    for range in assignment.ranges() {
        for (index, candidate) in job.space.candidates(range) {
            if unreported >= check_interval {
                shared.record_progress(unreported);
                unreported = 0;
                if shared.should_stop() {
                    debug!(worker_id, evaluated, "worker observed stop flag");
                    return Ok(Sweep {
                        evaluated,
                        completed: false,
                    });
                }
            }

            evaluated += 1;
            unreported += 1;

            let matched = match matcher.matches(&candidate) {
                Ok(matched) => matched,
                Err(e) => {
                    shared.record_progress(unreported);
                    return Err((evaluated, e));
                }
            };
            if !matched {
                continue;
            }

            shared.record_progress(unreported);
            let published = shared
                .publish(|| decrypt_discovery(worker_id, index, candidate, job, oracle))
                .map_err(|e| (evaluated, e))?;
            if published {
                info!(worker_id, index, "worker published matching key");
            } else {
                debug!(worker_id, index, "match already published by another worker");
            }
            return Ok(Sweep {
                evaluated,
                completed: false,
            });
        }
    }

    shared.record_progress(unreported);
    Ok(Sweep {
        evaluated,
        completed: true,
    })
}

/// Runs inside the discovery lock: decrypt once with the winning key.
fn decrypt_discovery<O: CipherOracle + ?Sized>(
    worker_id: usize,
    index: u64,
    key: Key,
    job: &SearchJob,
    oracle: &O,
) -> std::result::Result<Discovery, OracleError> {
    let plaintext = oracle.decrypt(&job.ciphertext, &key, &job.iv)?;
    Ok(Discovery {
        key,
        plaintext,
        elapsed: job.started_at.elapsed(),
        worker_id,
        index,
    })
}
