use keysweep::oracle::{Aes128CbcOracle, CipherOracle};
use keysweep::search::{
    CancelToken, KeyLayout, KeySpace, ParallelConfig, PartitionStrategy, SearchJob,
    SearchStatus, SelfTest, TargetKeyMatcher, run_parallel_search, run_parallel_search_with_cancel,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TRUE_KEY: &[u8; 16] = b"######9Hb3######";
const IV: &[u8; 16] = b"0123456789012345";
const MESSAGE: &[u8] = b"Please work...";

fn assert_reference_solution(workers: usize, partition: PartitionStrategy) {
    let config = ParallelConfig::default()
        .with_workers(workers)
        .with_partition(partition);

    let outcome = SelfTest::reference()
        .run(Arc::new(Aes128CbcOracle), &config)
        .unwrap_or_else(|e| panic!("search failed with {} workers: {}", workers, e));

    assert_eq!(outcome.status, SearchStatus::Found);
    let discovery = outcome.discovery.as_ref().unwrap();
    assert_eq!(&discovery.key, TRUE_KEY);
    assert_eq!(&discovery.key[6..10], b"9Hb3");
    assert_eq!(discovery.plaintext, MESSAGE);
    assert!(outcome.elapsed_seconds().unwrap() > 0.0);
}

#[test]
fn test_reference_scenario_four_workers() {
    assert_reference_solution(4, PartitionStrategy::Block);
}

#[test]
fn test_reference_scenario_single_worker() {
    assert_reference_solution(1, PartitionStrategy::Block);
}

#[test]
fn test_reference_scenario_ninety_workers() {
    assert_reference_solution(90, PartitionStrategy::Block);
}

#[test]
fn test_reference_scenario_chunked() {
    assert_reference_solution(4, PartitionStrategy::Chunked);
}

#[test]
fn test_round_trip_with_matched_key() {
    let outcome = SelfTest::reference()
        .run(Arc::new(Aes128CbcOracle), &ParallelConfig::default())
        .unwrap();

    let oracle = Aes128CbcOracle;
    let ciphertext = oracle.encrypt(MESSAGE, TRUE_KEY, IV).unwrap();
    let key = outcome.matched_key().unwrap();
    let decrypted = oracle.decrypt(&ciphertext, key, IV).unwrap();

    assert_eq!(decrypted.len(), MESSAGE.len());
    assert_eq!(decrypted, outcome.decrypted_plaintext().unwrap());
}

#[test]
fn test_out_of_range_segment_is_not_found() {
    // '~' (126) lies above the default range end of 122.
    let test = SelfTest {
        layout: KeyLayout::default()
            .with_prefix(b"########".to_vec())
            .with_suffix(b"######".to_vec())
            .with_width(2),
        true_key: *b"########a~######",
        plaintext: MESSAGE.to_vec(),
        iv: *IV,
    };

    for workers in [1, 4, 8] {
        let outcome = test
            .run(
                Arc::new(Aes128CbcOracle),
                &ParallelConfig::default().with_workers(workers),
            )
            .unwrap();

        assert!(!outcome.found());
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.statistics.candidates_evaluated, 90 * 90);
        assert_eq!(outcome.statistics.key_space_size, 90 * 90);
    }
}

#[test]
fn test_external_cancel_stops_search() {
    // Nothing to find in the full reference space, so only the cancel can end it quickly.
    let space = KeySpace::new(&KeyLayout::default()).unwrap();
    let job = SearchJob::new(space, vec![0u8; 16], *IV);
    let matcher = Arc::new(TargetKeyMatcher::new([0u8; 16]));
    let cancel = CancelToken::new();

    let canceller = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            cancel.cancel();
        })
    };

    let outcome = run_parallel_search_with_cancel(
        &job,
        matcher,
        Arc::new(Aes128CbcOracle),
        &ParallelConfig::default().with_workers(4),
        cancel,
    )
    .unwrap();
    canceller.join().unwrap();

    assert_eq!(outcome.status, SearchStatus::Cancelled);
    assert!(!outcome.found());
    assert!(outcome.statistics.candidates_evaluated < outcome.statistics.key_space_size);
    assert!(outcome.statistics.per_worker.iter().any(|w| !w.completed));
}

#[test]
fn test_independent_searches_do_not_interfere() {
    let layout = KeyLayout::default()
        .with_prefix(b"######9H".to_vec())
        .with_suffix(b"######".to_vec())
        .with_width(2);

    let handles: Vec<_> = [*b"######9Hb3######", *b"######9H!z######"]
        .into_iter()
        .map(|true_key| {
            let layout = layout.clone();
            thread::spawn(move || {
                let test = SelfTest {
                    layout,
                    true_key,
                    plaintext: MESSAGE.to_vec(),
                    iv: *IV,
                };
                let outcome = test
                    .run(Arc::new(Aes128CbcOracle), &ParallelConfig::default())
                    .unwrap();
                (true_key, outcome)
            })
        })
        .collect();

    for handle in handles {
        let (true_key, outcome) = handle.join().unwrap();
        assert_eq!(outcome.matched_key(), Some(&true_key));
    }
}

#[test]
fn test_direct_coordinator_call() {
    let layout = KeyLayout::default()
        .with_prefix(b"######".to_vec())
        .with_suffix(b"3######".to_vec())
        .with_width(3);
    let space = KeySpace::new(&layout).unwrap();
    let ciphertext = Aes128CbcOracle.encrypt(MESSAGE, TRUE_KEY, IV).unwrap();
    let job = SearchJob::new(space, ciphertext, *IV);

    let outcome = run_parallel_search(
        &job,
        Arc::new(TargetKeyMatcher::new(*TRUE_KEY)),
        Arc::new(Aes128CbcOracle),
        &ParallelConfig::default()
            .with_workers(8)
            .with_partition(PartitionStrategy::Chunked)
            .with_chunk_size(100),
    )
    .unwrap();

    let discovery = outcome.discovery.unwrap();
    assert_eq!(job.space.coordinates_of(discovery.index), b"9Hb");
    assert_eq!(discovery.plaintext, MESSAGE);
    assert_eq!(outcome.statistics.per_worker.len(), 8);
}
