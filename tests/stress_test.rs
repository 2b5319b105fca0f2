#![cfg(all(not(loom), not(feature = "shuttle")))]

mod common;

use common::Arc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lockset::{
    acquire, apply_operation, run, Applied, Config, ElementStore, HeldLockSet, LockRequest,
    MemorySink, Mode, Operation, RunSummary,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

/// Holder counts for one index, updated from inside critical sections.
#[derive(Default)]
struct Occupancy {
    readers: AtomicUsize,
    writers: AtomicUsize,
}

#[test]
fn test_many_workers_on_a_tiny_array_terminate() {
    let (done_sender, done_receiver) = mpsc::channel::<RunSummary>();
    thread::spawn(move || {
        let store: Arc<ElementStore> = Arc::new(ElementStore::with_random_values(8));
        let sink: Arc<MemorySink> = Arc::new(MemorySink::new());
        let config: Config = Config::new(8, 20, 500).unwrap();
        let summary: RunSummary = run(&config, store, sink).unwrap();
        done_sender.send(summary).unwrap();
    });

    let summary: RunSummary = done_receiver
        .recv_timeout(Duration::from_secs(120))
        .expect("workers did not finish in time, likely a deadlock");
    assert_eq!(summary.completed(), 20 * 500);
    assert_eq!(summary.failed(), 0);
}

#[test]
fn test_seeded_runs_keep_final_state_consistent() {
    common::concurrency_test(8, 20, 200, 11);
    common::concurrency_test(64, 8, 500, 12);
    common::concurrency_test(3, 6, 100, 13);
    common::concurrency_test(1, 4, 50, 14);
}

#[test]
fn test_shared_and_exclusive_holders_never_overlap() {
    const LEN: usize = 6;
    const THREADS: usize = 12;
    const ROUNDS: usize = 2000;

    let store: ElementStore = ElementStore::from_values([0; LEN]);
    let occupancy: Vec<Occupancy> = (0..LEN).map(|_| Occupancy::default()).collect();

    thread::scope(|scope| {
        for thread_index in 0..THREADS {
            let store: &ElementStore = &store;
            let occupancy: &[Occupancy] = &occupancy;
            scope.spawn(move || {
                let mut rng: StdRng = StdRng::seed_from_u64(thread_index as u64);
                for _ in 0..ROUNDS {
                    let request: LockRequest = LockRequest::new((0..3).map(|_| {
                        let mode: Mode = if rng.gen_bool(0.3) {
                            Mode::Exclusive
                        } else {
                            Mode::Shared
                        };
                        (rng.gen_range(0..LEN), mode)
                    }));
                    let held: HeldLockSet = acquire(store, &request).unwrap();

                    // every requested index is held in its requested mode
                    for entry in request.entries() {
                        assert_eq!(held.mode(entry.index), Some(entry.mode));
                    }
                    assert_eq!(held.len(), request.len());

                    for entry in request.entries() {
                        let slot: &Occupancy = &occupancy[entry.index];
                        match entry.mode {
                            Mode::Shared => {
                                slot.readers.fetch_add(1, Ordering::SeqCst);
                                assert_eq!(slot.writers.load(Ordering::SeqCst), 0);
                            }
                            Mode::Exclusive => {
                                assert_eq!(slot.writers.fetch_add(1, Ordering::SeqCst), 0);
                                assert_eq!(slot.readers.load(Ordering::SeqCst), 0);
                            }
                        }
                    }
                    thread::yield_now();
                    for entry in request.entries() {
                        let slot: &Occupancy = &occupancy[entry.index];
                        match entry.mode {
                            Mode::Shared => slot.readers.fetch_sub(1, Ordering::SeqCst),
                            Mode::Exclusive => slot.writers.fetch_sub(1, Ordering::SeqCst),
                        };
                    }
                    drop(held);
                }
            });
        }
    });
}

#[test]
fn test_applied_operations_replay_arithmetically() {
    const LEN: usize = 10;
    const THREADS: usize = 8;
    const ROUNDS: usize = 1000;

    let initial: Vec<u64> = (1..=LEN as u64).collect();
    let store: ElementStore = ElementStore::from_values(initial.iter().copied());

    let applied: Vec<Vec<Applied>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|thread_index| {
                let store: &ElementStore = &store;
                scope.spawn(move || {
                    let mut rng: StdRng = StdRng::seed_from_u64(100 + thread_index as u64);
                    (0..ROUNDS)
                        .map(|_| {
                            let operation: Operation =
                                Operation::new(rng.gen_range(0..LEN), rng.gen_range(0..LEN));
                            apply_operation(store, operation).unwrap()
                        })
                        .collect::<Vec<Applied>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    });

    let all: Vec<&Applied> = applied.iter().flatten().collect();
    assert_eq!(all.len(), THREADS * ROUNDS);
    for record in &all {
        let sum: u64 = record
            .operands
            .iter()
            .fold(0u64, |sum, operand| sum.wrapping_add(*operand));
        assert_eq!(record.value, sum);
        assert!(record.passes >= 1);
    }

    let mut written: Vec<HashSet<u64>> = initial
        .iter()
        .map(|value| HashSet::from([*value]))
        .collect();
    for record in &all {
        written[record.operation.write].insert(record.value);
    }

    // every operand is a value that was really stored at its index, never one from a torn or
    // unlocked read
    for record in &all {
        let read_indices: [usize; 3] = record.operation.read_indices(LEN);
        for (index, operand) in read_indices.into_iter().zip(record.operands) {
            assert!(
                written[index].contains(&operand),
                "operand {operand} at index {index} was never stored there"
            );
        }
    }

    // every final value is the initial value or one of the values written to that index
    for (index, final_value) in store.into_values().into_iter().enumerate() {
        assert!(written[index].contains(&final_value), "index {index}");
    }
}

#[test]
fn test_writes_to_one_index_are_linearizable() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 500;

    // a read-increment-write of index 3 only counts every round if each write fully precedes or
    // follows every other one; the shared reads of 1 and 2 overlap freely
    let store: ElementStore = ElementStore::from_values([0, 0, 0, 0]);
    let request: LockRequest =
        LockRequest::new([(1, Mode::Shared), (2, Mode::Shared), (3, Mode::Exclusive)]);

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let store: &ElementStore = &store;
            let request: &LockRequest = &request;
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    let mut held: HeldLockSet = acquire(store, request).unwrap();
                    let current: u64 = store.read(&held, 3).unwrap();
                    thread::yield_now();
                    store.write(&mut held, 3, current + 1).unwrap();
                }
            });
        }
    });

    assert_eq!(store.snapshot(), vec![0, 0, 0, (THREADS * ROUNDS) as u64]);
}
