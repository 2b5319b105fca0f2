use lockset::{run, Config, ElementStore, LogRecord, MemorySink, RunSummary};
use tracing::debug;

cfg_if::cfg_if! {
    if #[cfg(loom)] {
        pub(crate) use loom::sync::Arc;
    } else if #[cfg(feature = "shuttle")] {
        pub(crate) use shuttle::sync::Arc;
    } else {
        pub(crate) use std::sync::Arc;
    }
}

/// Run `workers` seeded workers over `array_len` elements and check everything that must hold
/// regardless of interleaving.
pub(crate) fn concurrency_test(array_len: usize, workers: usize, iterations: usize, seed: u64) {
    let initial: Vec<u64> = (0..array_len as u64).map(|value| value * 10).collect();
    let store: Arc<ElementStore> = Arc::new(ElementStore::from_values(initial.iter().copied()));
    let sink: Arc<MemorySink> = Arc::new(MemorySink::new());
    let config: Config = Config::new(array_len, workers, iterations)
        .unwrap()
        .with_seed(seed);

    let summary: RunSummary = run(&config, store.clone(), sink.clone()).unwrap();
    debug!("run finished: {summary:?}");

    assert_eq!(summary.reports.len(), workers);
    assert_eq!(summary.completed(), workers * iterations);
    assert_eq!(summary.failed(), 0);
    assert!(sink.diagnostics().is_empty());

    let records: Vec<LogRecord> = sink.records();
    assert_eq!(records.len(), workers * iterations);
    for worker_id in 0..workers {
        let emitted: usize = records
            .iter()
            .filter(|record| record.worker_id == worker_id)
            .count();
        assert_eq!(emitted, iterations);
    }
    assert!(records
        .iter()
        .all(|record| record.i < array_len && record.j < array_len));

    // records are emitted while the write lock is still held, so per index the sink sees writes
    // in the order they were applied and the last one must be the final value
    let final_values: Vec<u64> = store.snapshot();
    for (index, final_value) in final_values.iter().enumerate() {
        let expected: u64 = records
            .iter()
            .rev()
            .find(|record| record.j == index)
            .map_or(initial[index], |record| record.value);
        assert_eq!(*final_value, expected, "index {index}");
    }
}
