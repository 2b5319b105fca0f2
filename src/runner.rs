use core::time::Duration;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument};

use crate::config::{Config, ConfigError};
use crate::err::Error;
use crate::random::{derive_worker_seed, RngSource};
use crate::sink::ResultSink;
use crate::store::ElementStore;
use crate::sync::{thread, Arc};
use crate::worker::{Worker, WorkerReport};

/// The outcome of [run].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunSummary {
    /// Wall-clock time from spawning the first worker to joining the last.
    pub elapsed: Duration,
    /// One report per worker, ordered by worker id.
    pub reports: Vec<WorkerReport>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.reports.iter().map(|report| report.completed).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().map(|report| report.failed).sum()
    }
}

/// Run `config.workers()` workers over `store` in parallel, one thread each, and wait for all of
/// them to finish their iterations.
#[instrument(skip(store, sink))]
pub fn run<S: ResultSink + 'static>(
    config: &Config,
    store: Arc<ElementStore>,
    sink: Arc<S>,
) -> Result<RunSummary, Error> {
    if store.len() != config.array_len() {
        return Err(Error::InvalidConfig(ConfigError::StoreLenMismatch {
            expected: config.array_len(),
            actual: store.len(),
        }));
    }
    info!(
        "starting {} workers, {} iterations each, over {} elements",
        config.workers(),
        config.iterations(),
        config.array_len()
    );

    let started: Instant = Instant::now();
    let handles: Vec<thread::JoinHandle<WorkerReport>> = (0..config.workers())
        .map(|worker_id| {
            let store: Arc<ElementStore> = store.clone();
            let sink: Arc<S> = sink.clone();
            let rng: StdRng = match config.seed() {
                Some(seed) => StdRng::seed_from_u64(derive_worker_seed(seed, worker_id)),
                None => StdRng::from_entropy(),
            };
            let iterations: usize = config.iterations();
            let acquire_timeout: Option<Duration> = config.acquire_timeout();
            thread::spawn(move || {
                let mut worker = Worker::new(
                    worker_id,
                    &*store,
                    &*sink,
                    RngSource(rng),
                    iterations,
                );
                if let Some(timeout) = acquire_timeout {
                    worker = worker.with_acquire_timeout(timeout);
                }
                worker.run()
            })
        })
        .collect();

    // join every worker before reporting a panic, so none is left running
    let joined: Vec<Result<WorkerReport, Error>> = handles
        .into_iter()
        .enumerate()
        .map(|(worker_id, handle)| {
            handle
                .join()
                .map_err(|_| Error::WorkerPanicked { worker_id })
        })
        .collect();
    let reports: Vec<WorkerReport> = joined.into_iter().collect::<Result<_, Error>>()?;
    let summary: RunSummary = RunSummary {
        elapsed: started.elapsed(),
        reports,
    };
    info!(
        "finished in {} ms: {} completed, {} failed",
        summary.elapsed.as_millis(),
        summary.completed(),
        summary.failed()
    );
    Ok(summary)
}
