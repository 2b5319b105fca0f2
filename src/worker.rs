use core::fmt::{Display, Formatter};
use core::time::Duration;

use crate::acquire::{acquire, acquire_within};
use crate::err::Error;
use crate::held::HeldLockSet;
use crate::random::UniformSource;
use crate::request::{LockRequest, Operation};
use crate::sink::{LogRecord, ResultSink};
use crate::store::ElementStore;
use crate::types::{Index, Value, WorkerId};
use tracing::{debug, error, instrument, trace, warn};

/// The stage of a worker's current iteration.
///
/// `GenerateIndices` → `AcquireLocks` → `ComputeAndWrite` → `Emit` → `Release`, then either back
/// to `GenerateIndices` or, once the iteration count is exhausted, `Done`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    GenerateIndices,
    AcquireLocks,
    ComputeAndWrite,
    Emit,
    Release,
    Done,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// What one applied operation read and wrote.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Applied {
    pub operation: Operation,
    /// The values of `i`, `i + 1` and `i + 2` (mod N) as read under the lock set.
    pub operands: [Value; 3],
    /// The wrapping sum of `operands`, written to `j`.
    pub value: Value,
    /// Passes the acquisition took.
    pub passes: usize,
}

/// Per-worker totals returned by [Worker::run].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub completed: usize,
    pub failed: usize,
    /// Passes beyond the first, summed over all successful acquisitions.
    pub contended_passes: usize,
}

/// Read the operands of `operation` through `held`, write their sum, and return what happened.
fn compute_and_write(
    store: &ElementStore,
    held: &mut HeldLockSet<'_>,
    operation: Operation,
) -> Result<Applied, Error> {
    let read_indices: [Index; 3] = operation.read_indices(store.len());
    let mut operands: [Value; 3] = [0; 3];
    for (operand, index) in operands.iter_mut().zip(read_indices) {
        *operand = store.read(held, index)?;
    }
    let value: Value = operands
        .iter()
        .fold(0, |sum: Value, operand| sum.wrapping_add(*operand));
    store.write(held, operation.write, value)?;
    Ok(Applied {
        operation,
        operands,
        value,
        passes: held.passes(),
    })
}

fn acquire_for<'a>(
    store: &'a ElementStore,
    request: &LockRequest,
    timeout: Option<Duration>,
) -> Result<HeldLockSet<'a>, Error> {
    match timeout {
        Some(timeout) => acquire_within(store, request, timeout),
        None => acquire(store, request),
    }
}

/// Apply a single operation: acquire its lock set, write the sum of its three operands to its write
/// index, and release. Nothing is emitted.
#[instrument(level = "trace", skip(store))]
pub fn apply_operation(store: &ElementStore, operation: Operation) -> Result<Applied, Error> {
    let request: LockRequest = operation.lock_request(store.len())?;
    let mut held: HeldLockSet = acquire(store, &request)?;
    compute_and_write(store, &mut held, operation)
}

/// Drives one worker's loop over the shared store for a fixed number of iterations.
pub struct Worker<'a, S: ResultSink + ?Sized, U: UniformSource> {
    id: WorkerId,
    store: &'a ElementStore,
    sink: &'a S,
    source: U,
    iterations: usize,
    acquire_timeout: Option<Duration>,
    stage: Stage,
    contended_passes: usize,
}

impl<'a, S: ResultSink + ?Sized, U: UniformSource> Worker<'a, S, U> {
    pub fn new(
        id: WorkerId,
        store: &'a ElementStore,
        sink: &'a S,
        source: U,
        iterations: usize,
    ) -> Self {
        Self {
            id,
            store,
            sink,
            source,
            iterations,
            acquire_timeout: None,
            stage: Stage::GenerateIndices,
            contended_passes: 0,
        }
    }

    /// Bound every acquisition. A timed-out iteration is reported as failed.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// The stage the worker is in, or the stage it failed in if the last iteration failed.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run every iteration, leaving the worker in [Stage::Done]. A failing iteration is logged,
    /// reported through [ResultSink::emit_error], and does not stop the remaining ones. A
    /// diagnostic the sink refuses is logged and dropped.
    #[instrument(skip(self), fields(worker_id = self.id, iterations = self.iterations))]
    pub fn run(&mut self) -> WorkerReport {
        let mut report: WorkerReport = WorkerReport {
            worker_id: self.id,
            ..WorkerReport::default()
        };
        for iteration in 0..self.iterations {
            match self.run_iteration() {
                Ok(record) => {
                    report.completed += 1;
                    debug!("iteration {iteration}: {record}");
                }
                Err(iteration_error) => {
                    report.failed += 1;
                    let message: String =
                        format!("iteration {iteration} failed during {}: {iteration_error}", self.stage);
                    warn!("worker {}: {message}", self.id);
                    if let Err(sink_error) = self.sink.emit_error(self.id, &message) {
                        error!("worker {}: could not report failure: {sink_error}", self.id);
                    }
                }
            }
        }
        report.contended_passes = self.contended_passes;
        self.stage = Stage::Done;
        trace!("worker {}: done", self.id);
        report
    }

    /// Run one iteration. The lock set is released before this returns, whether it succeeds or
    /// fails.
    pub fn run_iteration(&mut self) -> Result<LogRecord, Error> {
        let len: usize = self.store.len();
        if len == 0 {
            return Err(Error::InvalidIndex { index: 0, len });
        }

        self.stage = Stage::GenerateIndices;
        let high: u64 = (len - 1) as u64;
        let read_start: Index = self.source.uniform(0, high) as Index;
        let write: Index = self.source.uniform(0, high) as Index;
        let operation: Operation = Operation::new(read_start, write);
        let request: LockRequest = operation.lock_request(len)?;

        self.stage = Stage::AcquireLocks;
        let mut held: HeldLockSet = acquire_for(self.store, &request, self.acquire_timeout)?;
        self.contended_passes += held.passes() - 1;

        self.stage = Stage::ComputeAndWrite;
        let applied: Applied = compute_and_write(self.store, &mut held, operation)?;

        self.stage = Stage::Emit;
        let record: LogRecord = LogRecord {
            worker_id: self.id,
            i: read_start,
            j: write,
            value: applied.value,
        };
        self.sink.emit(record)?;

        self.stage = Stage::Release;
        held.release();
        Ok(record)
    }
}
