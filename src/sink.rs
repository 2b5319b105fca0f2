use core::fmt::{Display, Formatter};
use std::io::Write;

use crate::err::Error;
use crate::sync::{Mutex, MutexGuard};
use crate::types::{Index, Value, WorkerId};

/// The result of one applied operation, handed to a [ResultSink] by value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogRecord {
    pub worker_id: WorkerId,
    pub i: Index,
    pub j: Index,
    pub value: Value,
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Worker {}: i={}, j={}, Sj={}",
            self.worker_id, self.i, self.j, self.value
        )
    }
}

/// An append-only consumer of results and per-worker diagnostics.
///
/// Many workers emit concurrently, so implementations serialize internally and must keep each
/// call atomic: no record may interleave with another.
pub trait ResultSink: Send + Sync {
    fn emit(&self, record: LogRecord) -> Result<(), Error>;

    fn emit_error(&self, worker_id: WorkerId, message: &str) -> Result<(), Error>;
}

fn lock_sink<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    mutex
        .lock()
        .map_err(|_| Error::SinkUnavailable("a previous writer panicked".to_owned()))
}

fn write_and_flush<W: Write>(writer: &mut W, line: core::fmt::Arguments<'_>) -> std::io::Result<()> {
    writer.write_fmt(line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Writes one line per record to `W`, flushing after every line.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Take the writer back, for example to inspect what was written.
    pub fn into_inner(self) -> Result<W, Error> {
        self.writer
            .into_inner()
            .map_err(|_| Error::SinkUnavailable("a previous writer panicked".to_owned()))
    }

    fn write_line(&self, line: core::fmt::Arguments<'_>) -> Result<(), Error> {
        let mut writer: MutexGuard<'_, W> = lock_sink(&self.writer)?;
        write_and_flush(&mut *writer, line)
            .map_err(|io_error| Error::SinkUnavailable(io_error.to_string()))
    }
}

impl<W: Write + Send> ResultSink for WriterSink<W> {
    fn emit(&self, record: LogRecord) -> Result<(), Error> {
        self.write_line(format_args!("{record}"))
    }

    fn emit_error(&self, worker_id: WorkerId, message: &str) -> Result<(), Error> {
        self.write_line(format_args!("Exception in worker {worker_id}: {message}"))
    }
}

/// Keeps every record and diagnostic in memory.
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
    diagnostics: Mutex<Vec<(WorkerId, String)>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// A copy of every record emitted so far, in emission order.
    pub fn records(&self) -> Vec<LogRecord> {
        crate::sync::ignore_poison(self.records.lock()).clone()
    }

    /// A copy of every diagnostic emitted so far, in emission order.
    pub fn diagnostics(&self) -> Vec<(WorkerId, String)> {
        crate::sync::ignore_poison(self.diagnostics.lock()).clone()
    }
}

impl ResultSink for MemorySink {
    fn emit(&self, record: LogRecord) -> Result<(), Error> {
        lock_sink(&self.records)?.push(record);
        Ok(())
    }

    fn emit_error(&self, worker_id: WorkerId, message: &str) -> Result<(), Error> {
        lock_sink(&self.diagnostics)?.push((worker_id, message.to_owned()));
        Ok(())
    }
}
