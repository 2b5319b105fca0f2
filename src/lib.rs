//! Deadlock-avoiding, all-or-nothing acquisition of per-element reader-writer locks over a shared
//! fixed-size array.
//!
//! Workers repeatedly pick an operation `(i, j)`, lock `i`, `i + 1` and `i + 2` (mod N) shared and
//! `j` exclusive, write the sum of the three reads to `j`, and release. The lock set differs per
//! operation and overlaps between workers, so the [acquirer](acquire) never blocks on a single
//! lock: it tries the whole set in ascending index order and rolls back on the first contended
//! entry.
//!
//! ```
//! use lockset::{apply_operation, ElementStore, Operation};
//!
//! let store = ElementStore::from_values([10, 20, 30, 40, 50]);
//! let applied = apply_operation(&store, Operation::new(1, 3)).unwrap();
//! assert_eq!(applied.value, 90);
//! assert_eq!(store.snapshot(), vec![10, 20, 30, 90, 50]);
//! ```

pub mod acquire;
pub mod config;
pub mod err;
pub mod held;
pub mod random;
pub mod request;
pub mod runner;
pub mod sink;
pub mod store;
pub mod sync;
pub mod types;
pub mod worker;

pub use acquire::{acquire, acquire_within};
pub use config::{Config, ConfigError};
pub use err::Error;
pub use held::HeldLockSet;
pub use random::{derive_worker_seed, RngSource, UniformSource};
pub use request::{LockEntry, LockRequest, Operation};
pub use runner::{run, RunSummary};
pub use sink::{LogRecord, MemorySink, ResultSink, WriterSink};
pub use store::ElementStore;
pub use sync::Arc;
pub use types::{Index, Mode, Value, WorkerId};
pub use worker::{apply_operation, Applied, Stage, Worker, WorkerReport};
