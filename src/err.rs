use crate::config::ConfigError;
use crate::types::{Index, WorkerId};
use displaydoc::Display;

/// Any error which can occur while acquiring locks, applying an operation, or emitting results.
///
/// Contention is never an error: the acquirer retries it internally.
#[derive(Debug, Display, Eq, PartialEq)]
pub enum Error {
    /// Index {index} is outside the array of length {len}.
    InvalidIndex { index: Index, len: usize },

    /** Gave up acquiring the lock set after {passes} passes and {elapsed_ms} ms. No lock from
        the request is held.
    */
    AcquisitionTimeout { passes: usize, elapsed_ms: u128 },

    /// The result sink rejected a record: {0}
    SinkUnavailable(String),

    /// Index {index} is not part of the held lock set.
    LockNotHeld { index: Index },

    /// Index {index} is held in shared mode but the operation needs exclusive mode.
    NotExclusive { index: Index },

    /// The held lock set was acquired on a different element store.
    ForeignLockSet,

    /// Invalid configuration: {0}
    InvalidConfig(ConfigError),

    /// Worker {worker_id} panicked before finishing its iterations.
    WorkerPanicked { worker_id: WorkerId },
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(config_error: ConfigError) -> Self {
        Error::InvalidConfig(config_error)
    }
}
