use core::time::Duration;
use displaydoc::Display;

/// A configuration value was rejected by [Config::new].
#[derive(Debug, Display, Eq, PartialEq)]
pub enum ConfigError {
    /// The array length must be positive.
    ZeroArrayLen,
    /// The worker count must be positive.
    ZeroWorkers,
    /// The per-worker iteration count must be positive.
    ZeroIterations,
    /// The configured array length is {expected} but the element store holds {actual} elements.
    StoreLenMismatch { expected: usize, actual: usize },
}

impl std::error::Error for ConfigError {}

/// The parameters of a run: array length `N`, worker count `M`, and per-worker iteration count
/// `T`, plus optional knobs the binary and tests use.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    array_len: usize,
    workers: usize,
    iterations: usize,
    seed: Option<u64>,
    acquire_timeout: Option<Duration>,
}

impl Config {
    pub fn new(array_len: usize, workers: usize, iterations: usize) -> Result<Self, ConfigError> {
        if array_len == 0 {
            return Err(ConfigError::ZeroArrayLen);
        }
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(Self {
            array_len,
            workers,
            iterations,
            seed: None,
            acquire_timeout: None,
        })
    }

    /// Seed every worker's generator deterministically from `seed` instead of from entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bound each acquisition. A worker whose acquisition times out reports the iteration as
    /// failed and moves on.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    pub fn array_len(&self) -> usize {
        self.array_len
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }
}
