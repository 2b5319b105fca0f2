//! A module which decides which synchronization primitives to use throughout the rest of the crate
//! depending on features and configuration options

use std::sync::{LockResult, TryLockError, TryLockResult};

cfg_if::cfg_if! {
    if #[cfg(loom)] {
        pub use loom::sync::Arc;
        pub(crate) use loom::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
        pub(crate) use loom::thread;
    } else if #[cfg(feature = "shuttle")] {
        pub use shuttle::sync::Arc;
        pub(crate) use shuttle::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
        pub(crate) use shuttle::thread;
    } else {
        pub use std::sync::Arc;
        pub(crate) use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
        pub(crate) use std::thread;
    }
}

/// Take the guard out of a lock result even if a previous holder panicked.
///
/// Elements are plain `u64`s replaced by a single store, so a panicking holder can never leave
/// one half-written.
pub(crate) fn ignore_poison<G>(result: LockResult<G>) -> G {
    match result {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Convert a non-blocking lock attempt into `Some(guard)` or `None` if the lock is contended.
/// Poisoned locks count as acquired, for the same reason as [ignore_poison].
pub(crate) fn try_guard<G>(result: TryLockResult<G>) -> Option<G> {
    match result {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}
