//! All-or-nothing acquisition of a [LockRequest].
//!
//! Blocking acquisition of several per-element locks deadlocks as soon as two requests overlap
//! and take their common indices in different orders: one holds 5 and waits for 9 while the
//! other holds 9 and waits for 5. The acquirer never blocks on a single lock. A *pass* walks the
//! request's entries in ascending index order with non-blocking attempts. The first contended
//! entry ends the pass: everything taken so far in the pass is released, the thread yields, and a
//! new pass starts from the first entry. No lock is ever held across that pause, so no thread can
//! hold a partial set while waiting on another.

use core::time::Duration;
use std::time::Instant;

use crate::err::Error;
use crate::held::{HeldGuard, HeldLockSet};
use crate::request::LockRequest;
use crate::store::ElementStore;
use crate::sync::{thread, try_guard, RwLock};
use crate::types::{Index, Mode, Value};
use tracing::{instrument, trace};

/// The outcome of one pass over a request.
enum Pass<'a> {
    /// Every entry was taken.
    Acquired(HeldLockSet<'a>),
    /// The entry at `index` was contended. Nothing from the pass is held any more.
    Contended { index: Index },
}

/// Acquire every entry of `request`, retrying passes until one succeeds.
///
/// The only error is [Error::InvalidIndex], checked before any lock is attempted. Contention is
/// never an error; under pathological contention this call is slow, never failing.
#[instrument(level = "trace", skip(store))]
pub fn acquire<'a>(store: &'a ElementStore, request: &LockRequest) -> Result<HeldLockSet<'a>, Error> {
    acquire_until(store, request, None)
}

/// Like [acquire], but give up with [Error::AcquisitionTimeout] once `timeout` has elapsed.
///
/// The deadline is only checked between passes, after the failed pass has rolled back, so a
/// timeout never leaves any lock of the request held.
#[instrument(level = "trace", skip(store))]
pub fn acquire_within<'a>(
    store: &'a ElementStore,
    request: &LockRequest,
    timeout: Duration,
) -> Result<HeldLockSet<'a>, Error> {
    acquire_until(store, request, Some(timeout))
}

fn acquire_until<'a>(
    store: &'a ElementStore,
    request: &LockRequest,
    timeout: Option<Duration>,
) -> Result<HeldLockSet<'a>, Error> {
    request.validate(store.len())?;

    let started: Instant = Instant::now();
    let mut passes: usize = 0;
    loop {
        passes += 1;
        match attempt_pass(store, request, passes)? {
            Pass::Acquired(held) => {
                trace!("acquired {} locks after {passes} passes", held.len());
                return Ok(held);
            }
            Pass::Contended { index } => {
                trace!("pass {passes}: index {index} was contended, rolled back");
                if let Some(timeout) = timeout {
                    let elapsed: Duration = started.elapsed();
                    if elapsed >= timeout {
                        return Err(Error::AcquisitionTimeout {
                            passes,
                            elapsed_ms: elapsed.as_millis(),
                        });
                    }
                }
                thread::yield_now();
            }
        }
    }
}

/// Try every entry of `request` once, in ascending index order.
///
/// On contention the guards taken so far are dropped before returning, which is the rollback.
fn attempt_pass<'a>(
    store: &'a ElementStore,
    request: &LockRequest,
    pass: usize,
) -> Result<Pass<'a>, Error> {
    let mut guards: Vec<(Index, HeldGuard<'a>)> = Vec::with_capacity(request.len());
    for entry in request.entries() {
        let lock: &'a RwLock<Value> = store.lock_for(entry.index)?;
        let guard: Option<HeldGuard<'a>> = match entry.mode {
            Mode::Shared => try_guard(lock.try_read()).map(HeldGuard::Shared),
            Mode::Exclusive => try_guard(lock.try_write()).map(HeldGuard::Exclusive),
        };
        match guard {
            Some(guard) => guards.push((entry.index, guard)),
            None => {
                drop(guards);
                return Ok(Pass::Contended { index: entry.index });
            }
        }
    }
    Ok(Pass::Acquired(HeldLockSet::new(store, guards, pass)))
}
