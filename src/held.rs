use crate::err::Error;
use crate::store::ElementStore;
use crate::sync::{RwLockReadGuard, RwLockWriteGuard};
use crate::types::{Index, Mode, Value};
use tracing::trace;

/// One acquired lock, in the mode it was requested.
pub(crate) enum HeldGuard<'a> {
    Shared(RwLockReadGuard<'a, Value>),
    Exclusive(RwLockWriteGuard<'a, Value>),
}

impl HeldGuard<'_> {
    fn mode(&self) -> Mode {
        match self {
            HeldGuard::Shared(_) => Mode::Shared,
            HeldGuard::Exclusive(_) => Mode::Exclusive,
        }
    }

    fn value(&self) -> Value {
        match self {
            HeldGuard::Shared(guard) => **guard,
            HeldGuard::Exclusive(guard) => **guard,
        }
    }
}

/// Every lock of a [LockRequest](crate::request::LockRequest), held at once.
///
/// A `HeldLockSet` only exists in the all-or-nothing state: the acquirer either returns one
/// holding every requested index in its requested mode, or returns nothing. The locks are
/// released when the set is dropped, including while unwinding from a panic, or earlier by
/// [HeldLockSet::release].
pub struct HeldLockSet<'a> {
    store: &'a ElementStore,
    /// Sorted by index ascending, one guard per index.
    guards: Vec<(Index, HeldGuard<'a>)>,
    passes: usize,
    released: bool,
}

impl<'a> HeldLockSet<'a> {
    pub(crate) fn new(
        store: &'a ElementStore,
        guards: Vec<(Index, HeldGuard<'a>)>,
        passes: usize,
    ) -> Self {
        Self {
            store,
            guards,
            passes,
            released: false,
        }
    }

    pub(crate) fn store(&self) -> &'a ElementStore {
        self.store
    }

    /// How many passes the acquisition took. 1 means no contention was met.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// The number of indices currently held.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// True once [HeldLockSet::release] has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The mode `index` is held in, if it is held at all.
    pub fn mode(&self, index: Index) -> Option<Mode> {
        self.find(index).ok().map(|position| self.guards[position].1.mode())
    }

    /// Held indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.guards.iter().map(|(index, _)| *index)
    }

    /// Release every lock. Calling it again, or dropping the set afterwards, does nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        trace!("releasing {} locks", self.guards.len());
        self.guards.clear();
    }

    pub(crate) fn value(&self, index: Index) -> Result<Value, Error> {
        let position: usize = self.find(index)?;
        Ok(self.guards[position].1.value())
    }

    pub(crate) fn replace(&mut self, index: Index, value: Value) -> Result<(), Error> {
        let position: usize = self.find(index)?;
        match &mut self.guards[position].1 {
            HeldGuard::Exclusive(guard) => {
                **guard = value;
                Ok(())
            }
            HeldGuard::Shared(_) => Err(Error::NotExclusive { index }),
        }
    }

    fn find(&self, index: Index) -> Result<usize, Error> {
        self.guards
            .binary_search_by_key(&index, |(held_index, _)| *held_index)
            .map_err(|_| Error::LockNotHeld { index })
    }
}

impl core::fmt::Debug for HeldLockSet<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeldLockSet")
            .field(
                "held",
                &self
                    .guards
                    .iter()
                    .map(|(index, guard)| (*index, guard.mode()))
                    .collect::<Vec<(Index, Mode)>>(),
            )
            .field("passes", &self.passes)
            .field("released", &self.released)
            .finish()
    }
}
