use crate::err::Error;
use crate::held::HeldLockSet;
use crate::random::{RngSource, UniformSource};
use crate::sync::{ignore_poison, RwLock};
use crate::types::{Index, Value, INITIAL_VALUE_MAX, INITIAL_VALUE_MIN};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

/// Owns the shared array. Every element lives inside its own reader-writer lock, so a value can
/// only be reached through a guard obtained by the [acquirer](crate::acquire).
///
/// The store itself never locks or unlocks on a caller's behalf. [ElementStore::read] and
/// [ElementStore::write] take the [HeldLockSet] as proof that the caller holds the right lock.
pub struct ElementStore {
    elements: Vec<RwLock<Value>>,
}

impl core::fmt::Debug for ElementStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementStore")
            .field("len", &self.elements.len())
            .finish_non_exhaustive()
    }
}

impl ElementStore {
    /// Allocate `len` elements, each with an independent lock and a value drawn uniformly from
    /// `[0, 1000]`.
    #[instrument(skip(source))]
    pub fn initialize<U: UniformSource>(len: usize, source: &mut U) -> Self {
        let elements: Vec<RwLock<Value>> = (0..len)
            .map(|_| RwLock::new(source.uniform(INITIAL_VALUE_MIN, INITIAL_VALUE_MAX)))
            .collect();
        debug!("initialized {len} elements");
        Self { elements }
    }

    /// [ElementStore::initialize] with an entropy-seeded generator.
    pub fn with_random_values(len: usize) -> Self {
        Self::initialize(len, &mut RngSource(StdRng::from_entropy()))
    }

    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Self {
            elements: values.into_iter().map(RwLock::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The lock guarding `index`.
    pub fn lock_for(&self, index: Index) -> Result<&RwLock<Value>, Error> {
        self.elements.get(index).ok_or(Error::InvalidIndex {
            index,
            len: self.elements.len(),
        })
    }

    /// Read `index` through `held`, which must hold it in either mode.
    pub fn read(&self, held: &HeldLockSet<'_>, index: Index) -> Result<Value, Error> {
        self.check_ownership(held, index)?;
        held.value(index)
    }

    /// Replace the value at `index` through `held`, which must hold it exclusively.
    pub fn write(&self, held: &mut HeldLockSet<'_>, index: Index, value: Value) -> Result<(), Error> {
        self.check_ownership(held, index)?;
        held.replace(index, value)
    }

    /// Copy out every value, taking one shared lock at a time.
    ///
    /// Only consistent as a whole when no worker is running.
    pub fn snapshot(&self) -> Vec<Value> {
        self.elements
            .iter()
            .map(|element| *ignore_poison(element.read()))
            .collect()
    }

    /// Consume the store and its locks, keeping values whose lock was poisoned.
    pub fn into_values(self) -> Vec<Value> {
        self.elements
            .into_iter()
            .map(|element| ignore_poison(element.into_inner()))
            .collect()
    }

    fn check_ownership(&self, held: &HeldLockSet<'_>, index: Index) -> Result<(), Error> {
        if index >= self.elements.len() {
            return Err(Error::InvalidIndex {
                index,
                len: self.elements.len(),
            });
        }
        if !core::ptr::eq(held.store(), self) {
            return Err(Error::ForeignLockSet);
        }
        Ok(())
    }
}
