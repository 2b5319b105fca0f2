use core::fmt::{Display, Formatter};

/// A position in the shared array, in `[0, N)`.
pub type Index = usize;

/// The contents of one array element.
///
/// Sums wrap on overflow, so a long run of operations never fails arithmetically.
pub type Value = u64;

/// An identifier for a worker, assigned incrementally starting from 0.
pub type WorkerId = usize;

/// The inclusive range initial element values are drawn from.
pub const INITIAL_VALUE_MIN: Value = 0;
pub const INITIAL_VALUE_MAX: Value = 1000;

/// How a single index is locked.
///
/// `Shared` is ordered before `Exclusive` so that collapsing duplicate requests for one index
/// can simply keep the maximum.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Mode {
    /// Any number of holders may read the element concurrently.
    Shared,
    /// Exactly one holder, excluding all readers and writers of the element.
    Exclusive,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}
