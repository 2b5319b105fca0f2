use crate::err::Error;
use crate::types::{Index, Mode};
use std::collections::BTreeMap;

/// One operation: read the three elements starting at `read_start` (wrapping around the end of
/// the array) and write their sum to `write`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Operation {
    pub read_start: Index,
    pub write: Index,
}

impl Operation {
    pub fn new(read_start: Index, write: Index) -> Self {
        Self { read_start, write }
    }

    /// `[i, (i + 1) mod len, (i + 2) mod len]`. Entries repeat when `len < 3`.
    pub fn read_indices(&self, len: usize) -> [Index; 3] {
        let i: Index = self.read_start;
        [i % len, (i + 1) % len, (i + 2) % len]
    }

    /// The lock request this operation needs: its read indices in shared mode and its write
    /// index in exclusive mode.
    pub fn lock_request(&self, len: usize) -> Result<LockRequest, Error> {
        for index in [self.read_start, self.write] {
            if index >= len {
                return Err(Error::InvalidIndex { index, len });
            }
        }
        let reads = self
            .read_indices(len)
            .into_iter()
            .map(|index| (index, Mode::Shared));
        Ok(LockRequest::new(
            reads.chain(core::iter::once((self.write, Mode::Exclusive))),
        ))
    }
}

/// A single index and the mode it should be locked in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockEntry {
    pub index: Index,
    pub mode: Mode,
}

/// The complete set of locks one operation needs.
///
/// Entries are unique per index and sorted by index ascending. Sorting gives every request the
/// same global acquisition order, which is what keeps overlapping requests from forming a
/// hold-and-wait cycle.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LockRequest {
    entries: Vec<LockEntry>,
}

impl LockRequest {
    /// Collapse `pairs` to one entry per index. If an index is requested in both modes,
    /// [Mode::Exclusive] wins.
    pub fn new<I: IntoIterator<Item = (Index, Mode)>>(pairs: I) -> Self {
        let mut collapsed: BTreeMap<Index, Mode> = BTreeMap::new();
        for (index, mode) in pairs {
            collapsed
                .entry(index)
                .and_modify(|existing| *existing = (*existing).max(mode))
                .or_insert(mode);
        }
        Self {
            entries: collapsed
                .into_iter()
                .map(|(index, mode)| LockEntry { index, mode })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[LockEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail with [Error::InvalidIndex] on the first entry outside `[0, len)`.
    pub fn validate(&self, len: usize) -> Result<(), Error> {
        match self.entries.iter().find(|entry| entry.index >= len) {
            Some(entry) => Err(Error::InvalidIndex {
                index: entry.index,
                len,
            }),
            None => Ok(()),
        }
    }
}
