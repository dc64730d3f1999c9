//! Shared table of the last cell reported by each explorer.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::maze::Position;

/// Last known position of every explorer, keyed by explorer name.
///
/// The coordinator is the only writer; viewers take [`snapshot`](PositionTable::snapshot)s. Each
/// entry is replaced as a whole under the write lock, so a reader never sees a row from one update
/// paired with a column from another. Cloning the table clones the handle, not the entries.
#[derive(Clone, Debug, Default)]
pub struct PositionTable {
    /// Entries behind a reader-writer lock.
    entries: Arc<RwLock<BTreeMap<String, Position>>>,
}

impl PositionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `position` for `explorer`, replacing any previous entry.
    ///
    /// This function is only reachable from inside the crate. Outside consumers observe the table
    /// through a read-only [`View`](crate::coordinator::View).
    pub(crate) fn record(&self, explorer: &str, position: Position) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(explorer) {
            *entry = position;
        } else {
            let _previous = entries.insert(explorer.to_owned(), position);
        }
    }

    /// Returns the last recorded position of `explorer`.
    #[must_use]
    pub fn get(&self, explorer: &str) -> Option<Position> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(explorer)
            .copied()
    }

    /// Returns a consistent copy of every entry, ordered by explorer name.
    ///
    /// The copy is taken while holding the read lock, so it reflects the table at one instant.
    /// Later updates do not affect the returned map.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Position> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of explorers seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no explorer has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
