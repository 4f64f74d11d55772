#![forbid(unsafe_code)]

//! Bounded linear history of snapshots with a movable cursor.
//!
//! # Layout
//!
//! ```text
//!  evicted ◀── [ s0 | s1 | s2 | s3 | s4 ] ◀── push
//!                          ▲
//!                        index
//! ```
//!
//! Entries before `index` are reachable by undo, entries after it by redo.
//! Pushing while the cursor is not at the end drops the redo branch first.
//!
//! # Invariants
//!
//! 1. `len() <= limit()` and `limit() >= 1`.
//! 2. `index()` is `None` iff the stack is empty; otherwise it is in
//!    `0..len()`.
//! 3. After `push`, `index()` points at the pushed entry and nothing follows
//!    it.
//! 4. Entries are never modified in place except through
//!    [`replace_current`](HistoryStack::replace_current) and
//!    [`amend`](HistoryStack::amend), which swap whole snapshots.

use std::collections::VecDeque;

use super::snapshot::Snapshot;

/// Default number of entries retained.
pub const DEFAULT_LIMIT: usize = 20;

/// Which way a history walk goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Toward older entries.
    Undo,
    /// Toward newer entries.
    Redo,
}

/// Configuration for [`HistoryStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of snapshots retained. Values below 1 are clamped.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

impl HistoryConfig {
    /// Create a config with the given limit.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

/// Ordered, bounded snapshot history.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    snapshots: VecDeque<Snapshot>,
    index: Option<usize>,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        let limit = config.limit.max(1);
        Self {
            snapshots: VecDeque::with_capacity(limit.min(64)),
            index: None,
            limit,
        }
    }

    /// Create an empty stack with the given limit.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self::new(HistoryConfig::new(limit))
    }

    /// Append a snapshot after the cursor.
    ///
    /// Drops everything after the cursor, evicts the oldest entry when full,
    /// and leaves the cursor on the new entry.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.truncate_future();
        if self.snapshots.len() >= self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
        self.index = Some(self.snapshots.len() - 1);
    }

    /// Drop every entry after the cursor.
    pub fn truncate_future(&mut self) {
        if let Some(i) = self.index {
            self.snapshots.truncate(i + 1);
        }
    }

    /// Swap the entry under the cursor. Returns `false` on an empty stack.
    pub fn replace_current(&mut self, snapshot: Snapshot) -> bool {
        match self.index.and_then(|i| self.snapshots.get_mut(i)) {
            Some(slot) => {
                *slot = snapshot;
                true
            }
            None => false,
        }
    }

    /// Collapse the run of entries ending at `from` whose content equals
    /// `current` into the single entry `snapshot`, and move the cursor onto
    /// it. Entries after `from` are kept.
    ///
    /// Returns the position of the amended entry, or `None` when `from` is
    /// out of range.
    pub fn amend(&mut self, snapshot: Snapshot, from: usize, current: &Snapshot) -> Option<usize> {
        if from >= self.snapshots.len() {
            return None;
        }
        let mut start = from;
        while start > 0 && self.snapshots[start - 1].equals_content(current) {
            start -= 1;
        }
        self.snapshots.drain(start..=from);
        self.snapshots.insert(start, snapshot);
        self.index = Some(start);
        Some(start)
    }

    /// Nearest entry from the cursor in `direction` whose content differs
    /// from `current`, with its position.
    #[must_use]
    pub fn nearest_distinct(
        &self,
        direction: Direction,
        current: &Snapshot,
    ) -> Option<(usize, &Snapshot)> {
        let i = self.index?;
        match direction {
            Direction::Undo => (0..i)
                .rev()
                .map(|j| (j, &self.snapshots[j]))
                .find(|(_, s)| !s.equals_content(current)),
            Direction::Redo => (i + 1..self.snapshots.len())
                .map(|j| (j, &self.snapshots[j]))
                .find(|(_, s)| !s.equals_content(current)),
        }
    }

    /// Entry at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Snapshot> {
        self.snapshots.get(position)
    }

    /// Entry under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Snapshot> {
        self.index.and_then(|i| self.snapshots.get(i))
    }

    /// Cursor position, `None` when empty.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Move the cursor. Out-of-range positions are ignored.
    pub(crate) fn set_index(&mut self, position: usize) {
        if position < self.snapshots.len() {
            self.index = Some(position);
        }
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the stack holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Snapshot> + '_ {
        self.snapshots.iter()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = None;
    }
}
