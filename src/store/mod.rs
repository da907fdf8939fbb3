//! Triple storage: the three-way indexed baseline table and its
//! slot-indexed drop-in variants.
//!
//! Every variant implements [`TripleStore`]; callers never observe which
//! representation sits underneath. Lazy iteration runs through the
//! resumable [`scan_next`](TripleStore::scan_next) contract: the caller
//! owns a [`ScanPos`] cursor and the store re-derives its position on each
//! call, so no borrow is held between elements.

mod adaptive;
mod bitmap;
mod index;
mod slots;
mod table;

pub use adaptive::{AdaptiveTable, SlotSet};
pub use bitmap::{BitmapTable, SlotBits};
pub use index::{TripleField, TripleIndex};
pub use slots::{SlotArena, SlotIndexSet, SlotIndexedTable};
pub use table::TripleTable;

use crate::model::{NodeComparison, Triple, TriplePattern};

/// Resumable scan cursor.
///
/// Opaque to callers; each store variant interprets the fields its own
/// way. Valid as long as the store is not mutated, which the iterator
/// wrappers guarantee by construction.
#[derive(Clone, Debug, Default)]
pub struct ScanPos {
    pub(crate) lane: Option<TripleField>,
    pub(crate) outer: usize,
    pub(crate) inner: usize,
    pub(crate) done: bool,
}

/// Contract shared by every triple store representation.
pub trait TripleStore: Send + Sync {
    /// The node comparison mode fixed at construction.
    fn comparison(&self) -> NodeComparison;

    /// Inserts a triple; returns `false` when already present.
    fn add(&mut self, triple: Triple) -> bool;

    /// Removes a triple; returns `false` when absent.
    fn remove(&mut self, triple: &Triple) -> bool;

    /// Tests whether any triple matches the pattern.
    fn contains(&self, pattern: &TriplePattern) -> bool;

    /// Produces the next match for `pattern` after the cursor, advancing
    /// it. Returns `None` when the scan is exhausted.
    fn scan_next(&self, pattern: &TriplePattern, pos: &mut ScanPos) -> Option<Triple>;

    /// Number of stored triples.
    fn len(&self) -> usize;

    /// Returns `true` when the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every triple.
    fn clear(&mut self);
}
