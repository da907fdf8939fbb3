//! Graph facade over a triple store.
//!
//! [`Graph`] is the contract consumed by everything above the store
//! (query engines, serializers, the transactional wrapper); [`MemGraph`]
//! implements it over any [`TripleStore`] variant. A bare `MemGraph` is
//! not safe for concurrent mutation; wrap it in
//! [`TxnGraph`](crate::txn::TxnGraph) for that.

mod iter;

pub use iter::{FindCursor, FindIter};

use crate::model::{Node, NodeComparison, Triple, TriplePattern};
use crate::store::{AdaptiveTable, BitmapTable, TripleStore, TripleTable};

/// Configuration consumed at graph construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphOptions {
    /// Node comparison mode applied throughout all indexes.
    pub comparison: NodeComparison,
}

impl GraphOptions {
    /// Creates options with the default (term) comparison mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node comparison mode.
    pub fn comparison(mut self, mode: NodeComparison) -> Self {
        self.comparison = mode;
        self
    }
}

/// The graph contract: add, delete, pattern containment, lazy pattern
/// iteration and size.
pub trait Graph {
    /// Inserts a triple; returns `false` when already present.
    fn add(&mut self, triple: Triple) -> bool;

    /// Deletes a triple; returns `false` when absent.
    fn delete(&mut self, triple: &Triple) -> bool;

    /// Tests whether any triple matches the pattern; wildcards allowed in
    /// any position.
    fn contains(&self, pattern: &TriplePattern) -> bool;

    /// Lazy iteration over every triple matching the pattern. A fully
    /// wildcard pattern yields the whole graph.
    fn find<'a>(&'a self, pattern: TriplePattern) -> Box<dyn Iterator<Item = Triple> + 'a>;

    /// Lazy iteration expressed over optional terms; equivalent to
    /// [`find`](Self::find) and composable with standard iterator
    /// adapters.
    fn stream<'a>(
        &'a self,
        subject: Option<Node>,
        predicate: Option<Node>,
        object: Option<Node>,
    ) -> Box<dyn Iterator<Item = Triple> + 'a> {
        self.find(TriplePattern::new(subject, predicate, object))
    }

    /// Number of triples.
    fn len(&self) -> usize;

    /// Returns `true` when the graph holds no triples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every triple.
    fn clear(&mut self);
}

/// In-memory graph over a pluggable store representation.
#[derive(Clone, Debug)]
pub struct MemGraph<S: TripleStore = TripleTable> {
    store: S,
}

impl MemGraph<TripleTable> {
    /// Creates a graph over the baseline three-way indexed store.
    pub fn new(options: GraphOptions) -> Self {
        Self {
            store: TripleTable::new(options.comparison),
        }
    }
}

impl MemGraph<BitmapTable> {
    /// Creates a graph over the bitmap-indexed store variant.
    pub fn bitmap_indexed(options: GraphOptions) -> Self {
        Self {
            store: BitmapTable::new(options.comparison),
        }
    }
}

impl MemGraph<AdaptiveTable> {
    /// Creates a graph over the adaptive-threshold store variant.
    pub fn adaptive_indexed(options: GraphOptions) -> Self {
        Self {
            store: AdaptiveTable::new(options.comparison),
        }
    }
}

impl<S: TripleStore> MemGraph<S> {
    /// Wraps an existing store.
    pub fn from_store(store: S) -> Self {
        Self { store }
    }

    /// The node comparison mode fixed at construction.
    pub fn comparison(&self) -> NodeComparison {
        self.store.comparison()
    }

    /// Lazy pattern iteration with the concrete iterator type.
    pub fn iter(&self, pattern: TriplePattern) -> FindIter<'_, S> {
        FindIter::new(&self.store, pattern)
    }

    /// Low-level resumable scan; the building block under [`find`] and
    /// the transactional iterators.
    ///
    /// [`find`]: Graph::find
    pub fn scan_next(
        &self,
        pattern: &TriplePattern,
        pos: &mut crate::store::ScanPos,
    ) -> Option<Triple> {
        self.store.scan_next(pattern, pos)
    }

    /// Pattern cursor supporting removal of the just-yielded triple.
    pub fn find_mut(&mut self, pattern: TriplePattern) -> FindCursor<'_, S> {
        FindCursor::new(&mut self.store, pattern)
    }
}

impl<S: TripleStore> Graph for MemGraph<S> {
    fn add(&mut self, triple: Triple) -> bool {
        self.store.add(triple)
    }

    fn delete(&mut self, triple: &Triple) -> bool {
        self.store.remove(triple)
    }

    fn contains(&self, pattern: &TriplePattern) -> bool {
        self.store.contains(pattern)
    }

    fn find<'a>(&'a self, pattern: TriplePattern) -> Box<dyn Iterator<Item = Triple> + 'a> {
        Box::new(self.iter(pattern))
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn clear(&mut self) {
        tracing::debug!(size = self.store.len(), "clearing graph");
        self.store.clear();
    }
}
