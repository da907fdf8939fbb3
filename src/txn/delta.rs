use crate::graph::{Graph, MemGraph};
use crate::model::Triple;
use crate::store::TripleStore;
use crate::types::{Result, TrellisError};

/// One recorded mutation of a write transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeltaOp {
    /// The triple was inserted and was not previously present.
    Add(Triple),
    /// The triple was removed and was previously present.
    Remove(Triple),
}

/// Ordered log of the mutations one write transaction performed.
///
/// Only operations that changed state are recorded, so replaying a delta
/// onto a copy that was identical at transaction start must reproduce the
/// exact same effects; any divergence means the copies have desynchronized.
#[derive(Clone, Debug, Default)]
pub struct Delta {
    ops: Vec<DeltaOp>,
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Records an effective insertion.
    pub fn record_add(&mut self, triple: Triple) {
        self.ops.push(DeltaOp::Add(triple));
    }

    /// Records an effective removal.
    pub fn record_remove(&mut self, triple: Triple) {
        self.ops.push(DeltaOp::Remove(triple));
    }

    /// Iterates the recorded operations in commit order.
    pub fn iter(&self) -> impl Iterator<Item = &DeltaOp> {
        self.ops.iter()
    }

    /// Replays the delta, in order, onto a graph copy.
    ///
    /// Every replayed operation must change state exactly as the original
    /// did; a mismatch is reported as corruption and the copy must be
    /// considered desynchronized.
    pub fn apply<S: TripleStore>(&self, graph: &mut MemGraph<S>) -> Result<()> {
        for op in &self.ops {
            let effective = match op {
                DeltaOp::Add(triple) => graph.add(triple.clone()),
                DeltaOp::Remove(triple) => graph.delete(triple),
            };
            if !effective {
                return Err(TrellisError::Corruption(
                    "delta replay diverged from its recording",
                ));
            }
        }
        Ok(())
    }

    /// Undoes the delta on the copy it was recorded against, newest
    /// operation first.
    pub fn revert<S: TripleStore>(&self, graph: &mut MemGraph<S>) {
        for op in self.ops.iter().rev() {
            let effective = match op {
                DeltaOp::Add(triple) => graph.delete(triple),
                DeltaOp::Remove(triple) => graph.add(triple.clone()),
            };
            debug_assert!(effective, "revert diverged from its recording");
        }
    }
}
