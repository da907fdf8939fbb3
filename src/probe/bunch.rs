use smallvec::SmallVec;

use crate::model::{NodeComparison, Triple};

use super::triple_set::HashedTripleSet;

/// Bunch size at which the flat array gives way to the hashed form.
pub const BUNCH_PROMOTION_THRESHOLD: usize = 9;

/// The triples sharing one index key.
///
/// Starts as a flat inline array scanned linearly; inserting the element
/// that would push it past [`BUNCH_PROMOTION_THRESHOLD`] promotes it to a
/// [`HashedTripleSet`]. The switch happens at most once, never reverts, and
/// is invisible through this type's contract. Most keys in real graphs hold
/// only a handful of triples, so the array form carries the bulk of the
/// index without hash-table overhead.
#[derive(Clone, Debug)]
pub enum TripleBunch {
    /// Flat array form, scanned linearly.
    Small(SmallVec<[Triple; BUNCH_PROMOTION_THRESHOLD]>),
    /// Hashed form, after promotion.
    Hashed(HashedTripleSet),
}

impl TripleBunch {
    /// Creates an empty bunch in array form.
    pub fn new() -> Self {
        TripleBunch::Small(SmallVec::new())
    }

    /// Number of triples in the bunch.
    pub fn len(&self) -> usize {
        match self {
            TripleBunch::Small(items) => items.len(),
            TripleBunch::Hashed(set) => set.len(),
        }
    }

    /// Returns `true` when the bunch is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` while still in array form.
    pub fn is_small(&self) -> bool {
        matches!(self, TripleBunch::Small(_))
    }

    /// Inserts a triple; returns `false` when already present.
    pub fn add(&mut self, triple: Triple, mode: NodeComparison) -> bool {
        match self {
            TripleBunch::Small(items) => {
                if items.iter().any(|t| t.equals(&triple, mode)) {
                    return false;
                }
                self.push_new(triple, mode);
                true
            }
            TripleBunch::Hashed(set) => set.add(triple),
        }
    }

    /// Inserts a triple known to be absent from this bunch.
    pub fn add_unchecked(&mut self, triple: Triple, mode: NodeComparison) {
        match self {
            TripleBunch::Small(_) => self.push_new(triple, mode),
            TripleBunch::Hashed(set) => set.add_unchecked(triple),
        }
    }

    // Appends to the array form, promoting first when full.
    fn push_new(&mut self, triple: Triple, mode: NodeComparison) {
        let TripleBunch::Small(items) = self else {
            unreachable!("push_new is only reached in array form");
        };
        if items.len() < BUNCH_PROMOTION_THRESHOLD {
            items.push(triple);
            return;
        }
        let mut set = HashedTripleSet::with_capacity_for(items.len() + 1, mode);
        for t in items.drain(..) {
            set.add_unchecked(t);
        }
        set.add_unchecked(triple);
        tracing::trace!(size = set.len(), "bunch promoted to hashed form");
        *self = TripleBunch::Hashed(set);
    }

    /// Removes a triple; returns `false` when absent. A promoted bunch
    /// never reverts to array form, however small it gets.
    pub fn remove(&mut self, triple: &Triple, mode: NodeComparison) -> bool {
        match self {
            TripleBunch::Small(items) => {
                match items.iter().position(|t| t.equals(triple, mode)) {
                    Some(at) => {
                        items.swap_remove(at);
                        true
                    }
                    None => false,
                }
            }
            TripleBunch::Hashed(set) => set.remove(triple),
        }
    }

    /// Membership test.
    pub fn contains(&self, triple: &Triple, mode: NodeComparison) -> bool {
        match self {
            TripleBunch::Small(items) => items.iter().any(|t| t.equals(triple, mode)),
            TripleBunch::Hashed(set) => set.contains(triple),
        }
    }

    /// Finds the stored triple equal to `triple` under `mode`.
    pub fn get(&self, triple: &Triple, mode: NodeComparison) -> Option<&Triple> {
        match self {
            TripleBunch::Small(items) => items.iter().find(|t| t.equals(triple, mode)),
            TripleBunch::Hashed(set) => set.get(triple),
        }
    }

    /// Resumable scan; `cursor` starts at zero and stays valid as long as
    /// the bunch is not mutated.
    pub fn scan_from(&self, cursor: &mut usize) -> Option<&Triple> {
        match self {
            TripleBunch::Small(items) => {
                let triple = items.get(*cursor)?;
                *cursor += 1;
                Some(triple)
            }
            TripleBunch::Hashed(set) => set.scan_from(cursor),
        }
    }
}

impl Default for TripleBunch {
    fn default() -> Self {
        Self::new()
    }
}
