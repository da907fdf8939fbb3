use crate::model::{NodeComparison, Triple, TriplePattern};

use super::index::{TripleField, TripleIndex};
use super::{ScanPos, TripleStore};

/// Baseline three-way indexed store: one [`TripleIndex`] per field.
///
/// A triple is present iff it is present in all three indexes; the checked
/// insert into the subject index gates unchecked inserts into the other
/// two, so the uniqueness probe runs once per operation and the indexes
/// can never diverge.
#[derive(Clone, Debug)]
pub struct TripleTable {
    subjects: TripleIndex,
    predicates: TripleIndex,
    objects: TripleIndex,
    mode: NodeComparison,
}

impl TripleTable {
    /// Creates an empty table comparing nodes under `mode`.
    pub fn new(mode: NodeComparison) -> Self {
        Self {
            subjects: TripleIndex::new(TripleField::Subject, mode),
            predicates: TripleIndex::new(TripleField::Predicate, mode),
            objects: TripleIndex::new(TripleField::Object, mode),
            mode,
        }
    }

    fn index(&self, field: TripleField) -> &TripleIndex {
        match field {
            TripleField::Subject => &self.subjects,
            TripleField::Predicate => &self.predicates,
            TripleField::Object => &self.objects,
        }
    }

    // The index with the fewest distinct keys is the cheapest to walk in
    // full. Key counts move with every mutation, so this is recomputed per
    // use rather than cached.
    fn fewest_keys_field(&self) -> TripleField {
        let mut field = TripleField::Subject;
        let mut best = self.subjects.key_count();
        if self.predicates.key_count() < best {
            field = TripleField::Predicate;
            best = self.predicates.key_count();
        }
        if self.objects.key_count() < best {
            field = TripleField::Object;
        }
        field
    }

    #[cfg(test)]
    pub(crate) fn indexes_agree(&self) -> bool {
        self.subjects.size() == self.predicates.size()
            && self.subjects.size() == self.objects.size()
    }
}

impl TripleStore for TripleTable {
    fn comparison(&self) -> NodeComparison {
        self.mode
    }

    fn add(&mut self, triple: Triple) -> bool {
        if !self.subjects.add(&triple) {
            return false;
        }
        self.predicates.add_unchecked(&triple);
        self.objects.add_unchecked(&triple);
        true
    }

    fn remove(&mut self, triple: &Triple) -> bool {
        if !self.subjects.remove(triple) {
            return false;
        }
        self.predicates.remove_unchecked(triple);
        self.objects.remove_unchecked(triple);
        true
    }

    fn contains(&self, pattern: &TriplePattern) -> bool {
        if let Some(triple) = pattern.as_triple() {
            return self
                .subjects
                .bunch(triple.subject())
                .is_some_and(|bunch| bunch.contains(&triple, self.mode));
        }
        self.scan_next(pattern, &mut ScanPos::default()).is_some()
    }

    fn scan_next(&self, pattern: &TriplePattern, pos: &mut ScanPos) -> Option<Triple> {
        if pos.done {
            return None;
        }
        match (&pattern.subject, &pattern.predicate, &pattern.object) {
            // Fully bound: a single containment probe against the subject
            // bunch, yielding the stored triple (which may spell numeric
            // literals differently in value mode).
            (Some(subject), Some(_), Some(_)) => {
                pos.done = true;
                let probe = pattern.as_triple()?;
                self.subjects
                    .bunch(subject)?
                    .get(&probe, self.mode)
                    .cloned()
            }
            // Subject bound: walk its bunch, filtering whatever else is
            // bound.
            (Some(subject), _, _) => {
                let bunch = self.subjects.bunch(subject)?;
                while let Some(triple) = bunch.scan_from(&mut pos.inner) {
                    if pattern.matches(triple, self.mode) {
                        return Some(triple.clone());
                    }
                }
                None
            }
            // Object bound (predicate possibly too): objects are assumed
            // more selective than predicates, so the object bunch is
            // walked and the predicate filtered residually.
            (None, _, Some(object)) => {
                let bunch = self.objects.bunch(object)?;
                while let Some(triple) = bunch.scan_from(&mut pos.inner) {
                    if pattern.matches(triple, self.mode) {
                        return Some(triple.clone());
                    }
                }
                None
            }
            // Predicate only.
            (None, Some(predicate), None) => {
                let bunch = self.predicates.bunch(predicate)?;
                bunch.scan_from(&mut pos.inner).cloned()
            }
            // Fully unbound: walk the index with the fewest distinct keys,
            // pinned in the cursor so the choice stays stable for the
            // whole scan.
            (None, None, None) => {
                let lane = *pos.lane.get_or_insert_with(|| self.fewest_keys_field());
                self.index(lane)
                    .scan_from(&mut pos.outer, &mut pos.inner)
                    .cloned()
            }
        }
    }

    fn len(&self) -> usize {
        self.index(self.fewest_keys_field()).size()
    }

    fn clear(&mut self) {
        self.subjects.clear();
        self.predicates.clear();
        self.objects.clear();
    }
}
