use crate::model::{Node, NodeComparison, Triple, TriplePattern};
use crate::probe::NodeMap;

use super::index::TripleField;
use super::{ScanPos, TripleStore};

/// Flat triple storage with stable `u32` slot handles and a free list.
#[derive(Clone, Debug, Default)]
pub struct SlotArena {
    slots: Vec<Option<Triple>>,
    free: Vec<u32>,
    len: usize,
}

impl SlotArena {
    /// Number of live triples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the arena holds no triples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Upper bound (exclusive) on slot handles ever returned.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores a triple, reusing a freed slot when one exists.
    pub fn alloc(&mut self, triple: Triple) -> u32 {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(triple);
                slot
            }
            None => {
                self.slots.push(Some(triple));
                (self.slots.len() - 1) as u32
            }
        }
    }

    /// Releases a slot, returning its triple.
    pub fn release(&mut self, slot: u32) -> Option<Triple> {
        let triple = self.slots.get_mut(slot as usize)?.take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(triple)
    }

    /// Returns the triple stored at a slot.
    pub fn get(&self, slot: u32) -> Option<&Triple> {
        self.slots.get(slot as usize).and_then(Option::as_ref)
    }

    /// Resumable scan over live slots in slot order.
    pub fn scan_from(&self, cursor: &mut usize) -> Option<(u32, &Triple)> {
        while *cursor < self.slots.len() {
            let slot = *cursor;
            *cursor += 1;
            if let Some(triple) = &self.slots[slot] {
                return Some((slot as u32, triple));
            }
        }
        None
    }

    /// Drops every triple and forgets the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

/// Compressed set of arena slot indices; the per-node payload of the
/// slot-indexed store variants.
pub trait SlotIndexSet: Clone + std::fmt::Debug + Default + Send + Sync {
    /// Inserts a slot; returns `false` when already present.
    fn insert(&mut self, slot: u32) -> bool;
    /// Removes a slot; returns `false` when absent.
    fn remove(&mut self, slot: u32) -> bool;
    /// Membership test.
    fn contains(&self, slot: u32) -> bool;
    /// Number of slots in the set.
    fn len(&self) -> usize;
    /// Returns `true` when the set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Smallest member greater than or equal to `from`.
    fn next_at_or_after(&self, from: u32) -> Option<u32>;
}

/// Slot-indexed store: a flat triple arena plus, per field, a node-keyed
/// map of slot-index sets.
///
/// Multi-bound patterns walk the most selective bound field's set and test
/// the candidate slot against the other bound sets before materializing
/// the triple. Instantiated as [`super::BitmapTable`] (dense bitsets, for
/// dense slot populations) and [`super::AdaptiveTable`] (sorted arrays
/// promoting to bitsets, for sparse ones); both are behaviorally
/// interchangeable with the baseline [`super::TripleTable`].
#[derive(Clone, Debug)]
pub struct SlotIndexedTable<S: SlotIndexSet> {
    arena: SlotArena,
    subjects: NodeMap<S>,
    predicates: NodeMap<S>,
    objects: NodeMap<S>,
    mode: NodeComparison,
}

const FIELDS: [TripleField; 3] = [
    TripleField::Subject,
    TripleField::Predicate,
    TripleField::Object,
];

impl<S: SlotIndexSet> SlotIndexedTable<S> {
    /// Creates an empty store comparing nodes under `mode`.
    pub fn new(mode: NodeComparison) -> Self {
        Self {
            arena: SlotArena::default(),
            subjects: NodeMap::new(mode),
            predicates: NodeMap::new(mode),
            objects: NodeMap::new(mode),
            mode,
        }
    }

    fn field_map(&self, field: TripleField) -> &NodeMap<S> {
        match field {
            TripleField::Subject => &self.subjects,
            TripleField::Predicate => &self.predicates,
            TripleField::Object => &self.objects,
        }
    }

    fn field_map_mut(&mut self, field: TripleField) -> &mut NodeMap<S> {
        match field {
            TripleField::Subject => &mut self.subjects,
            TripleField::Predicate => &mut self.predicates,
            TripleField::Object => &mut self.objects,
        }
    }

    fn set_for(&self, field: TripleField, key: &Node) -> Option<&S> {
        self.field_map(field).get(key)
    }

    // Locates the arena slot holding a triple equal to `triple` under the
    // store's mode, by walking its smallest field set.
    fn slot_of(&self, triple: &Triple) -> Option<u32> {
        let mut lane = TripleField::Subject;
        let mut best = usize::MAX;
        for field in FIELDS {
            let set = self.set_for(field, field.of(triple))?;
            if set.len() < best {
                best = set.len();
                lane = field;
            }
        }
        let set = self.set_for(lane, lane.of(triple))?;
        let mut from = 0;
        while let Some(slot) = set.next_at_or_after(from) {
            if self
                .arena
                .get(slot)
                .is_some_and(|stored| stored.equals(triple, self.mode))
            {
                return Some(slot);
            }
            from = slot + 1;
        }
        None
    }

    // Bound fields of a pattern, in field order.
    fn bound_fields(pattern: &TriplePattern) -> impl Iterator<Item = (TripleField, &Node)> {
        [
            pattern.subject.as_ref().map(|n| (TripleField::Subject, n)),
            pattern
                .predicate
                .as_ref()
                .map(|n| (TripleField::Predicate, n)),
            pattern.object.as_ref().map(|n| (TripleField::Object, n)),
        ]
        .into_iter()
        .flatten()
    }
}

impl<S: SlotIndexSet> TripleStore for SlotIndexedTable<S> {
    fn comparison(&self) -> NodeComparison {
        self.mode
    }

    fn add(&mut self, triple: Triple) -> bool {
        if self.slot_of(&triple).is_some() {
            return false;
        }
        let slot = self.arena.alloc(triple.clone());
        for field in FIELDS {
            let key = field.of(&triple);
            let map = self.field_map_mut(field);
            map.or_insert_with(key, S::default).insert(slot);
        }
        true
    }

    fn remove(&mut self, triple: &Triple) -> bool {
        let Some(slot) = self.slot_of(triple) else {
            return false;
        };
        for field in FIELDS {
            let key = field.of(triple);
            let map = self.field_map_mut(field);
            if let Some(set) = map.get_mut(key) {
                set.remove(slot);
                // Mirror the bunch lifecycle: an emptied set releases its
                // key.
                if set.is_empty() {
                    map.remove(key);
                }
            }
        }
        self.arena.release(slot);
        true
    }

    fn contains(&self, pattern: &TriplePattern) -> bool {
        if let Some(triple) = pattern.as_triple() {
            return self.slot_of(&triple).is_some();
        }
        self.scan_next(pattern, &mut ScanPos::default()).is_some()
    }

    fn scan_next(&self, pattern: &TriplePattern, pos: &mut ScanPos) -> Option<Triple> {
        if pattern.bound_count() == 0 {
            return self
                .arena
                .scan_from(&mut pos.outer)
                .map(|(_, triple)| triple.clone());
        }
        // Pin the most selective bound field on the first call so the scan
        // stays on one set for its whole lifetime.
        let lane = match pos.lane {
            Some(lane) => lane,
            None => {
                let mut lane = TripleField::Subject;
                let mut best = usize::MAX;
                for (field, node) in Self::bound_fields(pattern) {
                    let len = self.set_for(field, node)?.len();
                    if len < best {
                        best = len;
                        lane = field;
                    }
                }
                pos.lane = Some(lane);
                lane
            }
        };
        let key = match lane {
            TripleField::Subject => pattern.subject.as_ref(),
            TripleField::Predicate => pattern.predicate.as_ref(),
            TripleField::Object => pattern.object.as_ref(),
        }?;
        let primary = self.set_for(lane, key)?;
        let mut from = pos.inner as u32;
        'candidates: while let Some(slot) = primary.next_at_or_after(from) {
            from = slot + 1;
            pos.inner = from as usize;
            for (field, node) in Self::bound_fields(pattern) {
                if field == lane {
                    continue;
                }
                match self.set_for(field, node) {
                    Some(set) if set.contains(slot) => {}
                    _ => continue 'candidates,
                }
            }
            let triple = self
                .arena
                .get(slot)
                .expect("indexed slot holds a live triple");
            return Some(triple.clone());
        }
        None
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.subjects.clear();
        self.predicates.clear();
        self.objects.clear();
    }
}
