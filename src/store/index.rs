use crate::model::{Node, NodeComparison, Triple};
use crate::probe::{NodeMap, TripleBunch};

/// The triple field an index is keyed by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TripleField {
    /// Keyed by subject.
    Subject,
    /// Keyed by predicate.
    Predicate,
    /// Keyed by object.
    Object,
}

impl TripleField {
    /// Projects the keyed field out of a triple.
    pub fn of(self, triple: &Triple) -> &Node {
        match self {
            TripleField::Subject => triple.subject(),
            TripleField::Predicate => triple.predicate(),
            TripleField::Object => triple.object(),
        }
    }
}

/// One of the three field indexes of a store: node key to triple bunch.
///
/// A bunch is created on the first insert for a key and destroyed when its
/// last triple is removed, so `key_count` always reports live keys only.
#[derive(Clone, Debug)]
pub struct TripleIndex {
    field: TripleField,
    map: NodeMap<TripleBunch>,
    size: usize,
    mode: NodeComparison,
}

impl TripleIndex {
    /// Creates an empty index keyed by `field`.
    pub fn new(field: TripleField, mode: NodeComparison) -> Self {
        Self {
            field,
            map: NodeMap::new(mode),
            size: 0,
            mode,
        }
    }

    /// The field this index is keyed by.
    pub fn field(&self) -> TripleField {
        self.field
    }

    /// Total triples indexed.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of distinct keys with a live bunch.
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    /// Inserts with a uniqueness check; returns `false` when the triple is
    /// already present under its key.
    pub fn add(&mut self, triple: &Triple) -> bool {
        let mode = self.mode;
        let key = self.field.of(triple);
        if let Some(bunch) = self.map.get_mut(key) {
            if !bunch.add(triple.clone(), mode) {
                return false;
            }
        } else {
            self.map
                .or_insert_with(key, TripleBunch::new)
                .add_unchecked(triple.clone(), mode);
        }
        self.size += 1;
        true
    }

    /// Inserts a triple the caller knows is new, skipping the check. Used
    /// by the secondary indexes once the primary reported the triple new.
    pub fn add_unchecked(&mut self, triple: &Triple) {
        let mode = self.mode;
        let key = self.field.of(triple);
        self.map
            .or_insert_with(key, TripleBunch::new)
            .add_unchecked(triple.clone(), mode);
        self.size += 1;
    }

    /// Removes a triple; returns `false` when absent.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let mode = self.mode;
        let key = self.field.of(triple);
        let Some(bunch) = self.map.get_mut(key) else {
            return false;
        };
        if !bunch.remove(triple, mode) {
            return false;
        }
        if bunch.is_empty() {
            self.map.remove(key);
        }
        self.size -= 1;
        true
    }

    /// Removes a triple the caller knows is present.
    pub fn remove_unchecked(&mut self, triple: &Triple) {
        let removed = self.remove(triple);
        debug_assert!(removed, "unchecked removal of an absent triple");
    }

    /// The bunch for a key, if any triple is indexed under it.
    pub fn bunch(&self, key: &Node) -> Option<&TripleBunch> {
        self.map.get(key)
    }

    /// Resumable scan over every indexed triple: `outer` walks the key
    /// slots, `inner` walks the current bunch.
    pub fn scan_from<'a>(&'a self, outer: &mut usize, inner: &mut usize) -> Option<&'a Triple> {
        loop {
            if *outer >= self.map.capacity() {
                return None;
            }
            match self.map.entry_at(*outer) {
                None => {
                    *outer += 1;
                    *inner = 0;
                }
                Some((_, bunch)) => match bunch.scan_from(inner) {
                    Some(triple) => return Some(triple),
                    None => {
                        *outer += 1;
                        *inner = 0;
                    }
                },
            }
        }
    }

    /// Drops every bunch.
    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }
}
