use crate::model::{Node, NodeComparison};

use super::table::{CapacityPolicy, ProbeTable};

const INITIAL_KEYS: usize = 4;

/// Node-keyed open-addressing map used by every index.
///
/// Hashing and equality go through the store's [`NodeComparison`] mode, so
/// in value mode the keys `"2"` and `"02"` resolve to the same entry. Uses
/// the prime capacity policy.
#[derive(Clone, Debug)]
pub struct NodeMap<V> {
    table: ProbeTable<(Node, V)>,
    mode: NodeComparison,
}

impl<V> NodeMap<V> {
    /// Creates an empty map comparing keys under `mode`.
    pub fn new(mode: NodeComparison) -> Self {
        Self {
            table: ProbeTable::with_capacity_for(CapacityPolicy::Prime, INITIAL_KEYS),
            mode,
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` when the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Raw slot count, the bound for [`entry_at`](Self::entry_at) cursors.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Looks up the value for a key.
    pub fn get(&self, key: &Node) -> Option<&V> {
        let hash = key.hash_code(self.mode);
        let slot = self.table.find_slot(hash, |(k, _)| k.equals(key, self.mode));
        if slot < 0 {
            self.table.entry_at(!slot as usize).map(|(_, v)| v)
        } else {
            None
        }
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, key: &Node) -> Option<&mut V> {
        let hash = key.hash_code(self.mode);
        let slot = self.table.find_slot(hash, |(k, _)| k.equals(key, self.mode));
        if slot < 0 {
            self.table.entry_at_mut(!slot as usize).map(|(_, v)| v)
        } else {
            None
        }
    }

    /// Returns the value for `key`, inserting `default()` first when the
    /// key is absent.
    pub fn or_insert_with(&mut self, key: &Node, default: impl FnOnce() -> V) -> &mut V {
        let hash = key.hash_code(self.mode);
        let found = self.table.find_slot(hash, |(k, _)| k.equals(key, self.mode));
        let slot = if found < 0 {
            !found as usize
        } else {
            self.table
                .occupy(found as usize, hash, (key.clone(), default()));
            if self.table.grow_if_needed() {
                let refound = self.table.find_slot(hash, |(k, _)| k.equals(key, self.mode));
                debug_assert!(refound < 0);
                !refound as usize
            } else {
                found as usize
            }
        };
        &mut self
            .table
            .entry_at_mut(slot)
            .expect("occupied slot after insert")
            .1
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &Node) -> Option<V> {
        let hash = key.hash_code(self.mode);
        let slot = self.table.find_slot(hash, |(k, _)| k.equals(key, self.mode));
        if slot < 0 {
            self.table.remove_at(!slot as usize).map(|(_, v)| v)
        } else {
            None
        }
    }

    /// Returns the entry stored at a raw slot, if occupied.
    pub fn entry_at(&self, slot: usize) -> Option<(&Node, &V)> {
        self.table.entry_at(slot).map(|(k, v)| (k, v))
    }

    /// Resumable scan over entries in slot order.
    pub fn scan_from(&self, cursor: &mut usize) -> Option<(&Node, &V)> {
        self.table.scan_from(cursor).map(|(k, v)| (k, v))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.table.clear();
    }
}
