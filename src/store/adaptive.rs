use smallvec::SmallVec;

use super::bitmap::SlotBits;
use super::slots::{SlotIndexSet, SlotIndexedTable};

// Slots are plain integers, so the sorted form stays profitable well past
// the triple-bunch threshold.
const SLOT_SET_PROMOTION_THRESHOLD: usize = 32;

/// Adaptive slot set: a sorted inline array that promotes one-way to a
/// dense bitset once it outgrows the threshold.
#[derive(Clone, Debug)]
pub enum SlotSet {
    /// Sorted array form.
    Sorted(SmallVec<[u32; 12]>),
    /// Bitset form, after promotion.
    Bits(SlotBits),
}

/// Adaptive-threshold store variant: per-node slot sets stay sorted arrays
/// while small and promote to bitsets when they grow. Favors sparse,
/// skewed slot populations.
pub type AdaptiveTable = SlotIndexedTable<SlotSet>;

impl Default for SlotSet {
    fn default() -> Self {
        SlotSet::Sorted(SmallVec::new())
    }
}

impl SlotIndexSet for SlotSet {
    fn insert(&mut self, slot: u32) -> bool {
        match self {
            SlotSet::Sorted(slots) => {
                let Err(at) = slots.binary_search(&slot) else {
                    return false;
                };
                if slots.len() < SLOT_SET_PROMOTION_THRESHOLD {
                    slots.insert(at, slot);
                    return true;
                }
                let mut bits = SlotBits::default();
                for &existing in slots.iter() {
                    bits.insert(existing);
                }
                bits.insert(slot);
                *self = SlotSet::Bits(bits);
                true
            }
            SlotSet::Bits(bits) => bits.insert(slot),
        }
    }

    fn remove(&mut self, slot: u32) -> bool {
        match self {
            SlotSet::Sorted(slots) => match slots.binary_search(&slot) {
                Ok(at) => {
                    slots.remove(at);
                    true
                }
                Err(_) => false,
            },
            // Never demotes back to the sorted form.
            SlotSet::Bits(bits) => bits.remove(slot),
        }
    }

    fn contains(&self, slot: u32) -> bool {
        match self {
            SlotSet::Sorted(slots) => slots.binary_search(&slot).is_ok(),
            SlotSet::Bits(bits) => bits.contains(slot),
        }
    }

    fn len(&self) -> usize {
        match self {
            SlotSet::Sorted(slots) => slots.len(),
            SlotSet::Bits(bits) => bits.len(),
        }
    }

    fn next_at_or_after(&self, from: u32) -> Option<u32> {
        match self {
            SlotSet::Sorted(slots) => {
                let at = slots.partition_point(|&s| s < from);
                slots.get(at).copied()
            }
            SlotSet::Bits(bits) => bits.next_at_or_after(from),
        }
    }
}
