//! Purpose-built open-addressing collections for triple and node indexing.
//!
//! Everything here shares one probing core ([`ProbeTable`]): downward
//! linear probing, complement-encoded slot search, load factor 0.5 and
//! tombstone-free backward-shift deletion. [`NodeMap`] keys index entries
//! by node, [`HashedTripleSet`] holds large bunches, and [`TripleBunch`]
//! adapts between a flat array and the hashed form per key.

mod bunch;
mod node_map;
mod table;
mod triple_set;

pub use bunch::{TripleBunch, BUNCH_PROMOTION_THRESHOLD};
pub use node_map::NodeMap;
pub use table::{CapacityPolicy, ProbeTable};
pub use triple_set::HashedTripleSet;
