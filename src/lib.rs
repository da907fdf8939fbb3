//! Trellis: an embeddable in-memory triple store.
//!
//! Three-way pattern indexes over purpose-built open-addressing
//! collections, with a multi-reader/single-writer transaction layer giving
//! snapshot isolation over a mutable graph.

#![warn(missing_docs)]

pub mod graph;
pub mod model;
pub mod probe;
pub mod store;
pub mod txn;
pub mod types;

pub use graph::{Graph, GraphOptions, MemGraph};
pub use model::{Datatype, Literal, Node, NodeComparison, Triple, TriplePattern};
pub use txn::{Session, TxnGraph, TxnMode};
pub use types::{Result, TrellisError};
