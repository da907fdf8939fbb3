//! RDF term and statement model.
//!
//! Terms carry two equality notions, exact ([`NodeComparison::Term`]) and
//! canonical ([`NodeComparison::Value`]); the mode is fixed per store at
//! construction and every collection hashes and compares through it.

mod node;
mod triple;

pub use node::{Datatype, Literal, LiteralValue, Node, NodeComparison};
pub use triple::{Triple, TriplePattern};
