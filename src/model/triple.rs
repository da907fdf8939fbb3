use std::fmt;

use super::node::{Node, NodeComparison};

/// An ordered (subject, predicate, object) statement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Triple {
    subject: Node,
    predicate: Node,
    object: Node,
}

impl Triple {
    /// Creates a triple from its three terms.
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns the subject term.
    pub fn subject(&self) -> &Node {
        &self.subject
    }

    /// Returns the predicate term.
    pub fn predicate(&self) -> &Node {
        &self.predicate
    }

    /// Returns the object term.
    pub fn object(&self) -> &Node {
        &self.object
    }

    /// Equality under the given comparison mode, field by field.
    pub fn equals(&self, other: &Triple, mode: NodeComparison) -> bool {
        self.subject.equals(&other.subject, mode)
            && self.predicate.equals(&other.predicate, mode)
            && self.object.equals(&other.object, mode)
    }

    /// Stable hash code under the given comparison mode.
    ///
    /// Combines the field codes as
    /// `subject.rotate_left(21) ^ predicate.rotate_left(43) ^ object`, so
    /// all three fields contribute at distinct bit positions and two
    /// triples sharing two fields still spread across buckets.
    pub fn hash_code(&self, mode: NodeComparison) -> u64 {
        self.subject.hash_code(mode).rotate_left(21)
            ^ self.predicate.hash_code(mode).rotate_left(43)
            ^ self.object.hash_code(mode)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A query pattern over triples; `None` fields are wildcards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TriplePattern {
    /// Subject constraint, or `None` to match any subject.
    pub subject: Option<Node>,
    /// Predicate constraint, or `None` to match any predicate.
    pub predicate: Option<Node>,
    /// Object constraint, or `None` to match any object.
    pub object: Option<Node>,
}

impl TriplePattern {
    /// Creates a pattern from optional term constraints.
    pub fn new(subject: Option<Node>, predicate: Option<Node>, object: Option<Node>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The fully wildcard pattern, matching every triple.
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns `true` when all three fields are bound.
    pub fn is_concrete(&self) -> bool {
        self.subject.is_some() && self.predicate.is_some() && self.object.is_some()
    }

    /// Number of bound fields.
    pub fn bound_count(&self) -> usize {
        usize::from(self.subject.is_some())
            + usize::from(self.predicate.is_some())
            + usize::from(self.object.is_some())
    }

    /// Converts a concrete pattern back into a triple.
    pub fn as_triple(&self) -> Option<Triple> {
        Some(Triple::new(
            self.subject.clone()?,
            self.predicate.clone()?,
            self.object.clone()?,
        ))
    }

    /// Tests a triple against this pattern under the given comparison mode.
    pub fn matches(&self, triple: &Triple, mode: NodeComparison) -> bool {
        self.subject
            .as_ref()
            .map_or(true, |s| s.equals(triple.subject(), mode))
            && self
                .predicate
                .as_ref()
                .map_or(true, |p| p.equals(triple.predicate(), mode))
            && self
                .object
                .as_ref()
                .map_or(true, |o| o.equals(triple.object(), mode))
    }
}

impl From<Triple> for TriplePattern {
    fn from(triple: Triple) -> Self {
        Self {
            subject: Some(triple.subject),
            predicate: Some(triple.predicate),
            object: Some(triple.object),
        }
    }
}

impl From<&Triple> for TriplePattern {
    fn from(triple: &Triple) -> Self {
        TriplePattern::from(triple.clone())
    }
}
