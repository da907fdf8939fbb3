use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

/// Comparison mode applied to nodes throughout a store.
///
/// Chosen once at construction and threaded through every index and
/// collection, so equality and hashing always agree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NodeComparison {
    /// Exact structural equality: datatype, lexical form and language tag
    /// must all match.
    #[default]
    Term,
    /// Canonical value equality: numeric literals compare by value across
    /// spellings ("2", "02" and "2.0e0" unify), booleans by truth value.
    /// Non-literals and non-value-bearing literals fall back to term
    /// equality.
    Value,
}

/// Datatype of a [`Literal`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Datatype {
    /// Plain string literal.
    String,
    /// Language-tagged string.
    LangString,
    /// Arbitrary-precision integer (canonicalized into `i64` where it fits).
    Integer,
    /// Decimal number.
    Decimal,
    /// IEEE-754 double.
    Double,
    /// Boolean.
    Boolean,
    /// Any other datatype, identified by its IRI.
    Other(Arc<str>),
}

/// An RDF literal: lexical form, datatype and optional language tag.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Datatype,
    lang: Option<Arc<str>>,
}

/// Canonical value of a literal, used for value-mode comparison.
#[derive(Clone, Copy, Debug)]
pub enum LiteralValue<'a> {
    /// Integral value.
    Integer(i64),
    /// Floating-point value.
    Double(f64),
    /// Boolean value.
    Boolean(bool),
    /// No canonical interpretation; compares like the term itself.
    Text {
        /// Lexical form.
        lexical: &'a str,
        /// Language tag, if any.
        lang: Option<&'a str>,
        /// Original datatype.
        datatype: &'a Datatype,
    },
}

impl Literal {
    /// Creates a plain string literal.
    pub fn string(lexical: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Datatype::String,
            lang: None,
        }
    }

    /// Creates a language-tagged string literal.
    pub fn lang_string(lexical: impl Into<Arc<str>>, lang: impl Into<Arc<str>>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Datatype::LangString,
            lang: Some(lang.into()),
        }
    }

    /// Creates an integer literal from a native value.
    pub fn integer(value: i64) -> Self {
        Self {
            lexical: value.to_string().into(),
            datatype: Datatype::Integer,
            lang: None,
        }
    }

    /// Creates a double literal from a native value.
    pub fn double(value: f64) -> Self {
        Self {
            lexical: value.to_string().into(),
            datatype: Datatype::Double,
            lang: None,
        }
    }

    /// Creates a boolean literal.
    pub fn boolean(value: bool) -> Self {
        Self {
            lexical: if value { "true" } else { "false" }.into(),
            datatype: Datatype::Boolean,
            lang: None,
        }
    }

    /// Creates a literal with an explicit lexical form and datatype.
    pub fn typed(lexical: impl Into<Arc<str>>, datatype: Datatype) -> Self {
        Self {
            lexical: lexical.into(),
            datatype,
            lang: None,
        }
    }

    /// Returns the lexical form.
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// Returns the datatype.
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// Returns the language tag, if any.
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    /// Returns the canonical value of this literal.
    ///
    /// Numeric datatypes parse their lexical form; a form that does not
    /// parse degrades to [`LiteralValue::Text`], which compares like the
    /// term itself.
    pub fn value(&self) -> LiteralValue<'_> {
        match self.datatype {
            Datatype::Integer => match self.lexical.parse::<i64>() {
                Ok(i) => LiteralValue::Integer(i),
                // Out-of-range integers still carry a numeric value.
                Err(_) => match self.lexical.parse::<f64>() {
                    Ok(d) => LiteralValue::Double(d),
                    Err(_) => self.text_value(),
                },
            },
            Datatype::Decimal | Datatype::Double => match self.lexical.parse::<f64>() {
                Ok(d) => LiteralValue::Double(d),
                Err(_) => self.text_value(),
            },
            Datatype::Boolean => match &*self.lexical {
                "true" | "1" => LiteralValue::Boolean(true),
                "false" | "0" => LiteralValue::Boolean(false),
                _ => self.text_value(),
            },
            _ => self.text_value(),
        }
    }

    fn text_value(&self) -> LiteralValue<'_> {
        LiteralValue::Text {
            lexical: &self.lexical,
            lang: self.lang.as_deref(),
            datatype: &self.datatype,
        }
    }

    /// Compares two literals by canonical value.
    pub fn same_value_as(&self, other: &Literal) -> bool {
        self.value().same_value_as(&other.value())
    }
}

impl LiteralValue<'_> {
    /// Value equality, including integer/double cross-type comparison.
    pub fn same_value_as(&self, other: &LiteralValue<'_>) -> bool {
        use LiteralValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Integer(a), Double(b)) | (Double(b), Integer(a)) => *a as f64 == *b,
            (Boolean(a), Boolean(b)) => a == b,
            (
                Text {
                    lexical: la,
                    lang: ga,
                    datatype: da,
                },
                Text {
                    lexical: lb,
                    lang: gb,
                    datatype: db,
                },
            ) => la == lb && ga == gb && da == db,
            _ => false,
        }
    }

    /// Feeds the canonical value into a hasher, consistently with
    /// [`same_value_as`](Self::same_value_as): values that compare equal
    /// hash identically. Integral doubles hash through the integer path so
    /// `"2"` and `"2.0e0"` share a bucket.
    fn hash_value<H: Hasher>(&self, state: &mut H) {
        match self {
            LiteralValue::Integer(i) => {
                state.write_u8(1);
                state.write_i64(*i);
            }
            LiteralValue::Double(d) => {
                if d.is_finite()
                    && d.fract() == 0.0
                    && *d >= i64::MIN as f64
                    && *d <= i64::MAX as f64
                {
                    state.write_u8(1);
                    state.write_i64(*d as i64);
                } else {
                    state.write_u8(2);
                    state.write_u64(d.to_bits());
                }
            }
            LiteralValue::Boolean(b) => {
                state.write_u8(3);
                b.hash(state);
            }
            LiteralValue::Text {
                lexical,
                lang,
                datatype,
            } => {
                state.write_u8(4);
                lexical.hash(state);
                lang.hash(state);
                datatype.hash(state);
            }
        }
    }
}

/// An RDF term: IRI, blank node or literal.
///
/// Nodes are immutable and cheap to clone; string payloads are shared via
/// `Arc`. Hash codes are deterministic within a process and cached by the
/// probing collections.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Node {
    /// A named node, identified by its IRI.
    Iri(Arc<str>),
    /// A blank node, identified by its label.
    Blank(Arc<str>),
    /// A literal value.
    Literal(Literal),
}

impl Node {
    /// Creates an IRI node.
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Node::Iri(iri.into())
    }

    /// Creates a blank node from its label.
    pub fn blank(label: impl Into<Arc<str>>) -> Self {
        Node::Blank(label.into())
    }

    /// Creates a literal node.
    pub fn literal(literal: Literal) -> Self {
        Node::Literal(literal)
    }

    /// Returns `true` when this node is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }

    /// Equality under the given comparison mode.
    pub fn equals(&self, other: &Node, mode: NodeComparison) -> bool {
        match mode {
            NodeComparison::Term => self == other,
            NodeComparison::Value => match (self, other) {
                (Node::Literal(a), Node::Literal(b)) => a.same_value_as(b),
                _ => self == other,
            },
        }
    }

    /// Stable hash code under the given comparison mode.
    ///
    /// Agrees with [`equals`](Self::equals): two nodes equal under `mode`
    /// produce the same code.
    pub fn hash_code(&self, mode: NodeComparison) -> u64 {
        let mut state = FxHasher::default();
        match self {
            Node::Iri(iri) => {
                state.write_u8(0x1);
                iri.hash(&mut state);
            }
            Node::Blank(label) => {
                state.write_u8(0x2);
                label.hash(&mut state);
            }
            Node::Literal(lit) => {
                state.write_u8(0x3);
                match mode {
                    NodeComparison::Term => lit.hash(&mut state),
                    NodeComparison::Value => lit.value().hash_value(&mut state),
                }
            }
        }
        state.finish()
    }
}

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Node::Literal(literal)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Blank(label) => write!(f, "_:{label}"),
            Node::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.lexical)?;
        if let Some(lang) = &self.lang {
            write!(f, "@{lang}")?;
        } else if !matches!(self.datatype, Datatype::String) {
            match &self.datatype {
                Datatype::Integer => write!(f, "^^xsd:integer")?,
                Datatype::Decimal => write!(f, "^^xsd:decimal")?,
                Datatype::Double => write!(f, "^^xsd:double")?,
                Datatype::Boolean => write!(f, "^^xsd:boolean")?,
                Datatype::Other(iri) => write!(f, "^^<{iri}>")?,
                Datatype::String | Datatype::LangString => {}
            }
        }
        Ok(())
    }
}
