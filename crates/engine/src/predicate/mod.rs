//! Predicate Engine
//!
//! A small boolean language over a vector's tags:
//!
//! - `Eq(key, value)` holds iff at least one tag has exactly that key and value
//! - `And`, `Or` and `Not` combine predicates with short-circuit semantics
//!
//! [`Predicate`] is the tree callers build or parse from JSON
//! (see [`parse`]). Before a search the tree is resolved against the
//! Tag Store into a [`CompiledPredicate`], which checks candidates without
//! allocating and derives a candidate superset from posting lists.

pub mod compiled;
pub mod parse;

use std::ops::Not;

use haystack_core::Tag;

pub use compiled::CompiledPredicate;
pub use parse::DEFAULT_MAX_DEPTH;

/// Boolean expression over a tag sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Some tag equals (key, value)
    Eq {
        /// Tag key
        key: String,
        /// Tag value
        value: String,
    },
    /// Both hold
    And(Box<Predicate>, Box<Predicate>),
    /// Either holds
    Or(Box<Predicate>, Box<Predicate>),
    /// Operand does not hold
    Not(Box<Predicate>),
}

impl Predicate {
    /// Leaf predicate `Eq(key, value)`
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluate against a tag sequence
    ///
    /// Pure and total: unmatched keys simply evaluate false.
    pub fn evaluate(&self, tags: &[Tag]) -> bool {
        match self {
            Predicate::Eq { key, value } => tags.iter().any(|t| &t.key == key && &t.value == value),
            Predicate::And(a, b) => a.evaluate(tags) && b.evaluate(tags),
            Predicate::Or(a, b) => a.evaluate(tags) || b.evaluate(tags),
            Predicate::Not(p) => !p.evaluate(tags),
        }
    }

    /// Nesting depth; a lone `Eq` has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Predicate::Eq { .. } => 1,
            Predicate::And(a, b) | Predicate::Or(a, b) => 1 + a.depth().max(b.depth()),
            Predicate::Not(p) => 1 + p.depth(),
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}
