//! Predicates resolved against a Tag Store
//!
//! Compilation interns each `Eq` key to its symbol and pre-hashes the
//! value. A key no vector carries can never match, so it folds to
//! `Never`; constant subtrees fold upward through `And`/`Or`/`Not`.
//!
//! A compiled predicate answers two questions:
//!
//! - [`CompiledPredicate::matches`]: the exact answer for one id
//! - [`CompiledPredicate::candidates`]: an ascending superset of the
//!   matching ids from posting lists, or `None` when only a scan works

use std::borrow::Cow;

use haystack_core::VectorId;

use super::Predicate;
use crate::tags::postings::{intersect_sorted, union_sorted, value_hash};
use crate::tags::{KeySym, TagStore, TagView};

/// Predicate bound to one Tag Store's key symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledPredicate {
    /// Matches nothing
    Never,
    /// Matches everything
    Always,
    /// Some tag equals (key, value)
    Eq {
        /// Interned key
        key: KeySym,
        /// Exact value
        value: String,
        /// Posting hash of `value`
        hash: u64,
        /// Whether the key feeds posting lists
        indexed: bool,
    },
    /// Both hold
    And(Box<CompiledPredicate>, Box<CompiledPredicate>),
    /// Either holds
    Or(Box<CompiledPredicate>, Box<CompiledPredicate>),
    /// Operand does not hold
    Not(Box<CompiledPredicate>),
}

impl CompiledPredicate {
    /// Resolve `predicate` against the keys of `store`
    pub fn compile(predicate: &Predicate, store: &TagStore) -> Self {
        use CompiledPredicate::*;

        match predicate {
            Predicate::Eq { key, value } => match store.key_symbol(key) {
                Some(sym) => Eq {
                    key: sym,
                    value: value.clone(),
                    hash: value_hash(value),
                    indexed: store.is_indexed(sym),
                },
                None => Never,
            },
            Predicate::And(a, b) => match (Self::compile(a, store), Self::compile(b, store)) {
                (Never, _) | (_, Never) => Never,
                (Always, p) | (p, Always) => p,
                (a, b) => And(Box::new(a), Box::new(b)),
            },
            Predicate::Or(a, b) => match (Self::compile(a, store), Self::compile(b, store)) {
                (Always, _) | (_, Always) => Always,
                (Never, p) | (p, Never) => p,
                (a, b) => Or(Box::new(a), Box::new(b)),
            },
            Predicate::Not(p) => match Self::compile(p, store) {
                Never => Always,
                Always => Never,
                Not(inner) => *inner,
                p => Not(Box::new(p)),
            },
        }
    }

    /// Check whether no id can match
    pub fn is_never(&self) -> bool {
        matches!(self, CompiledPredicate::Never)
    }

    /// Check whether every id matches
    pub fn is_always(&self) -> bool {
        matches!(self, CompiledPredicate::Always)
    }

    /// Evaluate against one id's tags
    #[inline]
    pub fn matches(&self, tags: &TagView<'_>) -> bool {
        match self {
            CompiledPredicate::Never => false,
            CompiledPredicate::Always => true,
            CompiledPredicate::Eq { key, value, .. } => tags.contains(*key, value),
            CompiledPredicate::And(a, b) => a.matches(tags) && b.matches(tags),
            CompiledPredicate::Or(a, b) => a.matches(tags) || b.matches(tags),
            CompiledPredicate::Not(p) => !p.matches(tags),
        }
    }

    /// Ascending superset of matching ids, if posting lists can bound it
    ///
    /// `None` means the caller must scan every id. The result may include
    /// ids that do not match (hash collisions, `And` with an unbounded
    /// side); it never omits one that does.
    pub fn candidates<'s>(&self, store: &'s TagStore) -> Option<Cow<'s, [VectorId]>> {
        match self {
            CompiledPredicate::Never => Some(Cow::Borrowed(&[])),
            CompiledPredicate::Always | CompiledPredicate::Not(_) => None,
            CompiledPredicate::Eq {
                key,
                hash,
                indexed,
                ..
            } => {
                if *indexed {
                    Some(Cow::Borrowed(store.postings(*key, *hash)))
                } else {
                    None
                }
            }
            CompiledPredicate::And(a, b) => match (a.candidates(store), b.candidates(store)) {
                (Some(x), Some(y)) => Some(Cow::Owned(intersect_sorted(&x, &y))),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            },
            CompiledPredicate::Or(a, b) => match (a.candidates(store), b.candidates(store)) {
                (Some(x), Some(y)) => Some(Cow::Owned(union_sorted(&x, &y))),
                _ => None,
            },
        }
    }
}

impl TagStore {
    /// Evaluate a compiled predicate against the tags of `id`
    ///
    /// Unknown ids never match.
    #[inline]
    pub fn matches(&self, id: VectorId, predicate: &CompiledPredicate) -> bool {
        match self.view(id) {
            Some(view) => predicate.matches(&view),
            None => false,
        }
    }
}
