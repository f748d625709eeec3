//! Inverted posting lists over (key, value) pairs
//!
//! Lists are keyed by the interned key symbol and an xxh3 hash of the
//! value, so two distinct values may share a list. A posting list is
//! therefore a candidate superset: every id carrying the pair is present,
//! but callers must still verify the pair exactly.
//!
//! Ids are appended in insertion order, which keeps every list ascending
//! without sorting.

use haystack_core::VectorId;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64;

use super::KeySym;

/// Hash a tag value for posting lookup
#[inline]
pub fn value_hash(value: &str) -> u64 {
    xxh3_64(value.as_bytes())
}

/// Posting lists keyed by (key symbol, value hash)
#[derive(Debug, Clone, Default)]
pub struct PostingIndex {
    lists: FxHashMap<(KeySym, u64), Vec<VectorId>>,
}

impl PostingIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` carries a pair hashing to `(key, hash)`
    ///
    /// `id` must not be lower than any id added before it. Repeated pairs
    /// on one id are recorded once.
    pub fn add(&mut self, key: KeySym, hash: u64, id: VectorId) {
        let list = self.lists.entry((key, hash)).or_default();
        if list.last() != Some(&id) {
            list.push(id);
        }
    }

    /// Ascending ids that may carry the pair
    pub fn get(&self, key: KeySym, hash: u64) -> &[VectorId] {
        self.lists
            .get(&(key, hash))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct lists
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Check if no list exists
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// Intersect two ascending id lists
pub fn intersect_sorted(a: &[VectorId], b: &[VectorId]) -> Vec<VectorId> {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut out = Vec::with_capacity(small.len());
    let mut rest = large;
    for &id in small {
        match rest.binary_search(&id) {
            Ok(pos) => {
                out.push(id);
                rest = &rest[pos + 1..];
            }
            Err(pos) => rest = &rest[pos..],
        }
        if rest.is_empty() {
            break;
        }
    }
    out
}

/// Union two ascending id lists, dropping duplicates
pub fn union_sorted(a: &[VectorId], b: &[VectorId]) -> Vec<VectorId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
