//! Tag Store
//!
//! Per-vector metadata as ordered (key, value) sequences, stored flat:
//!
//! - keys are interned once into a symbol table
//! - every value is appended to one string pool
//! - each tag is a fixed-size entry (key symbol + value range)
//! - each id owns the entry range `offsets[id]..offsets[id + 1]`
//!
//! Filtered search checks tags on every candidate, so [`TagStore::view`]
//! hands out a borrowed view that answers `Eq` checks without building a
//! `Vec<Tag>`. Keys not listed as unindexed also feed the posting lists in
//! [`postings`].

pub mod postings;

use std::ops::Range;

use haystack_core::{HaystackError, HaystackResult, Tag, VectorId};
use rustc_hash::{FxHashMap, FxHashSet};

use self::postings::{value_hash, PostingIndex};

/// Interned tag key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySym(pub(crate) usize);

#[derive(Debug, Clone, Copy)]
struct TagEntry {
    key: KeySym,
    value_start: usize,
    value_end: usize,
}

/// Flattened tag table with interned keys and posting lists
#[derive(Debug, Clone)]
pub struct TagStore {
    /// Key name -> symbol
    symbols: FxHashMap<String, KeySym>,
    /// Symbol -> key name
    names: Vec<String>,
    /// Symbol -> whether the key feeds posting lists
    indexed: Vec<bool>,
    /// Key names that never feed posting lists
    unindexed_keys: FxHashSet<String>,

    /// All tag values, back to back
    values: String,
    /// All tag entries, grouped by id
    entries: Vec<TagEntry>,
    /// `offsets[i]..offsets[i + 1]` is the entry range of id `i`
    offsets: Vec<usize>,

    postings: PostingIndex,
}

impl Default for TagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TagStore {
    /// Create an empty store in which every key is indexed
    pub fn new() -> Self {
        TagStore {
            symbols: FxHashMap::default(),
            names: Vec::new(),
            indexed: Vec::new(),
            unindexed_keys: FxHashSet::default(),
            values: String::new(),
            entries: Vec::new(),
            offsets: vec![0],
            postings: PostingIndex::new(),
        }
    }

    /// Create an empty store that keeps `keys` out of the posting lists
    ///
    /// Unindexed keys stay filterable; a predicate on them scans.
    pub fn with_unindexed_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new();
        store.unindexed_keys = keys.into_iter().map(Into::into).collect();
        store
    }

    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Id the next `put` must use
    pub fn next_id(&self) -> VectorId {
        VectorId::new(self.len() as u64)
    }

    fn check_next_id(&self, id: VectorId) -> HaystackResult<()> {
        let next = self.next_id();
        if id < next {
            return Err(HaystackError::DuplicateId { id });
        }
        if id > next {
            return Err(HaystackError::invalid_input(format!(
                "{} skips ahead of next id {}",
                id, next
            )));
        }
        Ok(())
    }

    /// Store the tag sequence of a fresh id
    ///
    /// Fails with `DuplicateId` if `id` already has tags. Order and
    /// repeated keys are kept as given.
    pub fn put(&mut self, id: VectorId, tags: &[Tag]) -> HaystackResult<()> {
        self.check_next_id(id)?;
        self.append(id, tags);
        Ok(())
    }

    /// Store consecutive tag sequences starting at `first_id`
    pub fn put_batch(&mut self, first_id: VectorId, batch: &[Vec<Tag>]) -> HaystackResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.check_next_id(first_id)?;
        let total: usize = batch.iter().map(Vec::len).sum();
        self.entries.reserve(total);
        self.offsets.reserve(batch.len());
        for (i, tags) in batch.iter().enumerate() {
            self.append(VectorId::new(first_id.as_u64() + i as u64), tags);
        }
        Ok(())
    }

    fn append(&mut self, id: VectorId, tags: &[Tag]) {
        for tag in tags {
            let key = self.intern(&tag.key);
            let value_start = self.values.len();
            self.values.push_str(&tag.value);
            self.entries.push(TagEntry {
                key,
                value_start,
                value_end: self.values.len(),
            });
            if self.indexed[key.0] {
                self.postings.add(key, value_hash(&tag.value), id);
            }
        }
        self.offsets.push(self.entries.len());
    }

    fn intern(&mut self, key: &str) -> KeySym {
        if let Some(&sym) = self.symbols.get(key) {
            return sym;
        }
        let sym = KeySym(self.names.len());
        self.names.push(key.to_string());
        self.indexed.push(!self.unindexed_keys.contains(key));
        self.symbols.insert(key.to_string(), sym);
        sym
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Materialize the tag sequence of `id`
    pub fn get(&self, id: VectorId) -> HaystackResult<Vec<Tag>> {
        let view = self.view(id).ok_or(HaystackError::NotFound { id })?;
        Ok(view.iter().map(|(k, v)| Tag::new(k, v)).collect())
    }

    /// Borrowed view of the tags of `id`
    pub fn view(&self, id: VectorId) -> Option<TagView<'_>> {
        let range = self.entry_range(id)?;
        Some(TagView {
            store: self,
            entries: &self.entries[range],
        })
    }

    fn entry_range(&self, id: VectorId) -> Option<Range<usize>> {
        let i = id.as_index();
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        Some(start..end)
    }

    /// Symbol of a key, if any vector ever carried it
    pub fn key_symbol(&self, key: &str) -> Option<KeySym> {
        self.symbols.get(key).copied()
    }

    /// Name of an interned key
    pub fn key_name(&self, sym: KeySym) -> &str {
        &self.names[sym.0]
    }

    /// Check whether a key feeds posting lists
    pub fn is_indexed(&self, sym: KeySym) -> bool {
        self.indexed.get(sym.0).copied().unwrap_or(false)
    }

    /// Ascending ids that may carry `(key, value)`; exact only after verification
    pub fn postings(&self, sym: KeySym, hash: u64) -> &[VectorId] {
        self.postings.get(sym, hash)
    }

    /// Number of ids with a tag entry
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Check if no id has been stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of tags across all ids
    pub fn tag_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct keys
    pub fn distinct_keys(&self) -> usize {
        self.names.len()
    }

    /// Key names excluded from posting lists
    pub fn unindexed_keys(&self) -> impl Iterator<Item = &str> {
        self.unindexed_keys.iter().map(String::as_str)
    }
}

/// Borrowed tag sequence of one id
#[derive(Clone, Copy)]
pub struct TagView<'a> {
    store: &'a TagStore,
    entries: &'a [TagEntry],
}

impl<'a> TagView<'a> {
    /// Number of tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the id carries no tags
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let store = self.store;
        self.entries
            .iter()
            .map(move |e| (store.key_name(e.key), &store.values[e.value_start..e.value_end]))
    }

    /// Check whether any tag is exactly `(key, value)`
    #[inline]
    pub fn contains(&self, key: KeySym, value: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.key == key && &self.store.values[e.value_start..e.value_end] == value)
    }
}
