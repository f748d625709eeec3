//! Store facade
//!
//! [`Haystack`] is the public entry point: one named store owning its tags
//! and vectors behind a single reader/writer lock. Readers (`query`,
//! `search`, `save_state`, introspection) share the lock; writers
//! (`add_vector`, `batch_add_vectors`, `load_state`) hold it exclusively
//! for the whole operation, so a concurrent reader sees a batch either
//! entirely or not at all.

use std::fmt;
use std::time::Instant;

use haystack_core::{DistanceMetric, HaystackError, HaystackResult, Tag, VectorId};
use haystack_engine::{NamespaceState, Predicate, QueryMatch, StoreConfig, StoreStats};
use parking_lot::RwLock;
use tracing::{debug, info};

/// An embedded, tag-filtered vector store
///
/// # Example
///
/// ```
/// use haystack::{Haystack, Predicate, Tag};
///
/// let store = Haystack::new("docs");
/// store.add_vector(&[1.0, 0.0], vec![Tag::new("g", "A")])?;
/// store.add_vector(&[0.0, 1.0], vec![Tag::new("g", "B")])?;
///
/// let hits = store.query(&[1.0, 0.0], &Predicate::eq("g", "A"), 5)?;
/// assert_eq!(hits, vec![vec![Tag::new("g", "A")]]);
/// # Ok::<(), haystack::HaystackError>(())
/// ```
pub struct Haystack {
    namespace: String,
    config: StoreConfig,
    state: RwLock<NamespaceState>,
}

impl fmt::Debug for Haystack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Haystack")
            .field("namespace", &self.namespace)
            .field("state", &*self.state.read())
            .finish()
    }
}

impl Haystack {
    /// Create an empty store with the default configuration
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::build(namespace.into(), StoreConfig::default())
    }

    /// Create an empty store with an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration does not validate.
    pub fn with_config(namespace: impl Into<String>, config: StoreConfig) -> HaystackResult<Self> {
        config.validate()?;
        Ok(Self::build(namespace.into(), config))
    }

    fn build(namespace: String, config: StoreConfig) -> Self {
        debug!(
            target: "haystack::store",
            namespace = %namespace,
            metric = %config.metric,
            dimension = ?config.dimension,
            "Store created"
        );
        Haystack {
            namespace,
            state: RwLock::new(NamespaceState::new(config.clone())),
            config,
        }
    }

    /// Opaque name of this store
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Configuration the store was created with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert one vector with its tags; returns the new id
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the length differs from the store dimension,
    /// `InvalidInput` on limit violations. The store is unchanged on error.
    pub fn add_vector(&self, vector: &[f32], tags: Vec<Tag>) -> HaystackResult<VectorId> {
        let started = Instant::now();
        let id = self.state.write().add_vector(vector, &tags)?;
        debug!(
            target: "haystack::store",
            namespace = %self.namespace,
            id = id.as_u64(),
            tags = tags.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "add_vector"
        );
        Ok(id)
    }

    /// Insert many vectors under consecutive ids
    ///
    /// Results are identical to calling [`add_vector`](Self::add_vector)
    /// for each pair in order. Nothing is stored unless the whole batch is
    /// valid.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if the two lists differ in length, plus everything
    /// `add_vector` can return.
    pub fn batch_add_vectors(
        &self,
        vectors: Vec<Vec<f32>>,
        tags: Vec<Vec<Tag>>,
    ) -> HaystackResult<Vec<VectorId>> {
        let started = Instant::now();
        let ids = self.state.write().batch_add_vectors(&vectors, &tags)?;
        debug!(
            target: "haystack::store",
            namespace = %self.namespace,
            count = ids.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "batch_add_vectors"
        );
        Ok(ids)
    }

    /// Insert one vector with tags given as `[{"key": .., "value": ..}, ..]`
    pub fn add_vector_json(&self, vector: &[f32], tags_json: &str) -> HaystackResult<VectorId> {
        self.add_vector(vector, parse_tags(tags_json)?)
    }

    /// Batch insert with tags given as a JSON array of tag arrays
    pub fn batch_add_vectors_json(
        &self,
        vectors: Vec<Vec<f32>>,
        tags_json: &str,
    ) -> HaystackResult<Vec<VectorId>> {
        let tags: Vec<Vec<Tag>> = serde_json::from_str(tags_json)
            .map_err(|e| HaystackError::invalid_input(format!("tag JSON: {}", e)))?;
        self.batch_add_vectors(vectors, tags)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Top-k hits among vectors satisfying `predicate`, with ids and scores
    ///
    /// Ordered by score descending, ties by ascending id. A predicate that
    /// nothing satisfies gives an empty list, not an error.
    pub fn search(
        &self,
        vector: &[f32],
        predicate: &Predicate,
        k: usize,
    ) -> HaystackResult<Vec<QueryMatch>> {
        self.state.read().search(vector, predicate, k)
    }

    /// Tag sequences of the top-k vectors satisfying `predicate`
    pub fn query(
        &self,
        vector: &[f32],
        predicate: &Predicate,
        k: usize,
    ) -> HaystackResult<Vec<Vec<Tag>>> {
        Ok(self
            .search(vector, predicate, k)?
            .into_iter()
            .map(|m| m.tags)
            .collect())
    }

    /// `query` over the JSON wire format; returns a JSON array of tag arrays
    ///
    /// # Errors
    ///
    /// `MalformedPredicate` if `predicate_json` does not parse.
    pub fn query_json(&self, vector: &[f32], predicate_json: &str, k: usize) -> HaystackResult<String> {
        let predicate =
            Predicate::parse_with_depth(predicate_json, self.config.limits.max_predicate_depth)?;
        let results = self.query(vector, &predicate, k)?;
        serde_json::to_string(&results)
            .map_err(|e| HaystackError::invalid_input(format!("result JSON: {}", e)))
    }

    /// Number of vectors
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Check if the store holds no vectors
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Fixed dimension, if any
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().dimension()
    }

    /// Store-wide similarity metric
    pub fn metric(&self) -> DistanceMetric {
        self.state.read().metric()
    }

    /// Copy of the tags of `id`
    pub fn get_tags(&self, id: VectorId) -> HaystackResult<Vec<Tag>> {
        self.state.read().get_tags(id)
    }

    /// Copy of the vector of `id`
    pub fn get_vector(&self, id: VectorId) -> HaystackResult<Vec<f32>> {
        self.state.read().get_vector(id)
    }

    /// Store-wide counters
    pub fn stats(&self) -> StoreStats {
        self.state.read().stats()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Serialize the whole store into one buffer
    pub fn save_state(&self) -> HaystackResult<Vec<u8>> {
        let bytes = self.state.read().encode()?;
        info!(
            target: "haystack::store",
            namespace = %self.namespace,
            bytes = bytes.len(),
            "State saved"
        );
        Ok(bytes)
    }

    /// Replace the whole store with a snapshot
    ///
    /// The snapshot is decoded into a fresh state first; the swap happens
    /// only on success.
    ///
    /// # Errors
    ///
    /// `CorruptState` if the buffer fails validation. The store keeps its
    /// previous contents.
    pub fn load_state(&self, bytes: &[u8]) -> HaystackResult<()> {
        let fresh = NamespaceState::decode(bytes, self.config.clone())?;
        let vectors = fresh.len();
        *self.state.write() = fresh;
        info!(
            target: "haystack::store",
            namespace = %self.namespace,
            vectors,
            bytes = bytes.len(),
            "State loaded"
        );
        Ok(())
    }
}

fn parse_tags(tags_json: &str) -> HaystackResult<Vec<Tag>> {
    serde_json::from_str(tags_json)
        .map_err(|e| HaystackError::invalid_input(format!("tag JSON: {}", e)))
}
