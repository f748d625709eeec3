//! Namespace state
//!
//! One store's Tag Store and Vector Index, kept in lock-step. Every write
//! runs all of its checks before touching either half, so a failed write
//! leaves both exactly as they were, and the two halves always cover the
//! same ids.
//!
//! NamespaceState is not synchronized; the facade wraps it in a
//! reader/writer lock.

use std::time::Instant;

use haystack_core::{DistanceMetric, HaystackError, HaystackResult, Tag, VectorId};
use serde::Serialize;
use tracing::debug;

use crate::config::StoreConfig;
use crate::predicate::{CompiledPredicate, Predicate};
use crate::snapshot;
use crate::tags::TagStore;
use crate::vector::{IndexBackendFactory, SearchScope, VectorIndexBackend};

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    /// Matched vector
    pub id: VectorId,
    /// Similarity to the query (higher = more similar)
    pub score: f32,
    /// The vector's tags, in stored order
    pub tags: Vec<Tag>,
}

/// Store-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of vectors
    pub vectors: usize,
    /// Number of tags across all vectors
    pub tags: usize,
    /// Number of distinct tag keys
    pub distinct_keys: usize,
    /// Fixed dimension, if any
    pub dimension: Option<usize>,
    /// Similarity metric
    pub metric: DistanceMetric,
}

/// Tags and vectors of one store
pub struct NamespaceState {
    config: StoreConfig,
    tags: TagStore,
    index: Box<dyn VectorIndexBackend>,
}

impl std::fmt::Debug for NamespaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceState")
            .field("vectors", &self.index.len())
            .field("dimension", &self.index.dimension())
            .field("metric", &self.index.metric())
            .finish()
    }
}

impl NamespaceState {
    /// Create an empty state
    pub fn new(config: StoreConfig) -> Self {
        let tags = TagStore::with_unindexed_keys(config.unindexed_keys.iter().cloned());
        let index = IndexBackendFactory::default().create(
            config.metric,
            config.dimension,
            config.parallel_threshold,
        );
        NamespaceState {
            config,
            tags,
            index,
        }
    }

    /// Assemble a state from decoded halves
    pub(crate) fn from_parts(
        config: StoreConfig,
        tags: TagStore,
        index: Box<dyn VectorIndexBackend>,
    ) -> HaystackResult<Self> {
        if tags.len() != index.len() {
            return Err(HaystackError::corrupt(format!(
                "{} tag entries for {} vectors",
                tags.len(),
                index.len()
            )));
        }
        Ok(NamespaceState {
            config,
            tags,
            index,
        })
    }

    /// Configuration this state was built with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Tag Store half
    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    /// Vector Index half
    pub fn index(&self) -> &dyn VectorIndexBackend {
        self.index.as_ref()
    }

    /// Number of vectors
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fixed dimension, if any
    pub fn dimension(&self) -> Option<usize> {
        self.index.dimension()
    }

    /// Similarity metric
    pub fn metric(&self) -> DistanceMetric {
        self.index.metric()
    }

    fn next_id(&self) -> HaystackResult<VectorId> {
        let id = self.index.next_id();
        if id != self.tags.next_id() {
            return Err(HaystackError::DuplicateId {
                id: id.min(self.tags.next_id()),
            });
        }
        Ok(id)
    }

    fn check_vector(&self, vector: &[f32]) -> HaystackResult<()> {
        self.config.limits.validate_dimension(vector.len())?;
        self.index.check_vector(vector)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert one vector with its tags under the next id
    pub fn add_vector(&mut self, vector: &[f32], tags: &[Tag]) -> HaystackResult<VectorId> {
        self.check_vector(vector)?;
        self.config.limits.validate_tags(tags)?;
        let id = self.next_id()?;

        self.index.insert(id, vector)?;
        self.tags.put(id, tags)?;
        Ok(id)
    }

    /// Insert a batch under consecutive ids
    ///
    /// Equivalent to calling `add_vector` for each pair in order, except
    /// that nothing is stored unless the whole batch is valid.
    pub fn batch_add_vectors(
        &mut self,
        vectors: &[Vec<f32>],
        tags: &[Vec<Tag>],
    ) -> HaystackResult<Vec<VectorId>> {
        if vectors.len() != tags.len() {
            return Err(HaystackError::ArityMismatch {
                vectors: vectors.len(),
                tags: tags.len(),
            });
        }
        let Some(first) = vectors.first() else {
            return Ok(Vec::new());
        };
        self.check_vector(first)?;
        let dimension = first.len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(HaystackError::DimensionMismatch {
                expected: dimension,
                got: bad.len(),
            });
        }
        for t in tags {
            self.config.limits.validate_tags(t)?;
        }
        let first_id = self.next_id()?;

        self.index.insert_batch(first_id, vectors)?;
        self.tags.put_batch(first_id, tags)?;
        Ok((0..vectors.len() as u64)
            .map(|i| VectorId::new(first_id.as_u64() + i))
            .collect())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Top-k vectors most similar to `query` among those satisfying `predicate`
    ///
    /// Results are ordered by score descending, then id ascending. A
    /// predicate nothing satisfies yields an empty list.
    pub fn search(
        &self,
        query: &[f32],
        predicate: &Predicate,
        k: usize,
    ) -> HaystackResult<Vec<QueryMatch>> {
        let started = Instant::now();
        let limits = &self.config.limits;
        limits.validate_k(k)?;
        if predicate.depth() > limits.max_predicate_depth {
            return Err(HaystackError::malformed(format!(
                "nesting deeper than {}",
                limits.max_predicate_depth
            )));
        }
        if let Some(expected) = self.index.dimension() {
            if query.len() != expected {
                return Err(HaystackError::DimensionMismatch {
                    expected,
                    got: query.len(),
                });
            }
        }

        let compiled = CompiledPredicate::compile(predicate, &self.tags);
        if k == 0 || compiled.is_never() {
            return Ok(Vec::new());
        }

        let candidates = compiled.candidates(&self.tags);
        let accept = |id: VectorId| self.tags.matches(id, &compiled);
        let mut scope = if compiled.is_always() {
            SearchScope::all()
        } else {
            SearchScope::filtered(&accept)
        };
        if let Some(ids) = candidates.as_deref() {
            scope = scope.with_candidates(ids);
        }

        let hits = self.index.search(query, k, scope)?;
        let matches = hits
            .into_iter()
            .map(|(id, score)| {
                Ok(QueryMatch {
                    id,
                    score,
                    tags: self.tags.get(id)?,
                })
            })
            .collect::<HaystackResult<Vec<_>>>()?;

        debug!(
            target: "haystack::vector",
            k,
            candidates = candidates.as_ref().map_or(self.len(), |c| c.len()),
            results = matches.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search"
        );
        Ok(matches)
    }

    /// Copy of the tags of `id`
    pub fn get_tags(&self, id: VectorId) -> HaystackResult<Vec<Tag>> {
        self.tags.get(id)
    }

    /// Copy of the vector of `id`
    pub fn get_vector(&self, id: VectorId) -> HaystackResult<Vec<f32>> {
        self.index
            .get(id)
            .map(<[f32]>::to_vec)
            .ok_or(HaystackError::NotFound { id })
    }

    /// Store-wide counters
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            vectors: self.len(),
            tags: self.tags.tag_count(),
            distinct_keys: self.tags.distinct_keys(),
            dimension: self.dimension(),
            metric: self.metric(),
        }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Encode the whole state into one buffer
    pub fn encode(&self) -> HaystackResult<Vec<u8>> {
        snapshot::encode(self)
    }

    /// Decode a buffer into a fresh state
    ///
    /// `config` supplies limits, tuning and the posting-list key set; the
    /// snapshot supplies metric, dimension and contents.
    pub fn decode(bytes: &[u8], config: StoreConfig) -> HaystackResult<Self> {
        snapshot::decode(bytes, config)
    }
}
