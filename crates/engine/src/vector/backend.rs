//! Vector Index Backend trait
//!
//! Defines the interface for swappable vector index implementations.
//! BruteForceBackend (exact, O(n) search) is the only backend today; an
//! approximate index must honor the same ordering, tie-break and
//! empty-result contract.

use haystack_core::{DistanceMetric, HaystackResult, VectorId};

use crate::vector::brute_force::BruteForceBackend;

/// Which ids a search may return
///
/// `candidates`, when present, is an ascending superset of the admissible
/// ids (from posting lists). `accept` is the exact gate; it runs on every
/// candidate before that candidate is scored.
#[derive(Clone, Copy, Default)]
pub struct SearchScope<'a> {
    candidates: Option<&'a [VectorId]>,
    accept: Option<&'a (dyn Fn(VectorId) -> bool + Sync)>,
}

impl<'a> SearchScope<'a> {
    /// Every stored vector is admissible
    pub fn all() -> Self {
        SearchScope::default()
    }

    /// Restrict to ids passing `accept`
    pub fn filtered(accept: &'a (dyn Fn(VectorId) -> bool + Sync)) -> Self {
        SearchScope {
            candidates: None,
            accept: Some(accept),
        }
    }

    /// Narrow the scan to a precomputed candidate list
    pub fn with_candidates(mut self, candidates: &'a [VectorId]) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Candidate list, if the scan is narrowed
    pub fn candidates(&self) -> Option<&'a [VectorId]> {
        self.candidates
    }

    /// Run the exact gate on one id
    #[inline]
    pub fn admits(&self, id: VectorId) -> bool {
        match self.accept {
            Some(accept) => accept(id),
            None => true,
        }
    }
}

/// Trait for swappable vector index implementations
///
/// IMPORTANT: Keep this trait usable by approximate indexes too. Do not
/// add methods that assume brute-force storage.
pub trait VectorIndexBackend: Send + Sync {
    /// Id the next insert must use
    ///
    /// Ids are dense and never reused.
    fn next_id(&self) -> VectorId;

    /// Check a vector before inserting it. Never mutates.
    fn check_vector(&self, embedding: &[f32]) -> HaystackResult<()>;

    /// Insert one vector under `id`
    fn insert(&mut self, id: VectorId, embedding: &[f32]) -> HaystackResult<()>;

    /// Insert consecutive ids starting at `first_id`
    ///
    /// Semantically equal to repeated `insert`; validates everything first.
    fn insert_batch(&mut self, first_id: VectorId, embeddings: &[Vec<f32>]) -> HaystackResult<()>;

    /// Search for the k most similar admissible vectors
    ///
    /// Returns (VectorId, score) pairs sorted by (score desc, VectorId asc),
    /// of length min(k, admissible count). Scores are "higher = more
    /// similar". Fails with `DimensionMismatch` when the query length
    /// differs from the fixed dimension.
    fn search(
        &self,
        query: &[f32],
        k: usize,
        scope: SearchScope<'_>,
    ) -> HaystackResult<Vec<(VectorId, f32)>>;

    /// Get number of indexed vectors
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get embedding dimension, if fixed
    fn dimension(&self) -> Option<usize>;

    /// Get distance metric
    fn metric(&self) -> DistanceMetric;

    /// Get a vector by ID
    fn get(&self, id: VectorId) -> Option<&[f32]>;

    /// Check if a vector exists
    fn contains(&self, id: VectorId) -> bool {
        id < self.next_id()
    }
}

/// Factory for creating index backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexBackendFactory {
    /// Exact brute-force search
    #[default]
    BruteForce,
}

impl IndexBackendFactory {
    /// Create an empty backend
    pub fn create(
        &self,
        metric: DistanceMetric,
        dimension: Option<usize>,
        parallel_threshold: usize,
    ) -> Box<dyn VectorIndexBackend> {
        match self {
            IndexBackendFactory::BruteForce => Box::new(BruteForceBackend::new(
                metric,
                dimension,
                parallel_threshold,
            )),
        }
    }
}
