//! Brute-Force Vector Search Backend
//!
//! Exact O(n) search over the VectorHeap. Filtering is fused with scoring:
//! an id is scored only after it passes the scope's gate. Candidates go
//! into a bounded top-K, never a full sort. Above the parallel threshold
//! the candidate range is split across rayon workers, each with its own
//! top-K, and the partial results are merged in rank order.

use haystack_core::{DistanceMetric, HaystackError, HaystackResult, VectorId};
use rayon::prelude::*;

use crate::vector::backend::{SearchScope, VectorIndexBackend};
use crate::vector::distance::{l2_norm, score};
use crate::vector::heap::VectorHeap;
use crate::vector::topk::TopK;

/// Minimum ids handed to one rayon task
const MIN_PARALLEL_CHUNK: usize = 4096;

/// Brute-force vector search backend
pub struct BruteForceBackend {
    metric: DistanceMetric,
    /// Vector heap (contiguous storage)
    heap: VectorHeap,
}

impl BruteForceBackend {
    /// Create a new brute-force backend
    pub fn new(metric: DistanceMetric, dimension: Option<usize>, parallel_threshold: usize) -> Self {
        BruteForceBackend {
            metric,
            heap: VectorHeap::new(dimension, parallel_threshold),
        }
    }

    /// Create from existing heap (snapshot decode)
    pub fn from_heap(metric: DistanceMetric, heap: VectorHeap) -> Self {
        BruteForceBackend { metric, heap }
    }

    /// Get read access to heap
    pub fn heap(&self) -> &VectorHeap {
        &self.heap
    }

    #[inline]
    fn score_one(&self, query: &[f32], query_norm: f64, id: VectorId) -> Option<f32> {
        let candidate = self.heap.get(id)?;
        let norm = self.heap.norm(id)?;
        Some(score(self.metric, query, query_norm, candidate, norm))
    }

    fn offer(
        &self,
        mut top: TopK,
        query: &[f32],
        query_norm: f64,
        scope: &SearchScope<'_>,
        id: VectorId,
    ) -> TopK {
        if scope.admits(id) {
            if let Some(s) = self.score_one(query, query_norm, id) {
                top.push(id, s);
            }
        }
        top
    }
}

impl VectorIndexBackend for BruteForceBackend {
    fn next_id(&self) -> VectorId {
        self.heap.next_id()
    }

    fn check_vector(&self, embedding: &[f32]) -> HaystackResult<()> {
        if embedding.is_empty() {
            return Err(HaystackError::invalid_input(
                "vector must have at least one component",
            ));
        }
        self.heap.check_dimension(embedding.len())
    }

    fn insert(&mut self, id: VectorId, embedding: &[f32]) -> HaystackResult<()> {
        self.heap.insert(id, embedding)
    }

    fn insert_batch(&mut self, first_id: VectorId, embeddings: &[Vec<f32>]) -> HaystackResult<()> {
        self.heap.insert_batch(first_id, embeddings)
    }

    fn search(
        &self,
        query: &[f32],
        k: usize,
        scope: SearchScope<'_>,
    ) -> HaystackResult<Vec<(VectorId, f32)>> {
        let Some(dimension) = self.heap.dimension() else {
            // Nothing stored and nothing pinned: no id can match
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(HaystackError::DimensionMismatch {
                expected: dimension,
                got: query.len(),
            });
        }
        if k == 0 || self.heap.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(query);
        let parallel = self.heap.parallel_threshold();

        let top = match scope.candidates() {
            Some(ids) if ids.len() >= parallel => ids
                .par_iter()
                .with_min_len(MIN_PARALLEL_CHUNK)
                .fold(
                    || TopK::new(k),
                    |top, &id| self.offer(top, query, query_norm, &scope, id),
                )
                .reduce(|| TopK::new(k), TopK::merge),
            Some(ids) => ids.iter().fold(TopK::new(k), |top, &id| {
                self.offer(top, query, query_norm, &scope, id)
            }),
            None if self.heap.len() >= parallel => (0..self.heap.len())
                .into_par_iter()
                .with_min_len(MIN_PARALLEL_CHUNK)
                .fold(
                    || TopK::new(k),
                    |top, i| self.offer(top, query, query_norm, &scope, VectorId::new(i as u64)),
                )
                .reduce(|| TopK::new(k), TopK::merge),
            None => (0..self.heap.len() as u64).fold(TopK::new(k), |top, i| {
                self.offer(top, query, query_norm, &scope, VectorId::new(i))
            }),
        };

        Ok(top.into_sorted_vec())
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.heap.dimension()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn get(&self, id: VectorId) -> Option<&[f32]> {
        self.heap.get(id)
    }

    fn contains(&self, id: VectorId) -> bool {
        self.heap.contains(id)
    }
}
