//! Vector Heap - Contiguous embedding storage
//!
//! VectorHeap stores embeddings in a contiguous Vec<f32> for cache-friendly
//! similarity computation, with one cached L2 norm per vector.
//!
//! # Invariants
//!
//! - VectorIds are dense: the vector with id `i` occupies
//!   `data[i * dim..(i + 1) * dim]` and `norms[i]`
//! - Ids are never reused; the heap only grows
//! - The dimension is fixed by the first insert (or pinned at construction)
//!   and never changes afterwards

use haystack_core::{HaystackError, HaystackResult, VectorId};
use rayon::prelude::*;

use crate::vector::distance::l2_norm;

/// Contiguous vector storage
#[derive(Debug, Clone)]
pub struct VectorHeap {
    /// Fixed dimension, `None` until the first insert
    dimension: Option<usize>,

    /// Contiguous embedding storage
    /// Layout: [v0_dim0, v0_dim1, ..., v0_dimN, v1_dim0, v1_dim1, ...]
    data: Vec<f32>,

    /// Cached L2 norm per vector, indexed by id
    norms: Vec<f64>,

    /// Batch size at which norm computation and copies fan out
    parallel_threshold: usize,
}

impl VectorHeap {
    /// Create an empty heap
    ///
    /// With `dimension = None` the first insert fixes the dimension.
    pub fn new(dimension: Option<usize>, parallel_threshold: usize) -> Self {
        VectorHeap {
            dimension,
            data: Vec::new(),
            norms: Vec::new(),
            parallel_threshold,
        }
    }

    /// Rebuild a heap from flattened data (snapshot decode)
    ///
    /// Norms are derived state and are recomputed here.
    pub fn from_data(
        dimension: Option<usize>,
        data: Vec<f32>,
        parallel_threshold: usize,
    ) -> HaystackResult<Self> {
        let mut heap = VectorHeap::new(dimension, parallel_threshold);
        if data.is_empty() {
            return Ok(heap);
        }
        let dim = dimension.ok_or_else(|| {
            HaystackError::corrupt("vector data present without a dimension")
        })?;
        if dim == 0 || data.len() % dim != 0 {
            return Err(HaystackError::corrupt(format!(
                "{} floats do not divide into vectors of dimension {}",
                data.len(),
                dim
            )));
        }
        heap.norms = if data.len() / dim >= parallel_threshold {
            data.par_chunks(dim).map(l2_norm).collect()
        } else {
            data.chunks(dim).map(l2_norm).collect()
        };
        heap.data = data;
        Ok(heap)
    }

    /// Get the dimension, if fixed
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Get the number of vectors
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Id the next insert must use
    pub fn next_id(&self) -> VectorId {
        VectorId::new(self.len() as u64)
    }

    /// Check a vector length against the (possibly not yet fixed) dimension
    pub fn check_dimension(&self, len: usize) -> HaystackResult<()> {
        match self.dimension {
            Some(expected) if expected != len => Err(HaystackError::DimensionMismatch {
                expected,
                got: len,
            }),
            _ => Ok(()),
        }
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

    // ========================================================================
    // Insert Operations
    // ========================================================================

    /// Append a vector under `id`, which must be `next_id()`
    pub fn insert(&mut self, id: VectorId, embedding: &[f32]) -> HaystackResult<()> {
        if embedding.is_empty() {
            return Err(HaystackError::invalid_input(
                "vector must have at least one component",
            ));
        }
        self.check_dimension(embedding.len())?;
        self.check_next_id(id)?;

        self.dimension.get_or_insert(embedding.len());
        self.data.extend_from_slice(embedding);
        self.norms.push(l2_norm(embedding));
        Ok(())
    }

    /// Append a batch of vectors starting at `first_id`
    ///
    /// Every vector is validated before any is stored. Storage grows once;
    /// norms and copies run in parallel above the parallel threshold.
    pub fn insert_batch(
        &mut self,
        first_id: VectorId,
        embeddings: &[Vec<f32>],
    ) -> HaystackResult<()> {
        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        self.check_next_id(first_id)?;
        let dim = self.dimension.unwrap_or(first.len());
        if dim == 0 {
            return Err(HaystackError::invalid_input(
                "vector must have at least one component",
            ));
        }
        for embedding in embeddings {
            if embedding.len() != dim {
                return Err(HaystackError::DimensionMismatch {
                    expected: dim,
                    got: embedding.len(),
                });
            }
        }

        self.dimension = Some(dim);
        let start = self.data.len();
        self.data.resize(start + embeddings.len() * dim, 0.0);
        let target = &mut self.data[start..];

        if embeddings.len() >= self.parallel_threshold {
            target
                .par_chunks_mut(dim)
                .zip(embeddings.par_iter())
                .for_each(|(dst, src)| dst.copy_from_slice(src));
            let norms: Vec<f64> = embeddings.par_iter().map(|v| l2_norm(v)).collect();
            self.norms.extend(norms);
        } else {
            for (dst, src) in target.chunks_mut(dim).zip(embeddings) {
                dst.copy_from_slice(src);
            }
            self.norms.extend(embeddings.iter().map(|v| l2_norm(v)));
        }
        Ok(())
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Get embedding by VectorId
    pub fn get(&self, id: VectorId) -> Option<&[f32]> {
        let dim = self.dimension?;
        if id.as_index() >= self.len() {
            return None;
        }
        let start = id.as_index() * dim;
        Some(&self.data[start..start + dim])
    }

    /// Get the cached norm of a vector
    pub fn norm(&self, id: VectorId) -> Option<f64> {
        self.norms.get(id.as_index()).copied()
    }

    /// Check if a vector exists
    pub fn contains(&self, id: VectorId) -> bool {
        id.as_index() < self.len()
    }

    /// Iterate all vectors in id order
    pub fn iter(&self) -> impl Iterator<Item = (VectorId, &[f32])> {
        let dim = self.dimension.unwrap_or(1);
        self.data
            .chunks(dim)
            .enumerate()
            .map(|(i, v)| (VectorId::new(i as u64), v))
    }

    /// Raw flattened data (snapshot serialization)
    pub fn raw_data(&self) -> &[f32] {
        &self.data
    }

    /// Batch size at which work fans out
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}
