//! Bounded top-K selection
//!
//! Keeps the k best (score, id) pairs seen so far in a max-heap ordered by
//! rank, so the worst kept entry is always at the top and a full sort of
//! all candidates is never needed.
//!
//! Rank order is total: score descending, then VectorId ascending. Scores
//! go through `f32::total_cmp`; NaN is demoted to negative infinity and
//! -0.0 is folded into 0.0 before comparison, so two top-K sets built over
//! disjoint chunks merge into exactly the same result as one sequential pass.

use haystack_core::VectorId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scored candidate
#[derive(Debug, Clone, Copy)]
pub struct ScoredId {
    /// Candidate id
    pub id: VectorId,
    /// Similarity score (higher = more similar)
    pub score: f32,
}

impl ScoredId {
    fn new(id: VectorId, score: f32) -> Self {
        let score = if score.is_nan() {
            f32::NEG_INFINITY
        } else {
            // -0.0 + 0.0 == +0.0
            score + 0.0
        };
        ScoredId { id, score }
    }
}

impl PartialEq for ScoredId {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredId {}

impl PartialOrd for ScoredId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredId {
    /// `Less` means "ranks ahead of".
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Bounded top-K accumulator
#[derive(Debug, Clone)]
pub struct TopK {
    k: usize,
    heap: BinaryHeap<ScoredId>,
}

impl TopK {
    /// Create an empty accumulator keeping at most `k` entries
    pub fn new(k: usize) -> Self {
        TopK {
            k,
            heap: BinaryHeap::with_capacity(k.min(1024) + 1),
        }
    }

    /// Offer a candidate
    pub fn push(&mut self, id: VectorId, score: f32) {
        if self.k == 0 {
            return;
        }
        let candidate = ScoredId::new(id, score);
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    /// Fold another accumulator into this one
    pub fn merge(mut self, other: TopK) -> TopK {
        for entry in other.heap {
            self.push(entry.id, entry.score);
        }
        self
    }

    /// Number of entries kept
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if nothing was kept
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries in rank order (best first)
    pub fn into_sorted_vec(self) -> Vec<(VectorId, f32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|s| (s.id, s.score))
            .collect()
    }
}
