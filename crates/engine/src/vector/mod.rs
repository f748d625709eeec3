//! Vector index
//!
//! Raw vectors live in a contiguous [`VectorHeap`]; search goes through the
//! [`VectorIndexBackend`] trait so an approximate index can replace the
//! exact [`BruteForceBackend`] without touching callers.

pub mod backend;
pub mod brute_force;
pub mod distance;
pub mod heap;
pub mod topk;

pub use backend::{IndexBackendFactory, SearchScope, VectorIndexBackend};
pub use brute_force::BruteForceBackend;
pub use distance::{compute_similarity, dot_product, l2_norm, squared_euclidean};
pub use heap::VectorHeap;
pub use topk::{ScoredId, TopK};
