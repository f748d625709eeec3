//! Size limits for vectors, tags, predicates and queries
//!
//! Limits are enforced on every write before any state is touched, on
//! query parameters, and on every length field read while decoding a
//! snapshot. A write that violates a limit fails with `InvalidInput`;
//! a snapshot that violates one fails with `CorruptState`.

use crate::error::{HaystackError, HaystackResult};
use crate::types::Tag;
use serde::{Deserialize, Serialize};

/// Size limits for a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum vector dimension (default: 65536)
    pub max_dimension: usize,

    /// Maximum tag key length in bytes (default: 1024)
    pub max_tag_key_bytes: usize,

    /// Maximum tag value length in bytes (default: 16MB)
    pub max_tag_value_bytes: usize,

    /// Maximum number of tags on one vector (default: 4096)
    pub max_tags_per_vector: usize,

    /// Maximum predicate nesting depth (default: 64)
    pub max_predicate_depth: usize,

    /// Maximum `k` accepted by a query (default: 1M)
    pub max_k: usize,

    /// Maximum uncompressed snapshot body accepted by a load (default: 16GB)
    pub max_snapshot_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_dimension: 65_536,
            max_tag_key_bytes: 1024,
            max_tag_value_bytes: 16 * 1024 * 1024, // 16MB
            max_tags_per_vector: 4096,
            max_predicate_depth: 64,
            max_k: 1_000_000,
            max_snapshot_bytes: 16 << 30, // 16GB
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    ///
    /// Useful for unit tests that exercise limit enforcement without
    /// building huge inputs.
    pub fn with_small_limits() -> Self {
        Limits {
            max_dimension: 16,
            max_tag_key_bytes: 8,
            max_tag_value_bytes: 32,
            max_tags_per_vector: 4,
            max_predicate_depth: 4,
            max_k: 10,
            max_snapshot_bytes: 64 * 1024,
        }
    }

    /// Validate a vector length against the dimension limit
    pub fn validate_dimension(&self, dimension: usize) -> HaystackResult<()> {
        if dimension == 0 {
            return Err(HaystackError::invalid_input(
                "vector must have at least one component",
            ));
        }
        if dimension > self.max_dimension {
            return Err(HaystackError::invalid_input(format!(
                "dimension {} exceeds limit {}",
                dimension, self.max_dimension
            )));
        }
        Ok(())
    }

    /// Validate one vector's tag list
    pub fn validate_tags(&self, tags: &[Tag]) -> HaystackResult<()> {
        if tags.len() > self.max_tags_per_vector {
            return Err(HaystackError::invalid_input(format!(
                "{} tags exceeds limit {}",
                tags.len(),
                self.max_tags_per_vector
            )));
        }
        for tag in tags {
            if tag.key.len() > self.max_tag_key_bytes {
                return Err(HaystackError::invalid_input(format!(
                    "tag key of {} bytes exceeds limit {}",
                    tag.key.len(),
                    self.max_tag_key_bytes
                )));
            }
            if tag.value.len() > self.max_tag_value_bytes {
                return Err(HaystackError::invalid_input(format!(
                    "tag value of {} bytes exceeds limit {}",
                    tag.value.len(),
                    self.max_tag_value_bytes
                )));
            }
        }
        Ok(())
    }

    /// Validate a query's `k`
    pub fn validate_k(&self, k: usize) -> HaystackResult<()> {
        if k > self.max_k {
            return Err(HaystackError::invalid_input(format!(
                "k={} exceeds limit {}",
                k, self.max_k
            )));
        }
        Ok(())
    }
}
