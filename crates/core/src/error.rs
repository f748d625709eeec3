//! Error types for Haystack
//!
//! Every store operation reports failures through [`HaystackError`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::VectorId;
use std::io;
use thiserror::Error;

/// Result type alias for Haystack operations
pub type HaystackResult<T> = std::result::Result<T, HaystackError>;

/// Error types for the Haystack vector store
#[derive(Debug, Error)]
pub enum HaystackError {
    /// Vector length disagrees with the store dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension fixed for the store
        expected: usize,
        /// Length of the offending vector
        got: usize,
    },

    /// Batch inputs have different lengths
    #[error("Arity mismatch: {vectors} vectors but {tags} tag lists")]
    ArityMismatch {
        /// Number of vectors supplied
        vectors: usize,
        /// Number of tag lists supplied
        tags: usize,
    },

    /// Filter expression could not be parsed
    #[error("Malformed predicate: {reason}")]
    MalformedPredicate {
        /// What was wrong with the expression
        reason: String,
    },

    /// Snapshot failed validation
    #[error("Corrupt state: {reason}")]
    CorruptState {
        /// Which check failed
        reason: String,
    },

    /// Id already has an entry (internal consistency fault)
    #[error("Duplicate id: {id}")]
    DuplicateId {
        /// The id that was already present
        id: VectorId,
    },

    /// Id has no entry (internal consistency fault)
    #[error("Not found: {id}")]
    NotFound {
        /// The missing id
        id: VectorId,
    },

    /// Input violates a size limit or is otherwise unusable
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the violation
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// I/O error (config file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HaystackError {
    /// Create a `CorruptState` error
    pub fn corrupt(reason: impl Into<String>) -> Self {
        HaystackError::CorruptState {
            reason: reason.into(),
        }
    }

    /// Create a `MalformedPredicate` error
    pub fn malformed(reason: impl Into<String>) -> Self {
        HaystackError::MalformedPredicate {
            reason: reason.into(),
        }
    }

    /// Create an `InvalidInput` error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        HaystackError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a `Config` error
    pub fn config(message: impl Into<String>) -> Self {
        HaystackError::Config {
            message: message.into(),
        }
    }

    /// Check if this error was caused by caller input
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            HaystackError::DimensionMismatch { .. }
                | HaystackError::ArityMismatch { .. }
                | HaystackError::MalformedPredicate { .. }
                | HaystackError::InvalidInput { .. }
        )
    }

    /// Check if this error indicates a bad snapshot
    pub fn is_corruption(&self) -> bool {
        matches!(self, HaystackError::CorruptState { .. })
    }

    /// Check if this error is an internal consistency fault
    ///
    /// These never surface through correct facade use.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            HaystackError::DuplicateId { .. } | HaystackError::NotFound { .. }
        )
    }
}
