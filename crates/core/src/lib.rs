//! Core types and errors for Haystack
//!
//! This crate defines the foundational types shared by the engine and the
//! store facade:
//! - VectorId: Monotonic identifier binding a vector to its tags
//! - Tag: Key/value string pair attached to a vector
//! - DistanceMetric: Store-wide similarity metric
//! - HaystackError: Error taxonomy for every store operation
//! - Limits: Size limits enforced on writes, queries and snapshot decoding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod types;

pub use error::{HaystackError, HaystackResult};
pub use limits::Limits;
pub use types::{DistanceMetric, Tag, VectorId};
