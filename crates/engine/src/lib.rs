//! Storage engine for haystack
//!
//! This crate holds everything below the public facade:
//! - Tag Store: flattened per-vector tag sequences plus posting lists
//! - Predicate Engine: the boolean filter language and its compiled form
//! - Vector Index: contiguous vectors, norms, exact top-K search
//! - Snapshot Codec: the versioned, checksummed byte format
//! - NamespaceState: one store's tags and vectors kept in lock-step
//! - StoreConfig: `haystack.toml`
//!
//! Nothing here is synchronized; the facade owns the lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod predicate;
pub mod snapshot;
pub mod state;
pub mod tags;
pub mod vector;

pub use config::{SnapshotCompression, StoreConfig, CONFIG_FILE_NAME};
pub use predicate::{CompiledPredicate, Predicate};
pub use snapshot::{SnapshotHeader, SNAPSHOT_VERSION};
pub use state::{NamespaceState, QueryMatch, StoreStats};
pub use tags::{KeySym, TagStore, TagView};
pub use vector::{
    BruteForceBackend, IndexBackendFactory, SearchScope, VectorHeap, VectorIndexBackend,
};
