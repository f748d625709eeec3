//! Haystack - embedded vector store with tag-filtered search
//!
//! Vectors are stored with ordered key/value tags. Queries rank stored
//! vectors by similarity to a query vector, but only among those whose
//! tags satisfy a boolean predicate. The whole store can be saved to and
//! restored from a single byte buffer.
//!
//! # Quick Start
//!
//! ```
//! use haystack::{Haystack, Predicate, Tag};
//!
//! let store = Haystack::new("test");
//! store.batch_add_vectors(
//!     vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
//!     vec![
//!         vec![Tag::new("k", "c"), Tag::new("g", "A")],
//!         vec![Tag::new("k", "c"), Tag::new("g", "A")],
//!         vec![Tag::new("k", "c"), Tag::new("g", "B")],
//!     ],
//! )?;
//!
//! let hits = store.search(&[1.0, 0.0], &Predicate::eq("g", "A"), 2)?;
//! assert_eq!(hits.len(), 2);
//! assert_eq!(hits[0].score, 1.0);
//!
//! let snapshot = store.save_state()?;
//! let copy = Haystack::new("copy");
//! copy.load_state(&snapshot)?;
//! assert_eq!(copy.len(), 3);
//! # Ok::<(), haystack::HaystackError>(())
//! ```
//!
//! # Architecture
//!
//! - `haystack-core`: ids, tags, metrics, errors, limits
//! - `haystack-engine`: Tag Store, Predicate Engine, Vector Index,
//!   Snapshot Codec, configuration
//! - this crate: the locked [`Haystack`] facade

pub mod store;

pub use haystack_core::{
    DistanceMetric, HaystackError, HaystackResult, Limits, Tag, VectorId,
};
pub use haystack_engine::{
    Predicate, QueryMatch, SnapshotCompression, StoreConfig, StoreStats, CONFIG_FILE_NAME,
};
pub use store::Haystack;
