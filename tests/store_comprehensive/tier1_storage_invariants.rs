//! Tier 1: Storage Invariants
//!
//! - ids are assigned 0, 1, 2, ... and never reused
//! - the dimension is fixed by the first insert
//! - every vector has exactly one tag entry
//! - failed writes change nothing

use crate::test_utils::*;
use haystack::{Haystack, HaystackError, Limits, StoreConfig, Tag, VectorId};

#[test]
fn ids_are_dense_and_monotonic() {
    init_tracing();
    let store = Haystack::new("ids");
    let a = store.add_vector(&[1.0, 2.0], vec![]).unwrap();
    let batch = store
        .batch_add_vectors(vec![vec![3.0, 4.0], vec![5.0, 6.0]], vec![vec![], vec![]])
        .unwrap();
    let d = store.add_vector(&[7.0, 8.0], vec![]).unwrap();

    assert_eq!(a, VectorId::new(0));
    assert_eq!(batch, vec![VectorId::new(1), VectorId::new(2)]);
    assert_eq!(d, VectorId::new(3));
}

#[test]
fn failed_insert_does_not_consume_an_id() {
    let store = scenario_store();
    assert!(store.add_vector(&[1.0, 2.0, 3.0], vec![]).is_err());
    let id = store.add_vector(&[0.5, 0.5], vec![]).unwrap();
    assert_eq!(id, VectorId::new(3));
}

#[test]
fn first_insert_fixes_dimension() {
    init_tracing();
    let store = Haystack::new("dim");
    assert_eq!(store.dimension(), None);
    store.add_vector(&[0.0; 5], vec![]).unwrap();
    assert_eq!(store.dimension(), Some(5));

    let err = store.add_vector(&[0.0; 4], vec![]).unwrap_err();
    assert!(matches!(
        err,
        HaystackError::DimensionMismatch {
            expected: 5,
            got: 4
        }
    ));
}

#[test]
fn pinned_dimension_applies_before_first_insert() {
    init_tracing();
    let store =
        Haystack::with_config("pinned", StoreConfig::default().with_dimension(3)).unwrap();
    assert_eq!(store.dimension(), Some(3));
    assert!(matches!(
        store.add_vector(&[1.0, 2.0], vec![]),
        Err(HaystackError::DimensionMismatch { .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn dimension_mismatch_leaves_counts_unchanged() {
    let store = scenario_store();
    let before = store.stats();

    assert!(store.add_vector(&[1.0], tags(&[("g", "A")])).is_err());
    assert!(store
        .batch_add_vectors(
            vec![vec![1.0, 1.0], vec![1.0, 1.0, 1.0]],
            vec![tags(&[("g", "C")]), tags(&[("g", "C")])],
        )
        .is_err());

    assert_eq!(store.stats(), before);
    assert_eq!(store.len(), 3);
}

#[test]
fn arity_mismatch_is_reported() {
    let store = scenario_store();
    let err = store
        .batch_add_vectors(vec![vec![1.0, 0.0]; 3], vec![vec![]; 2])
        .unwrap_err();
    assert!(matches!(
        err,
        HaystackError::ArityMismatch {
            vectors: 3,
            tags: 2
        }
    ));
    assert_eq!(store.len(), 3);
}

#[test]
fn empty_batch_is_a_no_op() {
    let store = scenario_store();
    assert!(store.batch_add_vectors(vec![], vec![]).unwrap().is_empty());
    assert_eq!(store.len(), 3);
}

#[test]
fn every_vector_has_its_tags() {
    let store = scenario_store();
    for i in 0..store.len() as u64 {
        let id = VectorId::new(i);
        assert!(store.get_vector(id).is_ok());
        assert!(store.get_tags(id).is_ok());
    }
    assert!(matches!(
        store.get_tags(VectorId::new(3)),
        Err(HaystackError::NotFound { .. })
    ));
    assert!(matches!(
        store.get_vector(VectorId::new(3)),
        Err(HaystackError::NotFound { .. })
    ));
}

#[test]
fn tags_keep_order_and_repeated_keys() {
    init_tracing();
    let store = Haystack::new("tags");
    let t = vec![
        Tag::new("genre", "jazz"),
        Tag::new("genre", "blues"),
        Tag::new("year", "1959"),
        Tag::new("genre", "jazz"),
    ];
    let id = store.add_vector(&[1.0], t.clone()).unwrap();
    assert_eq!(store.get_tags(id).unwrap(), t);
}

#[test]
fn returned_copies_are_independent() {
    let store = scenario_store();
    let mut v = store.get_vector(VectorId::new(0)).unwrap();
    v[0] = 42.0;
    let mut t = store.get_tags(VectorId::new(0)).unwrap();
    t.clear();
    assert_eq!(store.get_vector(VectorId::new(0)).unwrap(), vec![1.0, 0.0]);
    assert_eq!(store.get_tags(VectorId::new(0)).unwrap().len(), 2);
}

#[test]
fn limits_are_enforced_without_mutation() {
    init_tracing();
    let store = Haystack::with_config(
        "limits",
        StoreConfig::default().with_limits(Limits::with_small_limits()),
    )
    .unwrap();

    let too_many: Vec<Tag> = (0..5).map(|i| Tag::new("k", i.to_string())).collect();
    assert!(matches!(
        store.add_vector(&[1.0], too_many),
        Err(HaystackError::InvalidInput { .. })
    ));
    assert!(matches!(
        store.add_vector(&[0.0; 17], vec![]),
        Err(HaystackError::InvalidInput { .. })
    ));
    assert!(matches!(
        store.add_vector(&[], vec![]),
        Err(HaystackError::InvalidInput { .. })
    ));
    assert!(store.is_empty());
    assert_eq!(store.dimension(), None);
}

#[test]
fn stats_track_contents() {
    let store = scenario_store();
    let stats = store.stats();
    assert_eq!(stats.vectors, 3);
    assert_eq!(stats.tags, 6);
    assert_eq!(stats.distinct_keys, 2);
    assert_eq!(stats.dimension, Some(2));
}
