//! Tier 4: Snapshots
//!
//! - save then load reproduces ids, vectors, tags and query results
//! - save is deterministic
//! - load replaces, never merges
//! - any corrupted buffer is rejected and leaves the store as it was

use crate::test_utils::*;
use haystack::{
    DistanceMetric, Haystack, HaystackError, Predicate, SnapshotCompression, StoreConfig,
    VectorId, CONFIG_FILE_NAME,
};
use tempfile::TempDir;

fn populated(config: StoreConfig) -> Haystack {
    init_tracing();
    let store = Haystack::with_config("snap", config).unwrap();
    store
        .batch_add_vectors(random_vectors(5, 120, 6), random_tags(6, 120))
        .unwrap();
    store
}

#[test]
fn round_trip_preserves_everything() {
    let source = populated(StoreConfig::default());
    let bytes = source.save_state().unwrap();

    let target = Haystack::new("restored");
    target.load_state(&bytes).unwrap();

    assert_eq!(target.stats(), source.stats());
    for id in 0..120u64 {
        let id = VectorId::new(id);
        assert_eq!(target.get_tags(id).unwrap(), source.get_tags(id).unwrap());
        let a = target.get_vector(id).unwrap();
        let b = source.get_vector(id).unwrap();
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    let query = random_vectors(7, 1, 6).remove(0);
    for predicate in [
        Predicate::eq("k0", "v2"),
        !Predicate::eq("k1", "v0"),
        Predicate::eq("text", "chunk 3"),
    ] {
        assert_eq!(
            target.search(&query, &predicate, 10).unwrap(),
            source.search(&query, &predicate, 10).unwrap()
        );
    }

    assert_eq!(target.save_state().unwrap(), bytes);
}

#[test]
fn save_is_deterministic() {
    let a = populated(StoreConfig::default());
    let b = populated(StoreConfig::default());
    assert_eq!(a.save_state().unwrap(), b.save_state().unwrap());
    assert_eq!(a.save_state().unwrap(), a.save_state().unwrap());
}

#[test]
fn inserts_continue_after_load() {
    let source = scenario_store();
    let bytes = source.save_state().unwrap();

    let target = Haystack::new("next");
    target.load_state(&bytes).unwrap();
    let id = target.add_vector(&[0.5, 0.5], tags(&[("g", "A")])).unwrap();
    assert_eq!(id, VectorId::new(3));
    assert!(matches!(
        target.add_vector(&[0.5], vec![]),
        Err(HaystackError::DimensionMismatch { expected: 2, .. })
    ));
}

#[test]
fn load_replaces_existing_contents() {
    let source = scenario_store();
    let bytes = source.save_state().unwrap();

    let target = populated(StoreConfig::default());
    target.load_state(&bytes).unwrap();
    assert_eq!(target.len(), 3);
    assert_eq!(target.dimension(), Some(2));
    assert!(target
        .search(&[1.0, 0.0], &Predicate::eq("k0", "v0"), 5)
        .unwrap()
        .is_empty());
}

#[test]
fn snapshot_metric_wins_on_load() {
    let source = store_with_metric(DistanceMetric::Euclidean);
    source.add_vector(&[3.0, 4.0], tags(&[("a", "1")])).unwrap();
    let bytes = source.save_state().unwrap();

    let target = Haystack::new("cosine-config");
    target.load_state(&bytes).unwrap();
    assert_eq!(target.metric(), DistanceMetric::Euclidean);
    let hits = target
        .search(&[0.0, 0.0], &Predicate::eq("a", "1"), 1)
        .unwrap();
    assert_eq!(hits[0].score, -25.0);
}

#[test]
fn empty_snapshot_round_trips() {
    init_tracing();
    let empty = Haystack::new("empty");
    let bytes = empty.save_state().unwrap();

    let target = scenario_store();
    target.load_state(&bytes).unwrap();
    assert!(target.is_empty());
    assert_eq!(target.dimension(), None);
    assert_eq!(target.add_vector(&[1.0; 7], vec![]).unwrap(), VectorId::new(0));
}

#[test]
fn empty_snapshot_keeps_pinned_dimension() {
    init_tracing();
    let bytes = Haystack::new("empty").save_state().unwrap();
    let target =
        Haystack::with_config("pinned", StoreConfig::default().with_dimension(4)).unwrap();
    target.load_state(&bytes).unwrap();
    assert_eq!(target.dimension(), Some(4));
}

#[test]
fn zstd_snapshots_are_flagged_and_portable() {
    let config = StoreConfig::default().with_compression(SnapshotCompression::Zstd);
    let compressed_store = populated(config);
    let plain_store = populated(StoreConfig::default());

    let compressed = compressed_store.save_state().unwrap();
    let plain = plain_store.save_state().unwrap();
    assert_eq!(&compressed[..4], b"HYST");
    assert_eq!(compressed[5] & 1, 1);
    assert_eq!(plain[5] & 1, 0);
    assert!(compressed.len() < plain.len());

    let target = Haystack::new("plain-config");
    target.load_state(&compressed).unwrap();
    assert_eq!(target.stats(), plain_store.stats());
    assert_eq!(target.save_state().unwrap(), plain);
}

#[test]
fn every_truncation_is_rejected() {
    let source = scenario_store();
    let bytes = source.save_state().unwrap();
    let target = scenario_store();
    let before = target.save_state().unwrap();

    for len in 0..bytes.len() {
        let err = target.load_state(&bytes[..len]).unwrap_err();
        assert!(err.is_corruption(), "len {}: {:?}", len, err);
    }
    assert_eq!(target.save_state().unwrap(), before);
}

#[test]
fn bit_flips_are_rejected() {
    let bytes = scenario_store().save_state().unwrap();
    let target = Haystack::new("flip");
    target.add_vector(&[9.0], tags(&[("keep", "me")])).unwrap();

    for i in 0..bytes.len() {
        let mut corrupt = bytes.clone();
        corrupt[i] ^= 0x10;
        assert!(
            target.load_state(&corrupt).unwrap_err().is_corruption(),
            "flip at {}",
            i
        );
    }
    assert_eq!(target.len(), 1);
    assert_eq!(target.get_tags(VectorId::new(0)).unwrap(), tags(&[("keep", "me")]));
}

#[test]
fn trailing_and_foreign_bytes_are_rejected() {
    let mut bytes = scenario_store().save_state().unwrap();
    bytes.push(0);
    let target = Haystack::new("t");
    assert!(target.load_state(&bytes).unwrap_err().is_corruption());
    assert!(target.load_state(b"").unwrap_err().is_corruption());
    assert!(target
        .load_state(b"PK\x03\x04 definitely not a snapshot at all")
        .unwrap_err()
        .is_corruption());
    assert!(target.is_empty());
}

#[test]
fn config_file_drives_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    StoreConfig::write_default_if_missing(&path).unwrap();
    let defaults = StoreConfig::from_file(&path).unwrap();
    assert_eq!(defaults, StoreConfig::default());

    let custom = StoreConfig::default()
        .with_metric(DistanceMetric::DotProduct)
        .with_compression(SnapshotCompression::Zstd)
        .with_dimension(2);
    custom.write_to_file(&path).unwrap();
    StoreConfig::write_default_if_missing(&path).unwrap();
    let loaded = StoreConfig::from_file(&path).unwrap();
    assert_eq!(loaded, custom);

    let store = Haystack::with_config("from-file", loaded).unwrap();
    store.add_vector(&[2.0, 0.0], tags(&[("a", "1")])).unwrap();
    let hits = store.search(&[3.0, 0.0], &Predicate::eq("a", "1"), 1).unwrap();
    assert_eq!(hits[0].score, 6.0);
    assert_eq!(store.save_state().unwrap()[5] & 1, 1);
}

#[test]
fn bad_config_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "metric = \"manhattan\"\n").unwrap();
    assert!(matches!(
        StoreConfig::from_file(&path),
        Err(HaystackError::Config { .. })
    ));
    assert!(matches!(
        StoreConfig::from_file(&dir.path().join("missing.toml")),
        Err(HaystackError::Config { .. })
    ));
}
