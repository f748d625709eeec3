//! Test utilities for the store comprehensive tests
//!
//! Provides common helpers for:
//! - Tracing setup
//! - Tag and vector construction
//! - Seeded random datasets
//! - A reference (exhaustive, single-threaded) filtered ranking

use haystack::{DistanceMetric, Haystack, Predicate, StoreConfig, Tag, VectorId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Install a test-friendly tracing subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Build a tag sequence from pairs
pub fn tags(pairs: &[(&str, &str)]) -> Vec<Tag> {
    pairs.iter().map(|&(k, v)| Tag::new(k, v)).collect()
}

/// The three-vector store used across tiers:
/// `[1,0]` {k=c, g=A}, `[0,1]` {k=c, g=A}, `[-1,0]` {k=c, g=B}
pub fn scenario_store() -> Haystack {
    init_tracing();
    let store = Haystack::new("test");
    store
        .add_vector(&[1.0, 0.0], tags(&[("k", "c"), ("g", "A")]))
        .unwrap();
    store
        .add_vector(&[0.0, 1.0], tags(&[("k", "c"), ("g", "A")]))
        .unwrap();
    store
        .add_vector(&[-1.0, 0.0], tags(&[("k", "c"), ("g", "B")]))
        .unwrap();
    store
}

/// Store with an explicit metric
pub fn store_with_metric(metric: DistanceMetric) -> Haystack {
    init_tracing();
    Haystack::with_config("test", StoreConfig::default().with_metric(metric)).unwrap()
}

/// Seeded random vectors with components in [-1, 1)
pub fn random_vectors(seed: u64, count: usize, dimension: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Seeded tag sequences drawn from a small vocabulary so filters hit
pub fn random_tags(seed: u64, count: usize) -> Vec<Vec<Tag>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let n = rng.gen_range(0..4);
            let mut t: Vec<Tag> = (0..n)
                .map(|_| {
                    Tag::new(
                        format!("k{}", rng.gen_range(0..3)),
                        format!("v{}", rng.gen_range(0..4)),
                    )
                })
                .collect();
            t.push(Tag::new("text", format!("chunk {}", i)));
            t
        })
        .collect()
}

/// Score exactly as the store defines it
///
/// Cosine is accumulated in f64 and clamped to [-1, 1].
pub fn reference_score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => {
            let wide = |x: &[f32], y: &[f32]| -> f64 {
                x.iter().zip(y).map(|(&p, &q)| f64::from(p) * f64::from(q)).sum()
            };
            let na = wide(a, a).sqrt();
            let nb = wide(b, b).sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                (wide(a, b) / (na * nb)).clamp(-1.0, 1.0) as f32
            }
        }
        DistanceMetric::Euclidean => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>(),
        DistanceMetric::DotProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
    }
}

/// Exhaustive filtered ranking: evaluate, score, full sort, truncate
pub fn reference_search(
    metric: DistanceMetric,
    vectors: &[Vec<f32>],
    tags: &[Vec<Tag>],
    query: &[f32],
    predicate: &Predicate,
    k: usize,
) -> Vec<VectorId> {
    let mut scored: Vec<(u64, f32)> = vectors
        .iter()
        .zip(tags)
        .enumerate()
        .filter(|(_, (_, t))| predicate.evaluate(t))
        .map(|(i, (v, _))| (i as u64, reference_score(metric, query, v)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().take(k).map(|(i, _)| VectorId::new(i)).collect()
}

/// Ids of a search result
pub fn ids(matches: &[haystack::QueryMatch]) -> Vec<VectorId> {
    matches.iter().map(|m| m.id).collect()
}
