//! Similarity functions for vector search.
//!
//! All scores are normalized to "higher = more similar". Vectors are used
//! as-is; nothing is normalized implicitly. Cosine takes precomputed norms
//! so a search computes the query norm once and each stored norm never.

use haystack_core::DistanceMetric;

/// Score a candidate against a query.
///
/// `query_norm` and `candidate_norm` are only read for cosine.
#[inline]
pub fn score(
    metric: DistanceMetric,
    query: &[f32],
    query_norm: f64,
    candidate: &[f32],
    candidate_norm: f64,
) -> f32 {
    debug_assert_eq!(
        query.len(),
        candidate.len(),
        "Dimension mismatch in similarity computation"
    );

    match metric {
        DistanceMetric::Cosine => cosine(query, query_norm, candidate, candidate_norm),
        DistanceMetric::Euclidean => -squared_euclidean(query, candidate),
        DistanceMetric::DotProduct => dot_product(query, candidate),
    }
}

/// Cosine similarity from precomputed norms, in [-1, 1]
///
/// Accumulated in f64: products of two f32 are exact there, so a vector
/// compared with itself lands within a few f64 ulps of 1 and rounds to
/// exactly 1.0 in f32. Parallel copies can then only tie with it.
#[inline]
pub fn cosine(query: &[f32], query_norm: f64, candidate: &[f32], candidate_norm: f64) -> f32 {
    if query_norm == 0.0 || candidate_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .zip(candidate.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();
    (dot / (query_norm * candidate_norm)).clamp(-1.0, 1.0) as f32
}

/// Compute similarity between two vectors, deriving norms on the fly.
pub fn compute_similarity(a: &[f32], b: &[f32], metric: DistanceMetric) -> f32 {
    score(metric, a, l2_norm(a), b, l2_norm(b))
}

/// Dot product (inner product)
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm (Euclidean length), accumulated in f64
#[inline]
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Squared Euclidean distance
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
