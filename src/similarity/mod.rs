//! Pairwise item similarity.
//!
//! Four independent signals, each in `[0, 1]` with 0 meaning "no signal":
//! tag overlap (Jaccard), collection co-membership, temporal proximity and
//! color distance. [`compute_similarity`] combines them with
//! [`SimilarityWeights`]. Embedding cosine similarity is a fifth signal used by
//! the layout generator rather than the weighted score.
//!
//! Everything here is pure and deterministic.

pub mod edges;

use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

pub use crate::config::SimilarityWeights;
use crate::items::Item;
pub use edges::{similarity_edges, SimilarityEdge};

/// Default separation, in days, at which date similarity reaches 0.
pub const DATE_WINDOW_DAYS: f32 = 30.0;

/// Largest possible Euclidean distance between two RGB colors, `sqrt(3 * 255^2)`.
pub const MAX_COLOR_DISTANCE: f32 = 441.672_96;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Per-signal scores for one pair, plus the weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    pub tag: f32,
    pub collection: f32,
    pub date: f32,
    pub color: f32,
    pub embedding: f32,
    pub score: f32,
}

/// Jaccard index `|A ∩ B| / |A ∪ B|`; 0 if either set is empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Jaccard similarity of the two items' case-normalized tag sets.
pub fn tag_similarity(a: &Item, b: &Item) -> f32 {
    jaccard(&a.normalized_tags(), &b.normalized_tags())
}

/// 1 if the combined collection sets intersect at all, else 0.
pub fn collection_similarity(a: &Item, b: &Item) -> f32 {
    let a_collections = a.all_collections();
    let b_collections = b.all_collections();
    if a_collections.is_empty() || b_collections.is_empty() {
        return 0.0;
    }
    if a_collections.intersection(&b_collections).next().is_some() {
        1.0
    } else {
        0.0
    }
}

/// Linear decay from 1 at the same instant to 0 at a 30-day separation.
pub fn date_similarity(a: &Item, b: &Item) -> f32 {
    date_similarity_within(a, b, DATE_WINDOW_DAYS)
}

/// Date similarity with a custom decay window.
pub fn date_similarity_within(a: &Item, b: &Item, window_days: f32) -> f32 {
    let (Some(a_time), Some(b_time)) = (a.created_timestamp(), b.created_timestamp()) else {
        return 0.0;
    };
    if !(window_days.is_finite() && window_days > 0.0) {
        return 0.0;
    }
    let separation_days =
        (a_time - b_time).num_milliseconds().unsigned_abs() as f64 / MILLIS_PER_DAY;
    (1.0 - separation_days / window_days as f64).clamp(0.0, 1.0) as f32
}

/// `1 - distance / MAX_COLOR_DISTANCE`; 0 if either color is missing.
pub fn color_similarity(a: &Item, b: &Item) -> f32 {
    match (a.average_color, b.average_color) {
        (Some(ca), Some(cb)) => (1.0 - ca.distance(&cb) / MAX_COLOR_DISTANCE).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Returns 0 for empty, zero-norm, or differently sized vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }

    let cosine = dot / (norm_a * norm_b);
    if cosine.is_finite() {
        cosine.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Embedding cosine similarity clamped to `[0, 1]`; anti-correlated pairs score 0.
pub fn embedding_similarity(a: &Item, b: &Item) -> f32 {
    match (a.embedding(), b.embedding()) {
        (Some(ea), Some(eb)) => cosine_similarity(ea, eb).max(0.0),
        _ => 0.0,
    }
}

/// Weighted combination of the four item signals.
///
/// Negative or NaN weights count as 0. The result is not normalized.
pub fn compute_similarity(a: &Item, b: &Item, weights: &SimilarityWeights) -> f32 {
    score_within(a, b, weights, DATE_WINDOW_DAYS)
}

/// [`compute_similarity`] with a custom date decay window.
pub fn score_within(a: &Item, b: &Item, weights: &SimilarityWeights, date_window_days: f32) -> f32 {
    weighted(
        tag_similarity(a, b),
        collection_similarity(a, b),
        date_similarity_within(a, b, date_window_days),
        color_similarity(a, b),
        weights,
    )
}

/// Every signal for one pair, with the weighted score.
pub fn breakdown(a: &Item, b: &Item, weights: &SimilarityWeights) -> SimilarityBreakdown {
    breakdown_within(a, b, weights, DATE_WINDOW_DAYS)
}

/// [`breakdown`] with a custom date decay window.
pub fn breakdown_within(
    a: &Item,
    b: &Item,
    weights: &SimilarityWeights,
    date_window_days: f32,
) -> SimilarityBreakdown {
    let tag = tag_similarity(a, b);
    let collection = collection_similarity(a, b);
    let date = date_similarity_within(a, b, date_window_days);
    let color = color_similarity(a, b);

    SimilarityBreakdown {
        tag,
        collection,
        date,
        color,
        embedding: embedding_similarity(a, b),
        score: weighted(tag, collection, date, color, weights),
    }
}

fn weighted(tag: f32, collection: f32, date: f32, color: f32, weights: &SimilarityWeights) -> f32 {
    tag * sanitize_weight(weights.tag)
        + collection * sanitize_weight(weights.collection)
        + date * sanitize_weight(weights.date)
        + color * sanitize_weight(weights.color)
}

fn sanitize_weight(weight: f32) -> f32 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
