//! Similarity-weighted edges between items, for the collaborator to draw.

use serde::Serialize;
use std::cmp::Ordering;

use super::score_within;
use crate::config::SimilarityConfig;
use crate::items::Item;

/// An undirected relationship between two items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEdge {
    pub source: String,
    pub target: String,
    pub weight: f32,
}

/// All pairs whose combined score reaches `config.edge_threshold`,
/// strongest first. Ties keep input order.
pub fn similarity_edges(items: &[Item], config: &SimilarityConfig) -> Vec<SimilarityEdge> {
    let threshold = if config.edge_threshold.is_finite() {
        config.edge_threshold
    } else {
        0.0
    };

    let mut edges = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            let weight = score_within(a, b, &config.weights, config.date_window_days);
            if weight > 0.0 && weight >= threshold {
                edges.push(SimilarityEdge {
                    source: a.id.clone(),
                    target: b.id.clone(),
                    weight,
                });
            }
        }
    }

    edges.sort_by(|x, y| y.weight.partial_cmp(&x.weight).unwrap_or(Ordering::Equal));
    tracing::debug!(items = items.len(), edges = edges.len(), threshold, "similarity edges built");
    edges
}
