use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use nebula::config::NebulaConfig;
use nebula::layout::layout_rng;
use nebula::scene::{compute_targets, ItemPosition};
use nebula::similarity::{similarity_edges, SimilarityEdge};

#[derive(Serialize)]
struct LayoutOutput {
    positions: Vec<ItemPosition>,
    edges: Vec<SimilarityEdge>,
}

/// Compute layout targets (after density normalization) and similarity edges.
pub fn layout(config: &NebulaConfig, path: &Path) -> Result<()> {
    let items = super::read_items(path)?;
    let mut rng = layout_rng(config.layout.seed);
    let targets = compute_targets(&items, config, &mut rng);

    let positions = items
        .iter()
        .zip(targets)
        .map(|(item, position)| ItemPosition {
            id: item.id.clone(),
            position,
        })
        .collect();
    let edges = similarity_edges(&items, &config.similarity);

    super::print_json(&LayoutOutput { positions, edges })
}
