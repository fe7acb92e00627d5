use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use nebula::config::NebulaConfig;
use nebula::items::{Point2D, Point3D};
use nebula::layout::layout_rng;
use nebula::reduction::{reduce_to_plane_with, reduce_to_space_with};

#[derive(Serialize)]
#[serde(untagged)]
enum Projected {
    Plane(Point2D),
    Space(Point3D),
}

#[derive(Serialize)]
struct ProjectedItem {
    id: String,
    #[serde(flatten)]
    point: Projected,
}

/// Project every item that carries an embedding to 2D (or 3D).
pub fn project(config: &NebulaConfig, path: &Path, three_d: bool) -> Result<()> {
    let items = super::read_items(path)?;
    let embedded: Vec<_> = items
        .iter()
        .filter_map(|item| item.embedding().map(|e| (item.id.as_str(), e)))
        .collect();
    let skipped = items.len() - embedded.len();
    if skipped > 0 {
        tracing::info!(skipped, "items without embeddings left out of projection");
    }

    let embeddings: Vec<&[f32]> = embedded.iter().map(|(_, e)| *e).collect();
    let mut rng = layout_rng(config.layout.seed);
    let points: Vec<Projected> = if three_d {
        reduce_to_space_with(&embeddings, &config.reduction, &mut rng)
            .into_iter()
            .map(Projected::Space)
            .collect()
    } else {
        reduce_to_plane_with(&embeddings, &config.reduction, &mut rng)
            .into_iter()
            .map(Projected::Plane)
            .collect()
    };

    let output: Vec<ProjectedItem> = embedded
        .iter()
        .zip(points)
        .map(|((id, _), point)| ProjectedItem {
            id: id.to_string(),
            point,
        })
        .collect();
    super::print_json(&output)
}
