#![allow(dead_code)]

use nebula::config::NebulaConfig;
use nebula::items::{Item, EMBEDDING_DIM};

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed % EMBEDDING_DIM] = 1.0;
    v
}

/// Generate an embedding similar to `base` with small perturbation.
/// The result will have high cosine similarity to `base`.
pub fn similar_embedding(base: &[f32]) -> Vec<f32> {
    let mut v = base.to_vec();
    for i in 0..5 {
        v[(i * 37) % EMBEDDING_DIM] += 0.05;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// An item in `collection` whose embedding spikes at `seed`.
pub fn collected_item(id: &str, collection: &str, seed: usize) -> Item {
    Item::new(id)
        .in_collection(collection)
        .with_embedding(test_embedding(seed))
}

/// `per_collection` items in each of `collections` collections, ids `c{i}-{j}`.
pub fn clustered_items(collections: usize, per_collection: usize) -> Vec<Item> {
    (0..collections)
        .flat_map(|c| {
            (0..per_collection).map(move |j| {
                Item::new(format!("c{c}-{j}"))
                    .in_collection(format!("col{c}"))
                    .with_tags([format!("topic{c}"), format!("note{j}")])
                    .with_embedding(test_embedding(c * 10 + j))
            })
        })
        .collect()
}

/// Default config with a fixed layout seed.
pub fn seeded_config(seed: u64) -> NebulaConfig {
    let mut config = NebulaConfig::default();
    config.layout.seed = Some(seed);
    config
}
