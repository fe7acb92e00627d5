use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

use nebula::items::{Item, Rgb, EMBEDDING_DIM};
use nebula::layout::layout_rng;

const TAGS: &[&str] = &[
    "design", "rust", "travel", "recipe", "music", "physics", "garden", "film", "notes", "ideas",
    "architecture", "poetry",
];

/// Emit `count` synthetic items spread over `collections` collections.
///
/// Items in the same collection get embeddings that share a spike and a
/// similar color, so layouts have structure to find.
pub fn generate(count: usize, collections: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = layout_rng(seed);
    let collection_ids: Vec<String> = (0..collections)
        .map(|_| uuid::Uuid::now_v7().to_string())
        .collect();
    let palette: Vec<Rgb> = (0..collections.max(1))
        .map(|_| Rgb(rng.gen(), rng.gen(), rng.gen()))
        .collect();
    let now = chrono::Utc::now();

    let items: Vec<Item> = (0..count)
        .map(|i| {
            let group = (collections > 0).then(|| i % collections);
            let tag_count = rng.gen_range(1..=3);
            let mut item = Item::new(uuid::Uuid::now_v7().to_string())
                .with_tags(TAGS.choose_multiple(&mut rng, tag_count).copied())
                .with_embedding(synthetic_embedding(group.unwrap_or(i), &mut rng))
                .with_color(jitter_color(palette[group.unwrap_or(0)], &mut rng))
                .created((now - chrono::Duration::days(rng.gen_range(0..90))).to_rfc3339());
            if let Some(group) = group {
                item = item.in_collection(collection_ids[group].clone());
                if collections > 1 && rng.gen_bool(0.1) {
                    item = item.also_in(collection_ids[(group + 1) % collections].clone());
                }
            }
            item
        })
        .collect();

    tracing::info!(count, collections, "generated synthetic items");
    super::print_json(&items)
}

/// Unit-ish vector with a spike at a group-specific dimension plus noise.
fn synthetic_embedding<R: Rng>(group: usize, rng: &mut R) -> Vec<f32> {
    let mut v: Vec<f32> = (0..EMBEDDING_DIM).map(|_| rng.gen_range(-0.05..0.05)).collect();
    v[group % EMBEDDING_DIM] += 1.0;
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter_mut().for_each(|x| *x /= norm);
    v
}

fn jitter_color<R: Rng>(base: Rgb, rng: &mut R) -> Rgb {
    let mut channel = |c: u8| (c as i16 + rng.gen_range(-20..=20)).clamp(0, 255) as u8;
    Rgb(channel(base.0), channel(base.1), channel(base.2))
}
