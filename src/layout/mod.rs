//! Initial placement of items.
//!
//! Items are grouped by primary collection and the groups are laid out on a
//! golden-angle spiral around the origin. Members of a group are relaxed by a
//! short local simulation driven by tag and embedding similarity (see
//! [`cluster`]). Items with no primary collection share the innermost slot.
//!
//! Slots and randomness are keyed by collection id, so adding, removing or
//! reordering items in one group leaves every other group where it was.
//!
//! The output of a layout pass is typically fed through
//! [`density::normalize_density`] before becoming physics targets.

mod cluster;
pub mod density;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::config::{LayoutConfig, ReductionConfig};
use crate::items::{Item, Point2D};
use crate::reduction::{place_new_point_with_k, reduce_to_plane_with};
pub use density::{normalize_density, normalize_density_with};

/// Random source for a layout pass: seeded when `seed` is set, otherwise fresh entropy.
pub fn layout_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Center of the spiral slot at `index`.
pub fn spiral_center(index: usize, config: &LayoutConfig) -> Point2D {
    let radius = config.base_radius + (index as f32).sqrt() * config.radius_growth;
    if index == 0 && radius == 0.0 {
        return Point2D::ORIGIN;
    }
    Point2D::angled(index as f32 * config.golden_angle) * radius
}

/// Spiral slot reserved for items without a primary collection, present or not.
pub const UNCOLLECTED_SLOT: usize = 0;

struct Group<'a> {
    collection: Option<&'a str>,
    slot: usize,
    members: Vec<usize>,
}

impl Group<'_> {
    /// Per-group random source derived from the pass seed and the group key.
    fn rng(&self, base: u64) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.collection.hash(&mut hasher);
        StdRng::seed_from_u64(base ^ hasher.finish())
    }
}

/// Group item indices by primary collection.
///
/// The uncollected group, when present, comes first on [`UNCOLLECTED_SLOT`];
/// collections follow in id order on slots 1, 2, ...
fn group_by_collection(items: &[Item]) -> Vec<Group<'_>> {
    let mut uncollected = Vec::new();
    let mut collections: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        match item.primary_collection() {
            None => uncollected.push(index),
            Some(collection) => collections.entry(collection).or_default().push(index),
        }
    }

    let mut groups = Vec::with_capacity(collections.len() + 1);
    if !uncollected.is_empty() {
        groups.push(Group {
            collection: None,
            slot: UNCOLLECTED_SLOT,
            members: uncollected,
        });
    }
    groups.extend(
        collections
            .into_iter()
            .enumerate()
            .map(|(rank, (collection, members))| Group {
                collection: Some(collection),
                slot: UNCOLLECTED_SLOT + 1 + rank,
                members,
            }),
    );
    groups
}

/// Lay out items with default configuration and a fresh random source.
pub fn layout_items(items: &[Item]) -> Vec<Point2D> {
    let config = LayoutConfig::default();
    layout_items_with(items, &config, &mut layout_rng(config.seed))
}

/// Collection-spiral layout. One position per item, in input order.
pub fn layout_items_with<R: Rng>(items: &[Item], config: &LayoutConfig, rng: &mut R) -> Vec<Point2D> {
    let mut positions = vec![Point2D::ORIGIN; items.len()];
    let groups = group_by_collection(items);
    let base: u64 = rng.gen();

    for group in &groups {
        let center = spiral_center(group.slot, config);
        let mut group_rng = group.rng(base);
        if group.collection.is_none() {
            if let [only] = group.members.as_slice() {
                positions[*only] = center;
            } else {
                for &index in &group.members {
                    positions[index] =
                        cluster::jittered(center, config.uncollected_jitter, &mut group_rng);
                }
            }
            continue;
        }

        let members: Vec<&Item> = group.members.iter().map(|&i| &items[i]).collect();
        let placed = cluster::settle_cluster(&members, center, config, &mut group_rng);
        for (&index, position) in group.members.iter().zip(placed) {
            positions[index] = position;
        }
    }

    tracing::debug!(items = items.len(), groups = groups.len(), "layout computed");
    positions
}

/// Embedding-driven layout.
///
/// Items with an explicit `position` keep it. Unpositioned items with an
/// embedding are placed next to their nearest positioned neighbors when any
/// exist, otherwise the whole unpositioned set is projected to the plane.
/// Everything else gets its collection-layout position.
pub fn embedding_layout_with<R: Rng>(
    items: &[Item],
    layout: &LayoutConfig,
    reduction: &ReductionConfig,
    rng: &mut R,
) -> Vec<Point2D> {
    let mut positions = layout_items_with(items, layout, rng);

    let mut anchor_embeddings: Vec<&[f32]> = Vec::new();
    let mut anchor_points = Vec::new();
    let mut pending: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match item.position.filter(Point2D::is_finite) {
            Some(position) => {
                positions[index] = position;
                if let Some(embedding) = item.embedding() {
                    anchor_embeddings.push(embedding);
                    anchor_points.push(position);
                }
            }
            None if item.embedding().is_some() => pending.push(index),
            None => {}
        }
    }

    if pending.is_empty() {
        return positions;
    }

    if anchor_embeddings.is_empty() {
        let embeddings: Vec<&[f32]> = pending.iter().filter_map(|&i| items[i].embedding()).collect();
        let projected = reduce_to_plane_with(&embeddings, reduction, rng);
        for (&index, point) in pending.iter().zip(projected) {
            positions[index] = point;
        }
        tracing::debug!(projected = pending.len(), "embedding layout via projection");
    } else {
        for &index in &pending {
            if let Some(embedding) = items[index].embedding() {
                positions[index] =
                    place_new_point_with_k(embedding, &anchor_embeddings, &anchor_points, reduction.neighbors);
            }
        }
        tracing::debug!(
            placed = pending.len(),
            anchors = anchor_points.len(),
            "embedding layout via nearest anchors"
        );
    }
    positions
}
