//! Orchestration of the full pipeline: items → layout → density → physics.
//!
//! A [`Scene`] owns the current item snapshot and the simulation. Each call
//! to [`Scene::update_items`] recomputes every target and syncs the node set:
//! new items get nodes, known items get their target moved in place, and
//! items that disappeared lose their node immediately.
//!
//! Every layout pass starts from the same seed, so an unchanged snapshot
//! always produces the same targets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;

use crate::config::{LayoutMode, NebulaConfig, PhysicsConfigUpdate};
use crate::error::Result;
use crate::items::{check_ids, Item, ItemIndex, Point2D};
use crate::layout::{embedding_layout_with, layout_items_with, layout_rng, normalize_density_with};
use crate::physics::{PhysicsNode, Simulation};
use crate::similarity::{similarity_edges, SimilarityEdge};

/// Counts from one [`Scene::update_items`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SceneUpdate {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// One item's coordinate, for serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPosition {
    pub id: String,
    #[serde(flatten)]
    pub position: Point2D,
}

/// Target positions for `items` under `config`, one per item in input order.
pub fn compute_targets<R: Rng>(items: &[Item], config: &NebulaConfig, rng: &mut R) -> Vec<Point2D> {
    let raw = match config.layout.mode {
        LayoutMode::Collections => layout_items_with(items, &config.layout, rng),
        LayoutMode::Embedding => embedding_layout_with(items, &config.layout, &config.reduction, rng),
    };
    if config.density.enabled {
        normalize_density_with(&raw, config.density.radius, config.density.compression_factor)
    } else {
        raw
    }
}

pub struct Scene {
    config: NebulaConfig,
    items: Vec<Item>,
    index: ItemIndex,
    simulation: Simulation,
    layout_seed: u64,
}

impl Scene {
    pub fn new(config: NebulaConfig) -> Self {
        let simulation = Simulation::new(config.physics.clone());
        let layout_seed = config
            .layout
            .seed
            .unwrap_or_else(|| layout_rng(None).gen());
        Self {
            config,
            items: Vec::new(),
            index: ItemIndex::default(),
            simulation,
            layout_seed,
        }
    }

    pub fn config(&self) -> &NebulaConfig {
        &self.config
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Replace the item snapshot and resync nodes against fresh targets.
    ///
    /// A snapshot with an empty or repeated id is rejected and the scene is
    /// left untouched.
    pub fn update_items(&mut self, items: Vec<Item>) -> Result<SceneUpdate> {
        check_ids(&items)?;
        let mut rng = StdRng::seed_from_u64(self.layout_seed);
        let targets = compute_targets(&items, &self.config, &mut rng);

        let visible: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let removed = self.simulation.retain(|id| visible.contains(id));

        let physics = &self.config.physics;
        let mut update = SceneUpdate {
            removed,
            ..SceneUpdate::default()
        };
        for (item, target) in items.iter().zip(targets) {
            if self.simulation.get_node(&item.id).is_some() {
                update.updated += 1;
            } else {
                update.added += 1;
            }
            self.simulation.upsert_node(
                PhysicsNode::new(item.id.clone(), target)
                    .with_radius(physics.default_radius)
                    .with_mass(physics.default_mass),
            );
        }

        self.index = ItemIndex::new(&items);
        self.items = items;
        tracing::info!(
            added = update.added,
            updated = update.updated,
            removed = update.removed,
            "scene updated"
        );
        Ok(update)
    }

    pub fn tick(&mut self) {
        self.simulation.tick(&self.index);
    }

    /// Tick until every node is at rest or `max_ticks` elapse; returns ticks run.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        for ticks in 0..max_ticks {
            if self.simulation.is_settled() {
                return ticks;
            }
            self.tick();
        }
        max_ticks
    }

    pub fn drag_start(&mut self, id: &str) -> Result<()> {
        self.simulation.pin(id)
    }

    pub fn drag_to(&mut self, id: &str, position: Point2D) -> Result<()> {
        self.simulation.move_node(id, position)
    }

    pub fn drag_end(&mut self, id: &str) -> Result<()> {
        self.simulation.unpin(id)
    }

    /// Apply a partial physics update to both the config and the live simulation.
    pub fn set_physics(&mut self, update: &PhysicsConfigUpdate) -> Result<()> {
        self.simulation.set_config(update)?;
        self.config.physics = self.simulation.config().clone();
        Ok(())
    }

    /// Similarity-weighted edges over the current snapshot.
    pub fn edges(&self) -> Vec<SimilarityEdge> {
        similarity_edges(&self.items, &self.config.similarity)
    }

    /// Current node positions, in item order.
    pub fn positions(&self) -> Vec<ItemPosition> {
        self.collect(|node| node.position)
    }

    /// Current layout targets, in item order.
    pub fn targets(&self) -> Vec<ItemPosition> {
        self.collect(|node| node.target)
    }

    fn collect(&self, pick: impl Fn(&PhysicsNode) -> Point2D) -> Vec<ItemPosition> {
        self.items
            .iter()
            .filter_map(|item| self.simulation.get_node(&item.id))
            .map(|node| ItemPosition {
                id: node.id.clone(),
                position: pick(node),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::spiral_center;

    fn seeded_config() -> NebulaConfig {
        let mut config = NebulaConfig::default();
        config.layout.seed = Some(11);
        config
    }

    #[test]
    fn update_tracks_lifecycle() {
        let mut scene = Scene::new(seeded_config());
        let first = scene
            .update_items(vec![Item::new("a"), Item::new("b").in_collection("c")])
            .unwrap();
        assert_eq!(first, SceneUpdate { added: 2, updated: 0, removed: 0 });

        let second = scene
            .update_items(vec![Item::new("b").in_collection("c"), Item::new("z")])
            .unwrap();
        assert_eq!(second, SceneUpdate { added: 1, updated: 1, removed: 1 });
        assert!(scene.simulation().get_node("a").is_none());
        assert_eq!(scene.simulation().len(), 2);
    }

    #[test]
    fn positions_follow_item_order() {
        let mut scene = Scene::new(seeded_config());
        scene
            .update_items(vec![Item::new("q"), Item::new("p").in_collection("x")])
            .unwrap();
        let ids: Vec<String> = scene.positions().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["q", "p"]);
    }

    #[test]
    fn density_disabled_keeps_raw_layout() {
        let mut config = seeded_config();
        config.density.enabled = false;
        let items = vec![Item::new("a").in_collection("c")];
        let targets = compute_targets(&items, &config, &mut layout_rng(Some(1)));
        assert_eq!(targets, vec![spiral_center(1, &config.layout)]);
    }

    #[test]
    fn unseeded_scene_reuses_its_seed() {
        let mut scene = Scene::new(NebulaConfig::default());
        let items: Vec<Item> = (0..5)
            .map(|i| Item::new(format!("n{i}")).in_collection("c"))
            .collect();
        scene.update_items(items.clone()).unwrap();
        let first = scene.targets();
        scene.update_items(items).unwrap();
        assert_eq!(scene.targets(), first);
    }

    #[test]
    fn duplicate_ids_leave_scene_untouched() {
        let mut scene = Scene::new(seeded_config());
        scene.update_items(vec![Item::new("a")]).unwrap();

        let err = scene
            .update_items(vec![Item::new("b"), Item::new("b").in_collection("c")])
            .unwrap_err();
        assert!(matches!(err, crate::error::NebulaError::InvalidItems(_)));
        assert_eq!(scene.items().len(), 1);
        assert!(scene.simulation().get_node("a").is_some());
        assert!(scene.simulation().get_node("b").is_none());
    }

    #[test]
    fn item_position_serializes_flat() {
        let value = serde_json::to_value(ItemPosition {
            id: "a".into(),
            position: Point2D::new(1.0, 2.0),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"id": "a", "x": 1.0, "y": 2.0}));
    }
}
