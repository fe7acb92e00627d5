mod helpers;

use helpers::{clustered_items, collected_item, seeded_config};
use nebula::config::PhysicsConfigUpdate;
use nebula::error::NebulaError;
use nebula::items::{Item, Point2D};
use nebula::scene::{Scene, SceneUpdate};

fn position_of(scene: &Scene, id: &str) -> Point2D {
    scene.simulation().get_node(id).unwrap().position
}

fn target_of(scene: &Scene, id: &str) -> Point2D {
    scene.simulation().get_node(id).unwrap().target
}

#[test]
fn nodes_start_on_their_targets() {
    let mut scene = Scene::new(seeded_config(1));
    let update = scene.update_items(clustered_items(3, 4)).unwrap();
    assert_eq!(update, SceneUpdate { added: 12, updated: 0, removed: 0 });

    for node in scene.simulation().nodes() {
        assert_eq!(node.position, node.target);
        assert_eq!(node.radius, scene.config().physics.default_radius);
    }
    assert_eq!(scene.positions(), scene.targets());
}

#[test]
fn simulation_keeps_nodes_near_targets() {
    let mut scene = Scene::new(seeded_config(2));
    scene.update_items(clustered_items(4, 6)).unwrap();
    for _ in 0..300 {
        scene.tick();
    }
    for node in scene.simulation().nodes() {
        assert!(node.position.is_finite());
        assert!(
            node.position.distance(node.target) < 10.0,
            "{} drifted {}",
            node.id,
            node.position.distance(node.target)
        );
    }
}

#[test]
fn updates_move_targets_in_place() {
    let mut scene = Scene::new(seeded_config(3));
    scene
        .update_items(vec![collected_item("a", "x", 1), collected_item("b", "x", 2)])
        .unwrap();
    scene.settle(600);
    let before = position_of(&scene, "a");

    let update = scene
        .update_items(vec![
            collected_item("a", "x", 1),
            collected_item("b", "x", 2),
            collected_item("c", "y", 3),
            Item::new("d"),
        ])
        .unwrap();
    assert_eq!(update, SceneUpdate { added: 2, updated: 2, removed: 0 });
    // the existing node keeps its position; only its target moved
    assert_eq!(position_of(&scene, "a"), before);
    assert_eq!(position_of(&scene, "c"), target_of(&scene, "c"));
}

#[test]
fn removed_items_lose_their_nodes_immediately() {
    let mut scene = Scene::new(seeded_config(4));
    scene.update_items(clustered_items(2, 3)).unwrap();
    let update = scene.update_items(clustered_items(1, 3)).unwrap();
    assert_eq!(update.removed, 3);
    assert_eq!(scene.simulation().len(), 3);
    assert!(scene.simulation().get_node("c1-0").is_none());
}

#[test]
fn drag_cycle() {
    let mut scene = Scene::new(seeded_config(5));
    scene.update_items(clustered_items(2, 3)).unwrap();
    let target = target_of(&scene, "c0-1");
    let grabbed = Point2D::new(200.0, -150.0);

    scene.drag_start("c0-1").unwrap();
    scene.drag_to("c0-1", grabbed).unwrap();
    for _ in 0..10 {
        scene.tick();
    }
    assert_eq!(position_of(&scene, "c0-1"), grabbed);

    scene.drag_end("c0-1").unwrap();
    for _ in 0..600 {
        scene.tick();
    }
    assert!(position_of(&scene, "c0-1").distance(target) < 10.0);
}

#[test]
fn dragging_unknown_items_is_an_error() {
    let mut scene = Scene::new(seeded_config(6));
    assert_eq!(scene.drag_start("ghost"), Err(NebulaError::UnknownNode("ghost".into())));
    assert!(scene.drag_to("ghost", Point2D::ORIGIN).is_err());
    assert!(scene.drag_end("ghost").is_err());
}

#[test]
fn invalid_physics_updates_are_rejected() {
    let mut scene = Scene::new(seeded_config(7));
    let bad = PhysicsConfigUpdate {
        time_step: Some(-1.0),
        ..Default::default()
    };
    assert!(matches!(scene.set_physics(&bad), Err(NebulaError::InvalidConfig(_))));
    assert!(scene.config().physics.time_step > 0.0);

    let good = PhysicsConfigUpdate {
        restitution: Some(0.9),
        ..Default::default()
    };
    scene.set_physics(&good).unwrap();
    assert_eq!(scene.config().physics.restitution, 0.9);
    assert_eq!(scene.simulation().config().restitution, 0.9);
}

#[test]
fn edges_reflect_the_current_snapshot() {
    let mut scene = Scene::new(seeded_config(8));
    scene.update_items(clustered_items(2, 2)).unwrap();
    let edges = scene.edges();
    // only same-collection pairs clear the default threshold
    assert_eq!(edges.len(), 2);
    for edge in edges {
        assert_eq!(edge.source[..2], edge.target[..2]);
    }
}

#[test]
fn resubmitting_a_snapshot_keeps_targets() {
    let mut scene = Scene::new(seeded_config(1));
    scene.update_items(clustered_items(3, 4)).unwrap();
    let first = scene.targets();
    for _ in 0..30 {
        scene.tick();
    }

    let update = scene.update_items(clustered_items(3, 4)).unwrap();
    assert_eq!(update, SceneUpdate { added: 0, updated: 12, removed: 0 });
    assert_eq!(scene.targets(), first);
}

#[test]
fn new_loose_item_leaves_collection_targets_alone() {
    let mut config = seeded_config(1);
    config.density.enabled = false;
    let mut scene = Scene::new(config);
    let mut items = clustered_items(3, 4);
    scene.update_items(items.clone()).unwrap();
    let before = scene.targets();

    items.push(Item::new("loose"));
    scene.update_items(items).unwrap();
    let after = scene.targets();
    assert_eq!(before[..], after[..before.len()]);
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut scene = Scene::new(seeded_config(9));
    let mut items = clustered_items(1, 2);
    items.push(Item::new("c0-1"));
    assert!(matches!(scene.update_items(items), Err(NebulaError::InvalidItems(_))));
    assert!(scene.simulation().is_empty());
}
