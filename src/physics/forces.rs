use std::f32::consts::TAU;

use super::grid::SpatialGrid;
use super::node::PhysicsNode;
use crate::config::PhysicsConfig;
use crate::items::{ItemLookup, Point2D};
use crate::similarity::jaccard;

/// Separations below this are treated as coincident.
pub(super) const MIN_SEPARATION: f32 = 1e-4;

/// Deterministic unit vector for coincident pairs; `separation_direction(a, b)`
/// is always the negation of `separation_direction(b, a)`.
pub(super) fn separation_direction(a: usize, b: usize) -> Point2D {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let angle = ((lo as f32) * 0.618_034 + (hi as f32) * 0.414_214 + 0.37) * TAU;
    let direction = Point2D::angled(angle);
    if a < b {
        direction
    } else {
        direction * -1.0
    }
}

/// Net force on the free node at `index` from its target and its grid neighbors.
pub(super) fn accumulate_node_force<L: ItemLookup + ?Sized>(
    index: usize,
    nodes: &[PhysicsNode],
    grid: &SpatialGrid<usize>,
    config: &PhysicsConfig,
    lookup: &L,
) -> Point2D {
    let node = &nodes[index];
    let mut force = (node.target - node.position) * config.target_strength;

    let own_collections = lookup.collections(&node.id).filter(|c| !c.is_empty());
    let own_tags = lookup.tags(&node.id).filter(|t| !t.is_empty());

    for &other_index in grid.neighbors(node.position) {
        if other_index == index {
            continue;
        }
        let other = &nodes[other_index];
        let delta = node.position - other.position;
        let distance = delta.length();

        if distance < config.repulsion_radius {
            let away = if distance > MIN_SEPARATION {
                delta / distance
            } else {
                separation_direction(index, other_index)
            };
            force += away * (config.repulsion_strength * (1.0 - distance / config.repulsion_radius));
        }

        // Attractions are direction-only; coincident pairs have no direction.
        if distance <= MIN_SEPARATION {
            continue;
        }
        let toward = delta / -distance;

        if config.collection_attraction > 0.0 {
            if let (Some(mine), Some(theirs)) = (own_collections, lookup.collections(&other.id)) {
                if mine.intersection(theirs).next().is_some() {
                    force += toward * config.collection_attraction;
                }
            }
        }

        if config.tag_attraction > 0.0 {
            if let (Some(mine), Some(theirs)) = (own_tags, lookup.tags(&other.id)) {
                let similarity = jaccard(mine, theirs);
                if similarity > 0.0 {
                    force += toward * (config.tag_attraction * similarity);
                }
            }
        }
    }

    force
}

/// Push apart one overlapping pair and bounce approaching velocities.
///
/// Returns `true` if the pair was overlapping and at least one side moved.
pub(super) fn resolve_collision(
    nodes: &mut [PhysicsNode],
    first: usize,
    second: usize,
    restitution: f32,
) -> bool {
    let (a, b) = (&nodes[first], &nodes[second]);
    let (share_a, share_b) = match (a.pinned, b.pinned) {
        (true, true) => return false,
        (false, false) => (0.5, 0.5),
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
    };

    let delta = a.position - b.position;
    let distance = delta.length();
    let min_distance = a.radius + b.radius;
    if distance >= min_distance {
        return false;
    }

    let normal = if distance > MIN_SEPARATION {
        delta / distance
    } else {
        separation_direction(first, second)
    };
    let overlap = min_distance - distance;

    let approach = (a.velocity - b.velocity).dot(normal);
    let impulse = if approach < 0.0 {
        -(1.0 + restitution) * approach
    } else {
        0.0
    };

    let a = &mut nodes[first];
    a.position += normal * (overlap * share_a);
    a.velocity += normal * (impulse * share_a);

    let b = &mut nodes[second];
    b.position -= normal * (overlap * share_b);
    b.velocity -= normal * (impulse * share_b);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Item, ItemIndex};

    fn grid_for(nodes: &[PhysicsNode], cell: f32) -> SpatialGrid<usize> {
        let mut grid = SpatialGrid::new(cell);
        grid.extend(nodes.iter().enumerate().map(|(i, n)| (i, n.position)));
        grid
    }

    #[test]
    fn separation_direction_is_antisymmetric() {
        let ab = separation_direction(3, 7);
        let ba = separation_direction(7, 3);
        assert!((ab + ba).length() < 1e-6);
        assert!((ab.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn target_spring_only_when_alone() {
        let nodes = vec![PhysicsNode::new("a", Point2D::new(10.0, 0.0)).with_position(Point2D::ORIGIN)];
        let config = PhysicsConfig::default();
        let force = accumulate_node_force(0, &nodes, &grid_for(&nodes, 10.0), &config, &ItemIndex::default());
        assert_eq!(force, Point2D::new(10.0 * config.target_strength, 0.0));
    }

    #[test]
    fn repulsion_falls_off_linearly() {
        let config = PhysicsConfig {
            target_strength: 0.0,
            ..PhysicsConfig::default()
        };
        let half = config.repulsion_radius / 2.0;
        let nodes = vec![
            PhysicsNode::new("a", Point2D::ORIGIN),
            PhysicsNode::new("b", Point2D::new(half, 0.0)),
        ];
        let force = accumulate_node_force(0, &nodes, &grid_for(&nodes, 10.0), &config, &ItemIndex::default());
        assert!((force.x + config.repulsion_strength * 0.5).abs() < 1e-4);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn attraction_is_constant_magnitude() {
        let config = PhysicsConfig {
            target_strength: 0.0,
            repulsion_strength: 0.0,
            ..PhysicsConfig::default()
        };
        let items = vec![
            Item::new("a").in_collection("c").with_tags(["x", "y"]),
            Item::new("b").in_collection("c").with_tags(["x"]),
        ];
        let index = ItemIndex::new(&items);
        for gap in [1.0, 6.0] {
            let nodes = vec![
                PhysicsNode::new("a", Point2D::ORIGIN),
                PhysicsNode::new("b", Point2D::new(gap, 0.0)),
            ];
            let force = accumulate_node_force(0, &nodes, &grid_for(&nodes, 10.0), &config, &index);
            let expected = config.collection_attraction + config.tag_attraction * 0.5;
            assert!((force.x - expected).abs() < 1e-5, "gap {gap}: {force:?}");
        }
    }

    #[test]
    fn collision_splits_correction() {
        let mut nodes = vec![
            PhysicsNode::new("a", Point2D::ORIGIN).with_radius(1.0),
            PhysicsNode::new("b", Point2D::new(1.0, 0.0)).with_radius(1.0),
        ];
        nodes[0].velocity = Point2D::new(2.0, 0.0);
        assert!(resolve_collision(&mut nodes, 0, 1, 0.0));
        assert!((nodes[0].position.x + 0.5).abs() < 1e-5);
        assert!((nodes[1].position.x - 1.5).abs() < 1e-5);
        // approaching velocity is cancelled along the normal
        assert!((nodes[0].velocity.x - 1.0).abs() < 1e-5);
        assert!((nodes[1].velocity.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn collision_bounce_reflects_restitution_share() {
        let mut nodes = vec![
            PhysicsNode::new("a", Point2D::ORIGIN).with_radius(1.0),
            PhysicsNode::new("b", Point2D::new(1.0, 0.0)).with_radius(1.0),
        ];
        nodes[0].velocity = Point2D::new(2.0, 0.0);
        let normal = Point2D::new(-1.0, 0.0);
        let approach = (nodes[0].velocity - nodes[1].velocity).dot(normal);

        assert!(resolve_collision(&mut nodes, 0, 1, 0.3));
        let separation = (nodes[0].velocity - nodes[1].velocity).dot(normal);
        assert!((separation + 0.3 * approach).abs() < 1e-5, "{separation} vs {approach}");
        assert!((nodes[0].velocity.x - 0.7).abs() < 1e-5);
        assert!((nodes[1].velocity.x - 1.3).abs() < 1e-5);

        // separating pairs are pushed apart without a bounce
        nodes[0].position = Point2D::ORIGIN;
        nodes[1].position = Point2D::new(1.0, 0.0);
        nodes[0].velocity = Point2D::new(-1.0, 0.0);
        nodes[1].velocity = Point2D::ORIGIN;
        assert!(resolve_collision(&mut nodes, 0, 1, 0.3));
        assert_eq!(nodes[0].velocity, Point2D::new(-1.0, 0.0));
        assert_eq!(nodes[1].velocity, Point2D::ORIGIN);
    }

    #[test]
    fn collision_moves_only_free_side() {
        let mut nodes = vec![
            PhysicsNode::new("a", Point2D::ORIGIN).with_radius(1.0),
            PhysicsNode::new("b", Point2D::new(1.0, 0.0)).with_radius(1.0),
        ];
        nodes[0].pinned = true;
        assert!(resolve_collision(&mut nodes, 0, 1, 0.3));
        assert_eq!(nodes[0].position, Point2D::ORIGIN);
        assert!((nodes[1].position.x - 2.0).abs() < 1e-5);

        nodes[1].pinned = true;
        nodes[1].position = Point2D::new(0.5, 0.0);
        assert!(!resolve_collision(&mut nodes, 0, 1, 0.3));
        assert_eq!(nodes[1].position, Point2D::new(0.5, 0.0));
    }
}
