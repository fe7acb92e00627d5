//! Local relaxation of one collection's members around its spiral center.

use rand::Rng;

use crate::config::LayoutConfig;
use crate::items::{Item, Point2D};
use crate::similarity::{embedding_similarity, tag_similarity};

/// Floor on the distance used by the inverse-square repulsion.
const MIN_REPULSION_DISTANCE: f32 = 0.5;
const COINCIDENT: f32 = 1e-4;

/// A uniformly random point within `spread` of `center` on each axis.
pub(super) fn jittered<R: Rng>(center: Point2D, spread: f32, rng: &mut R) -> Point2D {
    let spread = if spread.is_finite() { spread.abs() } else { 0.0 };
    if spread == 0.0 {
        return center;
    }
    center + Point2D::new(rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
}

/// Combined pair affinity, or 0 when at or below the threshold.
fn affinity(a: &Item, b: &Item, config: &LayoutConfig) -> f32 {
    let combined = config.embedding_weight * embedding_similarity(a, b)
        + config.tag_weight * tag_similarity(a, b);
    if combined.is_finite() && combined > config.similarity_threshold {
        combined
    } else {
        0.0
    }
}

/// Place `members` around `center` with a fixed-length force simulation.
///
/// Returns one position per member, in member order. Every result lies
/// within the cluster radius of `center`.
pub(super) fn settle_cluster<R: Rng>(
    members: &[&Item],
    center: Point2D,
    config: &LayoutConfig,
    rng: &mut R,
) -> Vec<Point2D> {
    let n = members.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![center],
        _ => {}
    }

    let radius = config.cluster_radius(n);

    let mut affinities = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let weight = affinity(members[i], members[j], config);
            if weight > 0.0 {
                affinities.push((i, j, weight));
            }
        }
    }

    let mut positions: Vec<Point2D> = (0..n)
        .map(|_| jittered(center, config.jitter, rng))
        .collect();
    let mut velocities = vec![Point2D::ORIGIN; n];
    let mut forces = vec![Point2D::ORIGIN; n];

    for _ in 0..config.iterations {
        forces.iter_mut().for_each(|f| *f = Point2D::ORIGIN);

        for &(i, j, weight) in &affinities {
            let pull = (positions[j] - positions[i]) * (config.attraction_strength * weight);
            forces[i] += pull;
            forces[j] -= pull;
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length();
                if distance >= config.repulsion_distance {
                    continue;
                }
                let away = if distance > COINCIDENT {
                    delta / distance
                } else {
                    Point2D::angled((i * n + j) as f32 * config.golden_angle)
                };
                let clamped = distance.max(MIN_REPULSION_DISTANCE);
                let push = away * (config.repulsion_strength / (clamped * clamped));
                forces[i] += push;
                forces[j] -= push;
            }
        }

        for (position, force) in positions.iter().zip(forces.iter_mut()) {
            let offset = *position - center;
            if offset.length() > radius {
                *force += offset * -config.centering_strength;
            }
        }

        for ((position, velocity), force) in positions.iter_mut().zip(&mut velocities).zip(&forces) {
            let next = (*velocity + *force) * config.damping;
            *velocity = if next.is_finite() { next } else { Point2D::ORIGIN };
            *position += *velocity;
        }
    }

    positions
        .into_iter()
        .map(|position| clamp_to_radius(position, center, radius))
        .collect()
}

fn clamp_to_radius(position: Point2D, center: Point2D, radius: f32) -> Point2D {
    if !position.is_finite() {
        return center;
    }
    let offset = position - center;
    let distance = offset.length();
    if distance > radius {
        center + offset * (radius / distance)
    } else {
        position
    }
}
