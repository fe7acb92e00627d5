use serde::Serialize;

use crate::items::Point2D;

pub const DEFAULT_RADIUS: f32 = 2.0;
pub const DEFAULT_MASS: f32 = 1.0;

/// One simulated item.
///
/// Holds only kinematic state. Tags and collections are looked up per tick
/// through [`crate::items::ItemLookup`], never cached here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsNode {
    /// Mirrors the item id.
    pub id: String,
    pub position: Point2D,
    pub velocity: Point2D,
    /// Layout-computed position the node is pulled toward.
    pub target: Point2D,
    /// Collision extent.
    pub radius: f32,
    /// Force divisor.
    pub mass: f32,
    /// Under manual control: skipped by forces and integration.
    pub pinned: bool,
}

impl PhysicsNode {
    /// A node resting at its target. A target is required: nodes never exist without one.
    pub fn new(id: impl Into<String>, target: Point2D) -> Self {
        Self {
            id: id.into(),
            position: target,
            velocity: Point2D::ORIGIN,
            target,
            radius: DEFAULT_RADIUS,
            mass: DEFAULT_MASS,
            pinned: false,
        }
    }

    pub fn with_position(mut self, position: Point2D) -> Self {
        self.position = position;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn is_at_rest(&self) -> bool {
        self.velocity == Point2D::ORIGIN
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_sq()
    }
}
