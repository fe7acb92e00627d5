//! Continuous physics simulation.
//!
//! Every tick each free node is pulled toward its layout target, pushed away
//! from close neighbors, and nudged toward neighbors sharing a collection or
//! tags. Neighbor queries go through a [`SpatialGrid`] rebuilt per tick.
//! After integration, overlapping pairs are separated.
//!
//! Pinned nodes (being dragged) are skipped by forces and integration; their
//! position is set externally.

mod forces;
pub mod grid;
pub mod node;

use std::collections::HashMap;

use crate::config::{PhysicsConfig, PhysicsConfigUpdate};
use crate::error::{NebulaError, Result};
use crate::items::{ItemLookup, Point2D};
pub use grid::SpatialGrid;
pub use node::PhysicsNode;

/// Caller-owned simulation: a node set plus its configuration.
#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<PhysicsNode>,
    node_index: HashMap<String, usize>,
    config: PhysicsConfig,
    grid: SpatialGrid<usize>,
    forces: Vec<Point2D>,
    ticks: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl Simulation {
    pub fn new(config: PhysicsConfig) -> Self {
        let grid = SpatialGrid::new(config.grid_cell_size);
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            config,
            grid,
            forces: Vec::new(),
            ticks: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Merge a partial config. Rejected updates leave the current config untouched.
    pub fn set_config(&mut self, update: &PhysicsConfigUpdate) -> Result<()> {
        let mut candidate = self.config.clone();
        candidate.apply(update);
        candidate.validate()?;
        tracing::debug!(?update, "physics config updated");
        self.config = candidate;
        Ok(())
    }

    // ── Node management ──────────────────────────────────────────────────────

    /// Insert a node, or update the target, radius and mass of an existing one.
    ///
    /// An existing node keeps its position, velocity and pin state.
    pub fn upsert_node(&mut self, node: PhysicsNode) {
        if let Some(&index) = self.node_index.get(&node.id) {
            let existing = &mut self.nodes[index];
            existing.target = node.target;
            existing.radius = node.radius;
            existing.mass = node.mass;
            return;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Remove a node immediately, returning it if it existed.
    pub fn remove_node(&mut self, id: &str) -> Option<PhysicsNode> {
        let index = self.node_index.remove(id)?;
        let removed = self.nodes.swap_remove(index);
        if let Some(moved) = self.nodes.get(index) {
            self.node_index.insert(moved.id.clone(), index);
        }
        Some(removed)
    }

    /// Keep only nodes whose id satisfies `keep`; returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|node| keep(&node.id));
        if self.nodes.len() != before {
            self.reindex();
        }
        before - self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_index.clear();
        self.grid.clear();
    }

    pub fn get_node(&self, id: &str) -> Option<&PhysicsNode> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    fn get_node_mut(&mut self, id: &str) -> Result<&mut PhysicsNode> {
        match self.node_index.get(id) {
            Some(&index) => Ok(&mut self.nodes[index]),
            None => Err(NebulaError::UnknownNode(id.to_string())),
        }
    }

    /// Every node, in insertion order (removals may reorder).
    pub fn nodes(&self) -> &[PhysicsNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn reindex(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
    }

    // ── Pinning (drag) ───────────────────────────────────────────────────────

    /// Take manual control: pin and drop any momentum.
    pub fn pin(&mut self, id: &str) -> Result<()> {
        let node = self.get_node_mut(id)?;
        node.pinned = true;
        node.velocity = Point2D::ORIGIN;
        tracing::debug!(id, "node pinned");
        Ok(())
    }

    /// Release manual control; the node resumes seeking its current target.
    pub fn unpin(&mut self, id: &str) -> Result<()> {
        let node = self.get_node_mut(id)?;
        node.pinned = false;
        node.velocity = Point2D::ORIGIN;
        tracing::debug!(id, "node unpinned");
        Ok(())
    }

    /// Set a node's raw position (drag move). Non-finite positions are ignored.
    pub fn move_node(&mut self, id: &str, position: Point2D) -> Result<()> {
        let node = self.get_node_mut(id)?;
        if position.is_finite() {
            node.position = position;
            node.velocity = Point2D::ORIGIN;
        }
        Ok(())
    }

    // ── Simulation ───────────────────────────────────────────────────────────

    /// Advance one fixed timestep.
    ///
    /// `lookup` supplies the current tags and collections for the attraction
    /// forces; ids it does not know simply get no attraction.
    pub fn tick<L: ItemLookup + ?Sized>(&mut self, lookup: &L) {
        self.ticks += 1;
        if self.nodes.is_empty() {
            return;
        }

        let config = &self.config;
        let dt = config.time_step;
        let max_radius = self.nodes.iter().map(|n| n.radius).fold(0.0_f32, f32::max);
        let cell_size = config.effective_cell_size(max_radius);

        // 1. Spatial grid from current positions
        self.grid.reset(cell_size);
        self.grid
            .extend(self.nodes.iter().enumerate().map(|(i, n)| (i, n.position)));

        // 2. Forces on free nodes
        self.forces.clear();
        self.forces.resize(self.nodes.len(), Point2D::ORIGIN);
        for index in 0..self.nodes.len() {
            if self.nodes[index].pinned {
                continue;
            }
            let force =
                forces::accumulate_node_force(index, &self.nodes, &self.grid, config, lookup);
            if force.is_finite() {
                self.forces[index] = force;
            }
        }

        // 3. Integrate
        let min_speed_sq = config.min_speed * config.min_speed;
        let max_speed = config.max_speed;
        for (node, force) in self.nodes.iter_mut().zip(&self.forces) {
            if node.pinned {
                continue;
            }
            let mass = if node.mass > f32::EPSILON { node.mass } else { 1.0 };
            let mut velocity = (node.velocity + *force * (dt / mass)) * config.damping;

            let speed_sq = velocity.length_sq();
            if !velocity.is_finite() || speed_sq < min_speed_sq {
                velocity = Point2D::ORIGIN;
            } else if speed_sq > max_speed * max_speed {
                velocity = velocity * (max_speed / speed_sq.sqrt());
            }

            node.velocity = velocity;
            node.position += velocity * dt;
        }

        // 4. Collisions against post-integration positions
        let mut collisions = 0usize;
        if config.collision_enabled {
            let restitution = config.restitution;
            self.grid.reset(cell_size);
            self.grid
                .extend(self.nodes.iter().enumerate().map(|(i, n)| (i, n.position)));
            for first in 0..self.nodes.len() {
                let position = self.nodes[first].position;
                let candidates: Vec<usize> = self
                    .grid
                    .neighbors(position)
                    .copied()
                    .filter(|&second| second > first)
                    .collect();
                for second in candidates {
                    if forces::resolve_collision(&mut self.nodes, first, second, restitution) {
                        collisions += 1;
                    }
                }
            }
        }

        tracing::trace!(
            tick = self.ticks,
            nodes = self.nodes.len(),
            collisions,
            energy = self.kinetic_energy(),
            "physics tick"
        );
    }

    /// Total kinetic energy of free nodes.
    pub fn kinetic_energy(&self) -> f32 {
        self.nodes
            .iter()
            .filter(|n| !n.pinned)
            .map(PhysicsNode::kinetic_energy)
            .sum()
    }

    /// True once every node has come to rest.
    pub fn is_settled(&self) -> bool {
        self.nodes.iter().all(PhysicsNode::is_at_rest)
    }
}
