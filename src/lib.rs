//! Spatial layout and relationship-visualization engine for personal knowledge bases.
//!
//! Nebula takes a snapshot of content items (tags, collection memberships,
//! average color, a 384-dim embedding, a creation date) and turns it into
//! coordinates: a one-shot layout that reflects multi-factor similarity, then
//! a continuous physics simulation that keeps the arrangement stable while
//! items are dragged, added, or removed. Rendering is the caller's concern;
//! the engine only emits positions and similarity-weighted edges.
//!
//! | Signal | Measure | Default weight |
//! |--------|---------|----------------|
//! | **Tags** | Jaccard over case-normalized sets | 0.3 |
//! | **Collections** | Any shared membership (binary) | 0.5 |
//! | **Date** | Linear decay to 0 over 30 days | 0.1 |
//! | **Color** | 1 − normalized RGB distance | 0.1 |
//!
//! Embedding cosine similarity drives the per-collection layout and the
//! embedding projection, not the weighted score.
//!
//! # Pipeline
//!
//! items → [`layout`] (spiral of collections, local relaxation, or
//! [`reduction`] of embeddings) → [`layout::density`] → targets →
//! [`physics::Simulation`]. [`scene::Scene`] wires the stages together.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`error`]: Caller-contract errors
//! - [`items`]: Item snapshots, geometry types, and per-tick lookups
//! - [`similarity`]: Pairwise similarity signals and edge extraction
//! - [`reduction`]: Power-iteration projection of embeddings to 2D/3D
//! - [`layout`]: Initial placement and density normalization
//! - [`physics`]: Grid-accelerated force simulation with drag pinning
//! - [`scene`]: End-to-end orchestration

pub mod config;
pub mod error;
pub mod items;
pub mod layout;
pub mod physics;
pub mod reduction;
pub mod scene;
pub mod similarity;

pub use error::{NebulaError, Result};
pub use items::{Item, Point2D, Point3D, Rgb};
pub use scene::Scene;
