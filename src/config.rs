use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::NebulaError;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct NebulaConfig {
    pub log: LogConfig,
    pub similarity: SimilarityConfig,
    pub reduction: ReductionConfig,
    pub layout: LayoutConfig,
    pub density: DensityConfig,
    pub physics: PhysicsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

/// Weights for the combined similarity score. Need not sum to 1.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SimilarityWeights {
    pub tag: f32,
    pub collection: f32,
    pub date: f32,
    pub color: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    /// Separation at which date similarity reaches 0.
    pub date_window_days: f32,
    /// Minimum combined score for a pair to be emitted as an edge.
    pub edge_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReductionConfig {
    pub iterations: usize,
    /// Longest bounding-box side after normalization.
    pub target_span: f32,
    /// Neighbor count for incremental placement.
    pub neighbors: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Spiral of collections with a local similarity simulation per cluster.
    Collections,
    /// Embedding projection, falling back to the collection layout.
    Embedding,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub seed: Option<u64>,
    pub golden_angle: f32,
    pub base_radius: f32,
    pub radius_growth: f32,
    pub iterations: usize,
    pub embedding_weight: f32,
    pub tag_weight: f32,
    pub similarity_threshold: f32,
    pub attraction_strength: f32,
    pub repulsion_distance: f32,
    pub repulsion_strength: f32,
    pub centering_strength: f32,
    pub damping: f32,
    pub cluster_radius_base: f32,
    pub cluster_radius_per_item: f32,
    pub cluster_radius_max: f32,
    pub jitter: f32,
    pub uncollected_jitter: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DensityConfig {
    pub enabled: bool,
    pub radius: f32,
    pub compression_factor: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub time_step: f32,
    pub target_strength: f32,
    pub repulsion_strength: f32,
    pub repulsion_radius: f32,
    pub collection_attraction: f32,
    pub tag_attraction: f32,
    /// Velocity multiplier applied every tick.
    pub damping: f32,
    /// Speeds below this snap to zero. A free node can come to rest up to
    /// `min_speed / (target_strength * time_step * damping)` from its target.
    pub min_speed: f32,
    pub max_speed: f32,
    pub grid_cell_size: f32,
    pub collision_enabled: bool,
    /// Fraction of approaching normal velocity reflected on contact.
    pub restitution: f32,
    pub default_radius: f32,
    pub default_mass: f32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            tag: 0.3,
            collection: 0.5,
            date: 0.1,
            color: 0.1,
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            date_window_days: 30.0,
            edge_threshold: 0.3,
        }
    }
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            target_span: 80.0,
            neighbors: 5,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Collections,
            seed: None,
            golden_angle: 2.399_963,
            base_radius: 0.0,
            radius_growth: 30.0,
            iterations: 100,
            embedding_weight: 0.7,
            tag_weight: 0.3,
            similarity_threshold: 0.15,
            attraction_strength: 0.05,
            repulsion_distance: 5.0,
            repulsion_strength: 1.0,
            centering_strength: 0.1,
            damping: 0.7,
            cluster_radius_base: 4.0,
            cluster_radius_per_item: 0.3,
            cluster_radius_max: 12.0,
            jitter: 2.0,
            uncollected_jitter: 5.0,
        }
    }
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 15.0,
            compression_factor: 0.4,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            target_strength: 120.0,
            repulsion_strength: 80.0,
            repulsion_radius: 8.0,
            collection_attraction: 1.0,
            tag_attraction: 1.5,
            damping: 0.85,
            min_speed: 0.05,
            max_speed: 800.0,
            grid_cell_size: 10.0,
            collision_enabled: true,
            restitution: 0.3,
            default_radius: 2.0,
            default_mass: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Cluster radius for a collection of `item_count` items.
    pub fn cluster_radius(&self, item_count: usize) -> f32 {
        (self.cluster_radius_base + item_count as f32 * self.cluster_radius_per_item)
            .min(self.cluster_radius_max)
    }
}

/// Partial physics update; `None` fields keep their current value.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PhysicsConfigUpdate {
    pub time_step: Option<f32>,
    pub target_strength: Option<f32>,
    pub repulsion_strength: Option<f32>,
    pub repulsion_radius: Option<f32>,
    pub collection_attraction: Option<f32>,
    pub tag_attraction: Option<f32>,
    pub damping: Option<f32>,
    pub min_speed: Option<f32>,
    pub max_speed: Option<f32>,
    pub grid_cell_size: Option<f32>,
    pub collision_enabled: Option<bool>,
    pub restitution: Option<f32>,
    pub default_radius: Option<f32>,
    pub default_mass: Option<f32>,
}

impl PhysicsConfig {
    pub fn apply(&mut self, update: &PhysicsConfigUpdate) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = update.$field {
                    self.$field = value;
                })*
            };
        }
        merge!(
            time_step,
            target_strength,
            repulsion_strength,
            repulsion_radius,
            collection_attraction,
            tag_attraction,
            damping,
            min_speed,
            max_speed,
            grid_cell_size,
            collision_enabled,
            restitution,
            default_radius,
            default_mass,
        );
    }

    /// Grid cell size actually used: never smaller than the widest interaction.
    pub fn effective_cell_size(&self, max_node_radius: f32) -> f32 {
        self.grid_cell_size
            .max(self.repulsion_radius)
            .max(max_node_radius * 2.0)
            .max(f32::EPSILON)
    }

    pub fn validate(&self) -> Result<(), NebulaError> {
        let positive = [
            ("physics.time_step", self.time_step),
            ("physics.grid_cell_size", self.grid_cell_size),
            ("physics.default_radius", self.default_radius),
            ("physics.default_mass", self.default_mass),
            ("physics.max_speed", self.max_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NebulaError::InvalidConfig(format!("{name} must be > 0, got {value}")));
            }
        }
        let non_negative = [
            ("physics.target_strength", self.target_strength),
            ("physics.repulsion_strength", self.repulsion_strength),
            ("physics.repulsion_radius", self.repulsion_radius),
            ("physics.collection_attraction", self.collection_attraction),
            ("physics.tag_attraction", self.tag_attraction),
            ("physics.min_speed", self.min_speed),
            ("physics.restitution", self.restitution),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(NebulaError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(NebulaError::InvalidConfig(format!(
                "physics.damping must be in (0, 1], got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

/// Returns `~/.nebula/`, or `./.nebula/` when no home directory is known.
pub fn default_nebula_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nebula")
}

/// Returns the default config file path: `~/.nebula/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nebula_dir().join("config.toml")
}

impl NebulaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NebulaConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (NEBULA_LOG_LEVEL, NEBULA_SEED).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NEBULA_LOG_LEVEL") {
            self.log.level = val;
        }
        if let Ok(val) = std::env::var("NEBULA_SEED") {
            match val.parse() {
                Ok(seed) => self.layout.seed = Some(seed),
                Err(_) => tracing::warn!(value = %val, "ignoring unparsable NEBULA_SEED"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), NebulaError> {
        let w = &self.similarity.weights;
        for (name, value) in [
            ("tag", w.tag),
            ("collection", w.collection),
            ("date", w.date),
            ("color", w.color),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(NebulaError::InvalidConfig(format!(
                    "similarity.weights.{name} must be >= 0, got {value}"
                )));
            }
        }
        if !(self.density.compression_factor >= 0.0 && self.density.compression_factor <= 1.0) {
            return Err(NebulaError::InvalidConfig(format!(
                "density.compression_factor must be in [0, 1], got {}",
                self.density.compression_factor
            )));
        }
        if !(self.density.radius.is_finite() && self.density.radius > 0.0) {
            return Err(NebulaError::InvalidConfig(format!(
                "density.radius must be > 0, got {}",
                self.density.radius
            )));
        }
        self.physics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NebulaConfig::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.similarity.weights.collection, 0.5);
        assert_eq!(config.reduction.iterations, 50);
        assert_eq!(config.layout.mode, LayoutMode::Collections);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[log]
level = "debug"

[similarity.weights]
tag = 0.6

[layout]
mode = "embedding"
seed = 7

[physics]
damping = 0.9
collision_enabled = false
"#;
        let config: NebulaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.similarity.weights.tag, 0.6);
        assert_eq!(config.layout.mode, LayoutMode::Embedding);
        assert_eq!(config.layout.seed, Some(7));
        assert_eq!(config.physics.damping, 0.9);
        assert!(!config.physics.collision_enabled);
        // defaults still apply for unset fields
        assert_eq!(config.similarity.weights.collection, 0.5);
        assert_eq!(config.density.radius, 15.0);
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[density]\ncompression_factor = 0.8\n").unwrap();
        let config = NebulaConfig::load_from(&path).unwrap();
        assert_eq!(config.density.compression_factor, 0.8);

        let missing = NebulaConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(missing.density.compression_factor, 0.4);
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = NebulaConfig::default();
        config.similarity.weights.date = -1.0;
        assert!(config.validate().is_err());

        let mut config = NebulaConfig::default();
        config.physics.damping = 1.5;
        assert!(config.validate().is_err());

        let mut config = NebulaConfig::default();
        config.physics.time_step = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn physics_update_merges_only_set_fields() {
        let mut physics = PhysicsConfig::default();
        let update: PhysicsConfigUpdate =
            serde_json::from_str(r#"{"damping": 0.5, "collision_enabled": false}"#).unwrap();
        physics.apply(&update);
        assert_eq!(physics.damping, 0.5);
        assert!(!physics.collision_enabled);
        assert_eq!(physics.target_strength, PhysicsConfig::default().target_strength);
    }

    #[test]
    fn cluster_radius_is_capped() {
        let layout = LayoutConfig::default();
        assert!((layout.cluster_radius(2) - 4.6).abs() < 1e-5);
        assert_eq!(layout.cluster_radius(1000), 12.0);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = NebulaConfig::default();
        std::env::set_var("NEBULA_LOG_LEVEL", "trace");
        std::env::set_var("NEBULA_SEED", "42");

        config.apply_env_overrides();

        assert_eq!(config.log.level, "trace");
        assert_eq!(config.layout.seed, Some(42));

        // Clean up
        std::env::remove_var("NEBULA_LOG_LEVEL");
        std::env::remove_var("NEBULA_SEED");
    }
}
