//! Core item and geometry type definitions.
//!
//! Defines [`Item`] (the read-only content record the engine lays out),
//! [`Rgb`] (an item's average color), and the [`Point2D`] / [`Point3D`]
//! coordinates the engine emits.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// A content item as supplied by the knowledge base.
///
/// Missing lists deserialize as empty and are never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier.
    pub id: String,
    /// Free-form tags, compared case-insensitively.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Every collection the item belongs to (secondary memberships included).
    #[serde(default)]
    pub collection_ids: Vec<String>,
    /// The collection used for layout grouping.
    #[serde(default)]
    pub primary_collection_id: Option<String>,
    /// Sentence embedding (384 dimensions for all-MiniLM-L6-v2).
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Average color, 0–255 per channel.
    #[serde(default)]
    pub average_color: Option<Rgb>,
    /// Creation timestamp, RFC 3339 or `YYYY-MM-DD`.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Precomputed spatial position, if the collaborator already has one.
    #[serde(default)]
    pub position: Option<Point2D>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the primary collection, also recording it as a membership.
    pub fn in_collection(mut self, collection_id: impl Into<String>) -> Self {
        let collection_id = collection_id.into();
        if !self.collection_ids.contains(&collection_id) {
            self.collection_ids.push(collection_id.clone());
        }
        self.primary_collection_id = Some(collection_id);
        self
    }

    /// Add a secondary membership without touching the primary collection.
    pub fn also_in(mut self, collection_id: impl Into<String>) -> Self {
        let collection_id = collection_id.into();
        if !self.collection_ids.contains(&collection_id) {
            self.collection_ids.push(collection_id);
        }
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.average_color = Some(color);
        self
    }

    pub fn created(mut self, timestamp: impl Into<String>) -> Self {
        self.created_at = Some(timestamp.into());
        self
    }

    pub fn at(mut self, position: Point2D) -> Self {
        self.position = Some(position);
        self
    }

    /// Lowercased tag set.
    pub fn normalized_tags(&self) -> HashSet<String> {
        self.tags.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect()
    }

    /// Primary plus secondary collection ids.
    pub fn all_collections(&self) -> BTreeSet<&str> {
        self.collection_ids
            .iter()
            .map(String::as_str)
            .chain(self.primary_collection_id.as_deref())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Primary collection id, treating an empty string as absent.
    pub fn primary_collection(&self) -> Option<&str> {
        self.primary_collection_id.as_deref().filter(|c| !c.is_empty())
    }

    /// Parsed creation timestamp, `None` if missing or unparsable.
    pub fn created_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Embedding, treating an empty vector as absent.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|e| !e.is_empty())
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Average color of an item, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn distance(&self, other: &Rgb) -> f32 {
        let dr = self.0 as f32 - other.0 as f32;
        let dg = self.1 as f32 - other.1 as f32;
        let db = self.2 as f32 - other.2 as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians.
    pub fn angled(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(&self, other: Point2D) -> f32 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Point2D) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point2D {
    fn add_assign(&mut self, rhs: Point2D) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point2D {
    fn sub_assign(&mut self, rhs: Point2D) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Point2D {
    type Output = Point2D;
    fn mul(self, rhs: f32) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point2D {
    type Output = Point2D;
    fn div(self, rhs: f32) -> Point2D {
        Point2D::new(self.x / rhs, self.y / rhs)
    }
}

/// A 3D coordinate, emitted by [`crate::reduction::reduce_to_space`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: Point3D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
