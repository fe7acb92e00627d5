//! Item snapshots and read-only lookups.
//!
//! The engine never owns item data. Callers hand in a snapshot (a slice of
//! [`Item`]s); the physics pass reads tags and collections through an
//! [`ItemLookup`] built fresh from that snapshot instead of keeping copies.

pub mod types;

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use crate::error::{NebulaError, Result};
pub use types::{Item, Point2D, Point3D, Rgb};

/// Number of dimensions in item embeddings (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Read-only access to the relationship data physics forces need.
pub trait ItemLookup {
    /// Case-normalized tag set for `id`.
    fn tags(&self, id: &str) -> Option<&HashSet<String>>;

    /// Combined primary and secondary collection ids for `id`.
    fn collections(&self, id: &str) -> Option<&BTreeSet<String>>;
}

#[derive(Debug, Clone, Default)]
struct IndexedItem {
    tags: HashSet<String>,
    collections: BTreeSet<String>,
}

/// Per-snapshot index of normalized tags and collections, keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    entries: HashMap<String, IndexedItem>,
}

impl ItemIndex {
    pub fn new(items: &[Item]) -> Self {
        let entries = items
            .iter()
            .map(|item| {
                (
                    item.id.clone(),
                    IndexedItem {
                        tags: item.normalized_tags(),
                        collections: item
                            .all_collections()
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

impl ItemLookup for ItemIndex {
    fn tags(&self, id: &str) -> Option<&HashSet<String>> {
        self.entries.get(id).map(|e| &e.tags)
    }

    fn collections(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(id).map(|e| &e.collections)
    }
}

/// Accepted item file shapes: a bare array or `{"items": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemFile {
    Bare(Vec<Item>),
    Wrapped { items: Vec<Item> },
}

/// Parse an item snapshot from JSON and reject duplicate or empty ids.
pub fn parse_items(json: &str) -> Result<Vec<Item>> {
    let file: ItemFile =
        serde_json::from_str(json).map_err(|e| NebulaError::InvalidItems(e.to_string()))?;
    let items = match file {
        ItemFile::Bare(items) => items,
        ItemFile::Wrapped { items } => items,
    };

    check_ids(&items)?;
    Ok(items)
}

/// Reject snapshots with an empty or repeated id.
pub fn check_ids(items: &[Item]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.is_empty() {
            return Err(NebulaError::InvalidItems("item with empty id".into()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(NebulaError::InvalidItems(format!("duplicate id: {}", item.id)));
        }
    }
    Ok(())
}

/// Read and parse an item snapshot file.
pub fn load_items(path: impl AsRef<Path>) -> Result<Vec<Item>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| NebulaError::InvalidItems(format!("{}: {e}", path.display())))?;
    let items = parse_items(&contents)?;
    tracing::debug!(path = %path.display(), count = items.len(), "items loaded");
    Ok(items)
}

/// Strict check that every present embedding shares one dimensionality.
///
/// The engine itself tolerates mismatches (they score 0 / fall back to the
/// origin); this is for collaborators that want to reject bad data up front.
pub fn check_embedding_dimensions(items: &[Item]) -> Result<Option<usize>> {
    let mut expected = None;
    for embedding in items.iter().filter_map(Item::embedding) {
        match expected {
            None => expected = Some(embedding.len()),
            Some(dim) if dim != embedding.len() => {
                return Err(NebulaError::DimensionMismatch {
                    expected: dim,
                    found: embedding.len(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(expected)
}
