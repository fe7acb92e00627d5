pub mod generate;
pub mod layout;
pub mod project;
pub mod similarity;
pub mod simulate;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use nebula::items::{self, Item};

/// Load an item snapshot, attaching the path to any failure.
pub fn read_items(path: &Path) -> Result<Vec<Item>> {
    let items = items::load_items(path)
        .with_context(|| format!("failed to load items from {}", path.display()))?;
    if let Err(e) = items::check_embedding_dimensions(&items) {
        tracing::warn!(error = %e, "inconsistent embeddings, affected pairs will score 0");
    }
    Ok(items)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}
