use anyhow::{Context, Result};
use std::path::Path;

use nebula::config::NebulaConfig;
use nebula::similarity::breakdown_within;

/// Print every similarity signal between two items of a snapshot.
pub fn similarity(config: &NebulaConfig, path: &Path, a: &str, b: &str) -> Result<()> {
    let items = super::read_items(path)?;
    let find = |id: &str| {
        items
            .iter()
            .find(|item| item.id == id)
            .with_context(|| format!("no item with id {id} in {}", path.display()))
    };
    let (first, second) = (find(a)?, find(b)?);

    let result = breakdown_within(
        first,
        second,
        &config.similarity.weights,
        config.similarity.date_window_days,
    );
    super::print_json(&result)
}
