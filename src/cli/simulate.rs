use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;

use nebula::config::NebulaConfig;
use nebula::scene::{ItemPosition, Scene};

#[derive(Serialize)]
struct SimulateOutput {
    ticks: usize,
    settled: bool,
    kinetic_energy: f32,
    positions: Vec<ItemPosition>,
}

/// Lay out the items, then run the physics for up to `ticks` steps.
pub fn simulate(config: &NebulaConfig, path: &Path, ticks: usize, quiet: bool) -> Result<()> {
    let items = super::read_items(path)?;
    let mut scene = Scene::new(config.clone());
    scene.update_items(items)?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(ticks as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ticks ({eta}) {msg}")?
            .progress_chars("##-"),
    );

    let mut ran = 0;
    while ran < ticks && !scene.simulation().is_settled() {
        scene.tick();
        ran += 1;
        pb.inc(1);
        if ran % 60 == 0 {
            pb.set_message(format!("energy {:.3}", scene.simulation().kinetic_energy()));
        }
    }
    pb.finish_and_clear();

    let settled = scene.simulation().is_settled();
    tracing::info!(ticks = ran, settled, "simulation finished");

    super::print_json(&SimulateOutput {
        ticks: ran,
        settled,
        kinetic_energy: scene.simulation().kinetic_energy(),
        positions: scene.positions(),
    })
}
