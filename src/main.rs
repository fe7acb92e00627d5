mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nebula::config::NebulaConfig;

#[derive(Parser)]
#[command(name = "nebula", version, about = "Similarity layout and physics engine for knowledge bases")]
struct Cli {
    /// Config file (defaults to ~/.nebula/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute layout targets and similarity edges for an item snapshot
    Layout {
        /// JSON file: an array of items or {"items": [...]}
        items: PathBuf,
    },
    /// Lay out the items, then run the physics simulation
    Simulate {
        items: PathBuf,
        /// Maximum number of ticks (stops early once settled)
        #[arg(long, default_value_t = 600)]
        ticks: usize,
        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Project item embeddings to 2D
    Project {
        items: PathBuf,
        /// Project to 3D instead
        #[arg(long)]
        three_d: bool,
    },
    /// Show the similarity breakdown between two items
    Similarity { items: PathBuf, a: String, b: String },
    /// Emit synthetic items for experiments
    Generate {
        #[arg(long, default_value_t = 100)]
        count: usize,
        #[arg(long, default_value_t = 5)]
        collections: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NebulaConfig::load_from(path)?,
        None => NebulaConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON output.
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Layout { items } => cli::layout::layout(&config, &items)?,
        Command::Simulate { items, ticks, quiet } => {
            cli::simulate::simulate(&config, &items, ticks, quiet)?
        }
        Command::Project { items, three_d } => cli::project::project(&config, &items, three_d)?,
        Command::Similarity { items, a, b } => cli::similarity::similarity(&config, &items, &a, &b)?,
        Command::Generate {
            count,
            collections,
            seed,
        } => cli::generate::generate(count, collections, seed.or(config.layout.seed))?,
        Command::Config => {
            let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
            print!("{rendered}");
        }
    }

    Ok(())
}
