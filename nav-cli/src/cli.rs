//! CLI surface for the `nav-episode` demo binary: one `clap::Parser` root
//! with a `Commands` subcommand enum, `Cli::run` dispatching to plain
//! functions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nav-episode")]
#[command(about = "Runs waypoint-navigation episodes over a synthetic road network", long_about = None)]
pub struct Cli {
    /// Log output format: "text" (default) or "json"
    #[arg(long, global = true, default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more episodes with a uniform-random policy over a
    /// synthetic grid graph, exercising the full oracle -> embeddings ->
    /// env -> mask -> normalize pipeline.
    Run {
        /// Grid side length (side * side nodes)
        #[arg(long, default_value_t = 8)]
        grid_side: usize,

        /// Distance between adjacent grid nodes, in meters
        #[arg(long, default_value_t = 100.0)]
        cell_size_m: f64,

        /// Number of episodes to run
        #[arg(long, default_value_t = 1)]
        episodes: u32,

        /// Optional TOML or JSON config file overriding env/reward/mask/normalizer defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip action masking and cycle prevention (C4)
        #[arg(long)]
        no_mask: bool,

        /// Skip reward/value normalization (C5)
        #[arg(long)]
        no_normalize: bool,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Run {
                grid_side,
                cell_size_m,
                episodes,
                config,
                no_mask,
                no_normalize,
            } => crate::episode::run(grid_side, cell_size_m, episodes, config.as_deref(), no_mask, no_normalize),
        }
    }
}
