//! `nav-episode` — demo binary wiring C1-C5 together over a synthetic
//! road network behind a `clap::Parser` front end.

mod cli;
mod config;
mod demo_graph;
mod episode;
mod logging;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_tracing(&cli.log_format);
    cli.run()
}
