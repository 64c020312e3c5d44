//! Episode runner: wires C1-C5 together over the synthetic grid graph and
//! drives a uniform-random policy, logging progress per pipeline stage via
//! `tracing`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use nav_core::StepEnv;
use nav_distance::{Algorithm, DistanceOracle};
use nav_env::WaypointNavEnv;
use nav_mask::MaskingWrapper;
use nav_normalize::VC2Normalizer;
use rand::Rng;

use crate::config::DemoConfig;
use crate::demo_graph;

pub fn run(
    grid_side: usize,
    cell_size_m: f64,
    episodes: u32,
    config_path: Option<&Path>,
    no_mask: bool,
    no_normalize: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    let graph = Arc::new(demo_graph::grid(grid_side, cell_size_m));
    tracing::info!(nodes = graph.node_count(), edges = graph.edge_count(), "built synthetic grid graph");

    let embeddings = Arc::new(nav_embed::build(&graph));
    let oracle = Arc::new(DistanceOracle::new(graph.clone(), None, config.env.weight_name, Algorithm::AStar));

    let start = demo_graph::corner_node(grid_side, 0, 0);
    let destination = demo_graph::corner_node(grid_side, grid_side - 1, grid_side - 1);
    let waypoint = demo_graph::corner_node(grid_side, grid_side - 1, 0);

    for episode in 0..episodes {
        let env = WaypointNavEnv::new(
            graph.clone(),
            embeddings.clone(),
            oracle.clone(),
            start,
            vec![waypoint],
            destination,
            config.env,
            config.reward,
        )?;

        let max_actions = env.action_count();
        let mut step_env: Box<dyn StepEnv> = match (no_mask, no_normalize) {
            (true, true) => Box::new(env),
            (true, false) => Box::new(VC2Normalizer::with_config(env, config.normalizer)),
            (false, true) => Box::new(MaskingWrapper::new(env, graph.clone(), oracle.clone(), destination, max_actions, config.mask)),
            (false, false) => {
                let masked = MaskingWrapper::new(env, graph.clone(), oracle.clone(), destination, max_actions, config.mask);
                Box::new(VC2Normalizer::with_config(masked, config.normalizer))
            }
        };

        let (_, reset_info) = step_env.reset()?;
        tracing::info!(episode, start, destination, waypoints = ?reset_info.remaining_waypoints, "episode reset");

        let mut total_reward = 0.0_f64;
        let mut steps = 0u32;
        let mut rng = rand::rng();
        loop {
            let action = rng.random_range(0..step_env.action_count());
            let outcome = step_env.step(action)?;
            total_reward += outcome.reward;
            steps += 1;
            if outcome.terminated || outcome.truncated {
                tracing::info!(
                    episode,
                    steps,
                    total_reward,
                    terminated = outcome.terminated,
                    truncated = outcome.truncated,
                    reason = ?outcome.info.terminated_reason,
                    "episode finished"
                );
                break;
            }
        }
    }

    Ok(())
}
