//! Observation vector assembly: `embedding(current) ++ embedding(dest) ++
//! embedding(next_waypoint_or_zero) ++ scalars ++ neighbor_features`.

use nav_core::NodeId;
use nav_embed::{Embedding, EMBEDDING_DIM};

/// 4 efficiency/progress scalars plus 3 distance/step scalars:
/// `dist_dest_norm, dist_wp_norm, steps_frac, wp_efficiency,
/// dest_efficiency, steps_vs_optimal_wp, steps_vs_optimal_dest`.
pub const SCALAR_COUNT: usize = 7;

pub fn observation_dim(max_actions: usize) -> usize {
    3 * EMBEDDING_DIM + SCALAR_COUNT + 2 * max_actions
}

pub struct EfficiencyInfo {
    pub wp_efficiency: f32,
    pub dest_efficiency: f32,
    pub steps_vs_optimal_wp: f32,
    pub steps_vs_optimal_dest: f32,
}

impl Default for EfficiencyInfo {
    fn default() -> Self {
        Self {
            wp_efficiency: 0.0,
            dest_efficiency: 0.0,
            steps_vs_optimal_wp: 0.0,
            steps_vs_optimal_dest: 0.0,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build(
    embeddings: &[Embedding],
    current: NodeId,
    destination: NodeId,
    next_waypoint: Option<NodeId>,
    max_actions: usize,
    dist_dest_norm: f32,
    dist_wp_norm: f32,
    steps_frac: f32,
    efficiency: &EfficiencyInfo,
    neigh_dist_dest: &[f32],
    neigh_dist_wp: &[f32],
) -> Vec<f32> {
    let mut obs = Vec::with_capacity(observation_dim(max_actions));
    obs.extend_from_slice(&embeddings[current as usize]);
    obs.extend_from_slice(&embeddings[destination as usize]);
    match next_waypoint {
        Some(wp) => obs.extend_from_slice(&embeddings[wp as usize]),
        None => obs.extend(std::iter::repeat(0.0f32).take(EMBEDDING_DIM)),
    }
    obs.push(dist_dest_norm);
    obs.push(dist_wp_norm);
    obs.push(steps_frac);
    obs.push(efficiency.wp_efficiency);
    obs.push(efficiency.dest_efficiency);
    obs.push(efficiency.steps_vs_optimal_wp);
    obs.push(efficiency.steps_vs_optimal_dest);

    debug_assert_eq!(neigh_dist_dest.len(), max_actions);
    debug_assert_eq!(neigh_dist_wp.len(), max_actions);
    obs.extend_from_slice(neigh_dist_dest);
    obs.extend_from_slice(neigh_dist_wp);

    obs
}
