//! `WaypointNavEnv` — C3, the navigation MDP. Ported from
//! `WaypointNavigationEnv`: state is `(current, remaining_waypoints,
//! path_history, steps_taken, total_travel_cost)`; the action space is
//! "index into `graph.neighbors(current)`"; reward combines a progress
//! term, a move-cost term, and waypoint/destination bonuses. The base
//! environment never masks or penalizes cycles — that is `nav-mask`'s
//! job, kept at this layer only as the "dead end" truncation the
//! environment itself is responsible for.

use std::sync::Arc;

use nav_core::{NavError, NodeId, ResetInfo, Result, StepEnv, StepInfo, StepOutcome, TerminatedReason};
use nav_distance::{DistanceOracle, WeightKind};
use nav_embed::Embedding;
use nav_graph::Graph;

use crate::config::{EnvConfig, RewardConfig};
use crate::observation::{self, EfficiencyInfo};

/// Raw (pre-[`nav_normalize`]) per-step cost of traversing one edge,
/// using the weight attribute directly rather than
/// `EdgeAttrs::travel_time`'s full synthesis chain: `travel_time`
/// preferred, falling back to `length`, falling back to 1.0 — a simpler
/// precedence than the embedding builder's travel-time estimate, matching
/// the original's direct `edge_data.get(weight_name, edge_data.get("length",
/// 1.0))` lookup.
fn raw_edge_cost(graph: &Graph, from: NodeId, to: NodeId, weight: WeightKind) -> f64 {
    graph
        .neighbors(from)
        .iter()
        .zip(graph.neighbor_edges(from))
        .filter(|(&head, _)| head == to)
        .map(|(_, attrs)| match weight {
            WeightKind::TravelTime => attrs.travel_time_s.unwrap_or(attrs.length_m),
            WeightKind::Length => attrs.length_m,
        })
        .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.min(c))))
        .unwrap_or(1.0)
}

/// Maximum finite pairwise distance in the graph, used to normalize
/// reward terms (`D_max`). Prefers the precomputed table's
/// own maximum finite entry; without a table, falls back to the maximum
/// Euclidean coordinate distance between any two nodes, mirroring the
/// original's `_calculate_max_distance`.
fn compute_d_max(graph: &Graph, oracle: &DistanceOracle) -> f64 {
    if let Some(table) = oracle.table() {
        let sentinel = graph.node_count() as f64;
        let max = table.values().filter(|&d| d.is_finite() && d < sentinel).fold(0.0_f64, f64::max);
        if max > 0.0 {
            return max;
        }
    }

    let nodes = graph.nodes();
    let mut max = 0.0_f64;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
            if d > max {
                max = d;
            }
        }
    }
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

struct EpisodeState {
    current: NodeId,
    remaining_waypoints: Vec<NodeId>,
    path_history: Vec<NodeId>,
    steps_taken: u32,
    total_travel_cost: f64,
    optimal_steps_to_waypoints: Vec<(NodeId, u32)>,
    optimal_steps_to_destination: Option<u32>,
}

pub struct WaypointNavEnv {
    graph: Arc<Graph>,
    embeddings: Arc<Vec<Embedding>>,
    oracle: Arc<DistanceOracle>,
    start: NodeId,
    waypoints: Vec<NodeId>,
    destination: NodeId,
    env_cfg: EnvConfig,
    rew_cfg: RewardConfig,
    max_actions: usize,
    max_steps: u32,
    max_wait_steps: u32,
    d_max: f64,
    state: EpisodeState,
}

impl WaypointNavEnv {
    pub fn new(
        graph: Arc<Graph>,
        embeddings: Arc<Vec<Embedding>>,
        oracle: Arc<DistanceOracle>,
        start: NodeId,
        waypoints: Vec<NodeId>,
        destination: NodeId,
        env_cfg: EnvConfig,
        rew_cfg: RewardConfig,
    ) -> Result<Self> {
        graph.check_node(start, "start")?;
        graph.check_node(destination, "destination")?;
        for &wp in &waypoints {
            graph.check_node(wp, "waypoint")?;
        }

        let max_actions = (0..graph.node_count() as u32)
            .map(|n| graph.out_degree(n))
            .max()
            .unwrap_or(1)
            .max(1);
        let max_steps = env_cfg.max_steps.resolve(graph.node_count());
        let max_wait_steps = env_cfg.max_wait_steps.resolve(graph.node_count());
        let d_max = compute_d_max(&graph, &oracle);

        let state = EpisodeState {
            current: start,
            remaining_waypoints: Vec::new(),
            path_history: vec![start],
            steps_taken: 0,
            total_travel_cost: 0.0,
            optimal_steps_to_waypoints: Vec::new(),
            optimal_steps_to_destination: None,
        };

        Ok(Self {
            graph,
            embeddings,
            oracle,
            start,
            waypoints,
            destination,
            env_cfg,
            rew_cfg,
            max_actions,
            max_steps,
            max_wait_steps,
            d_max,
            state,
        })
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn current(&self) -> NodeId {
        self.state.current
    }

    pub fn remaining_waypoints(&self) -> &[NodeId] {
        &self.state.remaining_waypoints
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn oracle(&self) -> &DistanceOracle {
        &self.oracle
    }

    pub fn reward_config(&self) -> &RewardConfig {
        &self.rew_cfg
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    fn target(&self) -> NodeId {
        self.state.remaining_waypoints.first().copied().unwrap_or(self.destination)
    }

    fn compute_optimal_steps(&mut self) {
        self.state.optimal_steps_to_waypoints.clear();
        let mut current = self.state.current;
        for &wp in &self.waypoints {
            let dist = self.oracle.length(current, wp);
            self.state.optimal_steps_to_waypoints.push((wp, (dist as u32).max(1)));
            current = wp;
        }
        let dist = if let Some(&last) = self.waypoints.last() {
            self.oracle.length(last, self.destination)
        } else {
            self.oracle.length(self.start, self.destination)
        };
        self.state.optimal_steps_to_destination = Some((dist as u32).max(1));
    }

    fn efficiency_info(&self) -> EfficiencyInfo {
        let mut info = EfficiencyInfo::default();

        if let Some(&wp) = self.state.remaining_waypoints.first() {
            if let Some(&(_, optimal)) = self
                .state
                .optimal_steps_to_waypoints
                .iter()
                .find(|(node, _)| *node == wp)
            {
                let optimal = optimal as f64;
                if optimal > 0.0 {
                    let remaining = self.oracle.length(self.state.current, wp);
                    let estimated_total = self.state.steps_taken as f64 + remaining;
                    info.steps_vs_optimal_wp = (estimated_total / optimal.max(1.0)) as f32;
                    info.wp_efficiency = (optimal / estimated_total.max(1.0)).min(1.0) as f32;
                }
            }
        }

        if let Some(optimal) = self.state.optimal_steps_to_destination {
            let optimal = optimal as f64;
            if optimal > 0.0 {
                let remaining = self.oracle.length(self.state.current, self.destination);
                let estimated_total = self.state.steps_taken as f64 + remaining;
                info.steps_vs_optimal_dest = (estimated_total / optimal.max(1.0)) as f32;
                info.dest_efficiency = (optimal / estimated_total.max(1.0)).min(1.0) as f32;
            }
        }

        info
    }

    fn observation(&self) -> Vec<f32> {
        let denom = if self.d_max > 0.0 { self.d_max } else { 1.0 };
        let next_wp = self.state.remaining_waypoints.first().copied();

        let dist_dest = self.oracle.length(self.state.current, self.destination);
        let dist_dest_norm = (dist_dest / denom) as f32;
        let dist_wp_norm = match next_wp {
            Some(wp) => (self.oracle.length(self.state.current, wp) / denom) as f32,
            None => 0.0,
        };
        let steps_frac = self.state.steps_taken as f32 / self.max_steps as f32;
        let efficiency = self.efficiency_info();

        let neighbors = self.graph.neighbors(self.state.current);
        let mut neigh_dist_dest = vec![0.0f32; self.max_actions];
        let mut neigh_dist_wp = vec![0.0f32; self.max_actions];
        for (i, &nb) in neighbors.iter().take(self.max_actions).enumerate() {
            neigh_dist_dest[i] = (self.oracle.length(nb, self.destination) / denom) as f32;
            if let Some(wp) = next_wp {
                neigh_dist_wp[i] = (self.oracle.length(nb, wp) / denom) as f32;
            }
        }

        observation::build(
            &self.embeddings,
            self.state.current,
            self.destination,
            next_wp,
            self.max_actions,
            dist_dest_norm,
            dist_wp_norm,
            steps_frac,
            &efficiency,
            &neigh_dist_dest,
            &neigh_dist_wp,
        )
    }

    fn info(&self) -> StepInfo {
        StepInfo {
            path: self.state.path_history.clone(),
            remaining_waypoints: self.state.remaining_waypoints.clone(),
            current_node: self.state.current,
            steps_taken: self.state.steps_taken,
            total_cost: self.state.total_travel_cost,
            action_mask: None,
            masking_applied: false,
            original_action: None,
            chosen_action: None,
            terminated_reason: None,
        }
    }
}

impl StepEnv for WaypointNavEnv {
    fn reset(&mut self) -> Result<(Vec<f32>, ResetInfo)> {
        self.state.current = self.start;
        let mut ordered = self.waypoints.clone();
        ordered.sort_by(|&a, &b| {
            self.oracle
                .length(self.start, a)
                .partial_cmp(&self.oracle.length(self.start, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.state.remaining_waypoints = ordered;
        self.state.path_history = vec![self.start];
        self.state.steps_taken = 0;
        self.state.total_travel_cost = 0.0;

        self.compute_optimal_steps();

        let obs = self.observation();
        let info = ResetInfo {
            current_node: self.state.current,
            remaining_waypoints: self.state.remaining_waypoints.clone(),
            optimal_steps_to_destination: self.state.optimal_steps_to_destination,
            action_mask: None,
        };
        Ok((obs, info))
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        self.state.steps_taken += 1;

        let neighbors = self.graph.neighbors(self.state.current).to_vec();
        if neighbors.is_empty() {
            let mut info = self.info();
            info.terminated_reason = Some(TerminatedReason::DeadEnd);
            return Ok(StepOutcome {
                observation: self.observation(),
                reward: 0.0,
                terminated: false,
                truncated: true,
                info,
            });
        }

        let next = neighbors
            .get(action)
            .copied()
            .ok_or_else(|| NavError::InvalidConfig(format!("action {action} out of range for {} neighbors", neighbors.len())))?;

        let target = self.target();
        let dist_prev = self.oracle.length(self.state.current, target);
        let edge_cost = raw_edge_cost(&self.graph, self.state.current, next, self.env_cfg.weight_name);
        let dist_next = self.oracle.length(next, target);
        let progress = dist_prev - dist_next;

        self.state.current = next;
        self.state.path_history.push(next);
        self.state.total_travel_cost += edge_cost;

        let reached_waypoint = if let Some(pos) = self.state.remaining_waypoints.iter().position(|&w| w == next) {
            self.state.remaining_waypoints.remove(pos);
            true
        } else {
            false
        };

        let denom = if self.d_max > 0.0 { self.d_max } else { 1.0 };
        let mut reward = 0.0;
        if progress > 0.0 {
            reward += self.rew_cfg.progress_coef * progress / denom;
        } else {
            reward -= self.rew_cfg.no_progress_penalty / denom;
        }
        reward -= self.rew_cfg.move_cost_coef * edge_cost / denom;
        if reached_waypoint {
            reward += self.rew_cfg.waypoint_bonus;
        }
        let reached_destination = self.state.current == self.destination && self.state.remaining_waypoints.is_empty();
        if reached_destination {
            reward += self.rew_cfg.destination_bonus;
        }

        let (terminated, truncated, reason) = if reached_destination {
            (true, false, Some(TerminatedReason::DestinationReached))
        } else if self.state.steps_taken >= self.max_steps {
            (false, true, Some(TerminatedReason::MaxSteps))
        } else if self.state.steps_taken >= self.max_wait_steps {
            (false, true, Some(TerminatedReason::MaxWaitSteps))
        } else {
            (false, false, None)
        };

        let mut info = self.info();
        info.terminated_reason = reason;

        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            terminated,
            truncated,
            info,
        })
    }

    fn observation_shape(&self) -> usize {
        observation::observation_dim(self.max_actions)
    }

    fn action_count(&self) -> usize {
        self.max_actions
    }
}
