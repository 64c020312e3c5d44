//! `nav-mask` — C4, the masking & cycle-prevention wrapper.
//!
//! Ported from `ActionMaskingWrapper(gym.Wrapper)`. The original subclasses
//! `gym.Wrapper`; here [`MaskingWrapper`] wraps any [`StepEnv`] by
//! composition and implements `StepEnv` itself, so masked and unmasked
//! environments are interchangeable wherever the trait is expected. It
//! reads `current_node`/`remaining_waypoints` off the inner env's own
//! `StepInfo`/`ResetInfo` rather than reaching into private fields, which
//! is the only channel composition leaves open (and matches what the
//! Python wrapper does through `getattr(self.env, ...)`).
//!
//! The wrapped environment here exposes no partial `_action_mask` of its
//! own (unlike the Python base class, which supports one via `getattr`),
//! so the "base mask" this wrapper starts from is always all-true: every
//! out-edge is a candidate action before cycle and progress filtering
//! apply.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use nav_core::{NodeId, ResetInfo, Result, StepEnv, StepOutcome, TerminatedReason};
use nav_distance::DistanceOracle;
use nav_graph::Graph;
use rand::Rng as _;

/// Bounded FIFO of recently-visited nodes consulted for cycle avoidance.
pub const RECENT_WINDOW: usize = 10;
/// A neighbor visited this many times or more is excluded unless it is a
/// waypoint/destination or the only option left.
pub const VISIT_LIMIT: u32 = 3;
/// A neighbor must reduce the shortest-path distance to its target by at
/// least this factor to count as "closer" — 0.995 tolerates floating-point
/// noise without permitting sideways/backward moves to pass.
pub const PROGRESS_MARGIN: f64 = 0.995;
/// Cumulative cycle penalty floor; reaching it truncates the episode.
pub const CYCLE_PENALTY_FLOOR: f64 = -300.0;
/// Default capacity of the wrapper's own shortest-path memo, distinct from
/// (and smaller than) the oracle's own cache.
pub const DEFAULT_SP_CACHE_CAPACITY: usize = 20_000;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskConfig {
    pub anti_loop_penalty: f64,
    pub sp_cache_capacity: usize,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            anti_loop_penalty: 20.0,
            sp_cache_capacity: DEFAULT_SP_CACHE_CAPACITY,
        }
    }
}

/// Wraps any [`StepEnv`], adding action masking and cycle-penalty shaping.
/// `destination` and `max_actions` are supplied explicitly at construction
/// because they are episode-invariant facts about the wrapped environment
/// that the trait itself does not surface.
pub struct MaskingWrapper<E: StepEnv> {
    inner: E,
    graph: Arc<Graph>,
    oracle: Arc<DistanceOracle>,
    destination: NodeId,
    max_actions: usize,
    config: MaskConfig,
    current: NodeId,
    remaining_waypoints: Vec<NodeId>,
    recent: VecDeque<NodeId>,
    recent_set: HashSet<NodeId>,
    visit_counts: HashMap<NodeId, u32>,
    sp_cache: LruCache<(NodeId, NodeId), f64>,
}

impl<E: StepEnv> MaskingWrapper<E> {
    pub fn new(
        inner: E,
        graph: Arc<Graph>,
        oracle: Arc<DistanceOracle>,
        destination: NodeId,
        max_actions: usize,
        config: MaskConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.sp_cache_capacity.max(1)).unwrap();
        Self {
            inner,
            graph,
            oracle,
            destination,
            max_actions,
            config,
            current: destination,
            remaining_waypoints: Vec::new(),
            recent: VecDeque::with_capacity(RECENT_WINDOW),
            recent_set: HashSet::new(),
            visit_counts: HashMap::new(),
            sp_cache: LruCache::new(capacity),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn ordered_neighbors(&self) -> Vec<NodeId> {
        self.graph
            .neighbors(self.current)
            .iter()
            .copied()
            .take(self.max_actions)
            .collect()
    }

    fn sp_length(&mut self, from: NodeId, to: NodeId) -> f64 {
        if let Some(&d) = self.sp_cache.get(&(from, to)) {
            return d;
        }
        let d = self.oracle.length(from, to);
        self.sp_cache.put((from, to), d);
        d
    }

    fn targets(&self) -> Vec<NodeId> {
        if self.remaining_waypoints.is_empty() {
            vec![self.destination]
        } else {
            self.remaining_waypoints.clone()
        }
    }

    /// Rebuilds the action mask for the current node. Mirrors
    /// `_update_action_mask_with_cycles`: waypoint/destination neighbors
    /// always pass, others must make measurable progress toward some
    /// target and must not be over-visited, and if nothing survives the
    /// whole neighbor set is reopened and the recent-visit history is
    /// cleared so the agent is not stuck.
    fn update_mask(&mut self) -> Vec<bool> {
        let neighbors = self.ordered_neighbors();
        let mut mask = vec![false; self.max_actions];
        if neighbors.is_empty() {
            return mask;
        }

        let targets = self.targets();
        let sentinel = self.oracle.sentinel();
        let mut dist_cache = HashMap::with_capacity(targets.len());
        for &t in &targets {
            let d = self.sp_length(self.current, t);
            dist_cache.insert(t, d);
        }

        let mut any_valid = false;
        for (i, &neighbor) in neighbors.iter().enumerate() {
            let lands_on_target =
                self.remaining_waypoints.contains(&neighbor) || (self.remaining_waypoints.is_empty() && neighbor == self.destination);
            if lands_on_target {
                mask[i] = true;
                any_valid = true;
                continue;
            }

            let mut closer = targets.is_empty();
            for &t in &targets {
                let prev_dist = dist_cache[&t];
                let neighbor_dist = self.sp_length(neighbor, t);
                if prev_dist < sentinel && neighbor_dist < sentinel {
                    if neighbor_dist <= prev_dist * PROGRESS_MARGIN {
                        closer = true;
                    }
                } else {
                    closer = true;
                }
                if closer {
                    break;
                }
            }
            if !targets.is_empty() && !closer {
                continue;
            }

            let over_visited = *self.visit_counts.get(&neighbor).unwrap_or(&0) >= VISIT_LIMIT;
            if self.recent_set.contains(&neighbor) || over_visited {
                continue;
            }

            mask[i] = true;
            any_valid = true;
        }

        if !any_valid {
            for slot in mask.iter_mut().take(neighbors.len()) {
                *slot = true;
            }
            self.recent.clear();
            self.recent_set.clear();
        }

        if !mask.iter().any(|&v| v) {
            mask[0] = true;
        }

        mask
    }

    /// Picks a replacement when `action` is out of range or masked out:
    /// prefer landing on a waypoint, then the destination, then any
    /// uniformly-random legal action.
    fn fallback_action(&self, mask: &[bool], neighbors: &[NodeId]) -> usize {
        let valid: Vec<usize> = mask.iter().enumerate().filter(|(_, &v)| v).map(|(i, _)| i).collect();
        if valid.is_empty() {
            return 0;
        }

        for &idx in &valid {
            if idx < neighbors.len() && self.remaining_waypoints.contains(&neighbors[idx]) {
                return idx;
            }
        }
        if self.remaining_waypoints.is_empty() {
            for &idx in &valid {
                if idx < neighbors.len() && neighbors[idx] == self.destination {
                    return idx;
                }
            }
        }

        valid[rand::rng().random_range(0..valid.len())]
    }

    fn track_visit(&mut self, node: NodeId) {
        self.recent.push_back(node);
        while self.recent.len() > RECENT_WINDOW {
            self.recent.pop_front();
        }
        self.recent_set = self.recent.iter().copied().collect();
        *self.visit_counts.entry(node).or_insert(0) += 1;
    }

    /// Raw (pre-clamp-check) cumulative penalty for over-visiting
    /// `self.current`, clamped at [`CYCLE_PENALTY_FLOOR`].
    fn cycle_penalty(&self) -> f64 {
        let visits = *self.visit_counts.get(&self.current).unwrap_or(&0);
        if visits <= VISIT_LIMIT {
            return 0.0;
        }
        let raw = -self.config.anti_loop_penalty * (visits - VISIT_LIMIT) as f64;
        raw.max(CYCLE_PENALTY_FLOOR)
    }
}

impl<E: StepEnv> StepEnv for MaskingWrapper<E> {
    fn reset(&mut self) -> Result<(Vec<f32>, ResetInfo)> {
        let (obs, mut info) = self.inner.reset()?;
        self.current = info.current_node;
        self.remaining_waypoints = info.remaining_waypoints.clone();
        self.recent.clear();
        self.recent.push_back(self.current);
        self.recent_set = self.recent.iter().copied().collect();
        self.visit_counts.clear();
        self.visit_counts.insert(self.current, 1);

        let mask = self.update_mask();
        info.action_mask = Some(mask);
        Ok((obs, info))
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        let mask = self.update_mask();
        let neighbors = self.ordered_neighbors();
        let original_action = action;
        let chosen_action = if action >= mask.len() || !mask[action] {
            self.fallback_action(&mask, &neighbors)
        } else {
            action
        };
        let masking_applied = chosen_action != original_action;

        let mut outcome = self.inner.step(chosen_action)?;

        self.current = outcome.info.current_node;
        self.remaining_waypoints = outcome.info.remaining_waypoints.clone();
        self.track_visit(self.current);

        let penalty = self.cycle_penalty();
        outcome.reward += penalty;
        if penalty <= CYCLE_PENALTY_FLOOR {
            outcome.truncated = true;
            outcome.info.terminated_reason = Some(TerminatedReason::LoopDetected);
            tracing::trace!(node = self.current, "cycle penalty floor reached, truncating episode");
        }

        outcome.info.action_mask = Some(mask);
        outcome.info.masking_applied = masking_applied;
        outcome.info.original_action = Some(original_action);
        outcome.info.chosen_action = Some(chosen_action);

        Ok(outcome)
    }

    fn observation_shape(&self) -> usize {
        self.inner.observation_shape()
    }

    fn action_count(&self) -> usize {
        self.max_actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, Surface};
    use nav_distance::{Algorithm, WeightKind};
    use nav_env::{EnvConfig, RewardConfig, WaypointNavEnv};
    use nav_graph::GraphBuilder;

    fn attrs(length_m: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m,
            maxspeed: Some(MaxSpeed::Numeric(50.0)),
            lanes: Some(2.0),
            highway: HighwayClass::Residential,
            surface: Surface::Paved,
            oneway: false,
            travel_time_s: Some(length_m / 10.0),
            speed_kph: None,
        }
    }

    fn loopy_graph() -> Arc<Graph> {
        // 0 <-> 1 <-> 2 <-> 0 triangle, plus a spur 2 -> 3 (destination).
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let n1 = b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        let n2 = b.add_node(NodeAttrs { x: 1.0, y: 1.0 });
        let n3 = b.add_node(NodeAttrs { x: 5.0, y: 5.0 });
        b.add_bidirectional_edge(n0, n1, attrs(10.0));
        b.add_bidirectional_edge(n1, n2, attrs(10.0));
        b.add_bidirectional_edge(n2, n0, attrs(10.0));
        b.add_bidirectional_edge(n2, n3, attrs(10.0));
        Arc::new(b.build().unwrap())
    }

    fn make_wrapper(graph: Arc<Graph>, start: NodeId, destination: NodeId) -> MaskingWrapper<WaypointNavEnv> {
        let embeddings = Arc::new(nav_embed::build(&graph));
        let oracle = Arc::new(DistanceOracle::new(graph.clone(), None, WeightKind::TravelTime, Algorithm::AStar));
        let env = WaypointNavEnv::new(
            graph.clone(),
            embeddings,
            oracle.clone(),
            start,
            vec![],
            destination,
            EnvConfig::default(),
            RewardConfig::default(),
        )
        .unwrap();
        let max_actions = (0..graph.node_count() as u32).map(|n| graph.out_degree(n)).max().unwrap().max(1);
        MaskingWrapper::new(env, graph, oracle, destination, max_actions, MaskConfig::default())
    }

    #[test]
    fn reset_populates_action_mask() {
        let g = loopy_graph();
        let mut wrapper = make_wrapper(g, 0, 3);
        let (_, info) = wrapper.reset().unwrap();
        let mask = info.action_mask.unwrap();
        assert!(mask.iter().any(|&v| v));
    }

    #[test]
    fn invalid_action_index_is_substituted() {
        let g = loopy_graph();
        let mut wrapper = make_wrapper(g, 0, 3);
        wrapper.reset().unwrap();
        let outcome = wrapper.step(999).unwrap();
        assert!(outcome.info.masking_applied);
        assert_eq!(outcome.info.original_action, Some(999));
        assert!(outcome.info.chosen_action.unwrap() < wrapper.action_count());
    }

    #[test]
    fn repeated_revisits_eventually_truncate_with_loop_detected() {
        let g = loopy_graph();
        let mut wrapper = make_wrapper(g, 0, 3);
        wrapper.reset().unwrap();

        // Bounce back and forth on the 0<->1 edge (action 0 is always the
        // first neighbor) until the cycle penalty floor trips.
        let mut last = None;
        for _ in 0..50 {
            let outcome = wrapper.step(0).unwrap();
            let truncated = outcome.truncated;
            last = Some(outcome);
            if truncated {
                break;
            }
        }
        let last = last.unwrap();
        assert!(last.truncated);
        assert_eq!(last.info.terminated_reason, Some(TerminatedReason::LoopDetected));
    }

    #[test]
    fn destination_neighbor_always_unmasked() {
        let g = loopy_graph();
        let mut wrapper = make_wrapper(g, 2, 3);
        let (_, info) = wrapper.reset().unwrap();
        let mask = info.action_mask.unwrap();
        let neighbors = wrapper.ordered_neighbors();
        let dest_idx = neighbors.iter().position(|&n| n == 3).unwrap();
        assert!(mask[dest_idx]);
    }
}
