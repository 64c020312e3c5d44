//! `StepEnv`: a Gymnasium-shaped environment trait that both the base
//! navigation environment and the masking wrapper implement, so wrappers
//! compose by holding a `Box<dyn StepEnv>` instead of inheriting.

use crate::{NodeId, Result};

/// Outcome of one `StepEnv::step` call. Mirrors Gymnasium's five-tuple
/// (`obs, reward, terminated, truncated, info`) rather than the older
/// `done` single flag, so callers can distinguish "reached a terminal
/// state of the MDP" from "cut short by an external limit".
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Why an episode ended, surfaced in [`StepInfo::terminated_reason`] only
/// once `terminated || truncated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatedReason {
    DestinationReached,
    MaxSteps,
    MaxWaitSteps,
    DeadEnd,
    LoopDetected,
}

/// The per-step `info` record, as a tagged struct rather than a
/// dynamically-typed map: every field is always present, with
/// `Option`/empty values standing in for "not applicable this step"
/// instead of a missing key.
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Full visited-node history so far, including the current node.
    pub path: Vec<NodeId>,
    pub remaining_waypoints: Vec<NodeId>,
    pub current_node: NodeId,
    pub steps_taken: u32,
    /// Cumulative traversal cost since the last reset.
    pub total_cost: f64,
    /// Mask over the current node's actions, if a masking wrapper is in
    /// the stack. `None` for the unwrapped environment.
    pub action_mask: Option<Vec<bool>>,
    pub masking_applied: bool,
    pub original_action: Option<usize>,
    pub chosen_action: Option<usize>,
    pub terminated_reason: Option<TerminatedReason>,
}

/// Info returned alongside the initial observation from [`StepEnv::reset`].
#[derive(Debug, Clone, Default)]
pub struct ResetInfo {
    pub current_node: NodeId,
    pub remaining_waypoints: Vec<NodeId>,
    pub optimal_steps_to_destination: Option<u32>,
    /// Action mask for the initial state, if a masking wrapper is in the
    /// stack. `None` for the unwrapped environment.
    pub action_mask: Option<Vec<bool>>,
}

/// A steppable MDP environment over a fixed discrete action space.
///
/// `action_count` and `observation_shape` must stay constant for the
/// lifetime of a value: callers size their policy network once, at
/// construction, and never query again.
pub trait StepEnv {
    /// Resets episode state and returns the initial observation plus
    /// reset info (current node, reordered waypoints, the initial action
    /// mask if any wrapper produces one).
    fn reset(&mut self) -> Result<(Vec<f32>, ResetInfo)>;

    /// Applies `action` (an index into `0..action_count()`) and advances
    /// the episode by one step.
    fn step(&mut self, action: usize) -> Result<StepOutcome>;

    /// Length of the observation vector returned by `reset`/`step`.
    fn observation_shape(&self) -> usize;

    /// Size of the discrete action space.
    fn action_count(&self) -> usize;
}
