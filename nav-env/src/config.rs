//! Typed configuration for the navigation environment, replacing the
//! Python original's loose `env_cfg`/`rew_cfg` dicts with dynamic
//! attributes. `Default` supplies every numeric default the original
//! environment used; loading from TOML/JSON is a convenience layered on
//! top by `nav-cli`, not the primary API.

use nav_distance::{Algorithm, WeightKind};

/// Either a fixed step budget or "auto", resolved against the graph's
/// node count at construction (`N`, clamped to 1000 for large graphs).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxSteps {
    Auto,
    Fixed(u32),
}

impl MaxSteps {
    /// Resolves against a graph's node count: `min(max(1, n), 1000)`.
    pub fn resolve(self, node_count: usize) -> u32 {
        match self {
            MaxSteps::Auto => (node_count.max(1) as u32).min(1000),
            MaxSteps::Fixed(n) => n,
        }
    }
}

impl Default for MaxSteps {
    fn default() -> Self {
        MaxSteps::Auto
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvConfig {
    pub max_steps: MaxSteps,
    pub max_wait_steps: MaxSteps,
    pub shortest_path_algorithm: Algorithm,
    pub weight_name: WeightKind,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_steps: MaxSteps::Auto,
            max_wait_steps: MaxSteps::Auto,
            shortest_path_algorithm: Algorithm::AStar,
            weight_name: WeightKind::TravelTime,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardConfig {
    pub move_cost_coef: f64,
    pub progress_coef: f64,
    pub waypoint_bonus: f64,
    pub destination_bonus: f64,
    pub no_progress_penalty: f64,
    pub anti_loop_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            move_cost_coef: 0.01,
            progress_coef: 5.0,
            waypoint_bonus: 50.0,
            destination_bonus: 200.0,
            no_progress_penalty: 2.0,
            anti_loop_penalty: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_max_steps_clamps_to_1000() {
        assert_eq!(MaxSteps::Auto.resolve(5_000), 1000);
    }

    #[test]
    fn auto_max_steps_tracks_small_graphs() {
        assert_eq!(MaxSteps::Auto.resolve(50), 50);
    }

    #[test]
    fn fixed_max_steps_ignores_node_count() {
        assert_eq!(MaxSteps::Fixed(7).resolve(1), 7);
    }
}
