//! `nav-env` — C3, the waypoint-navigation MDP.
//!
//! [`WaypointNavEnv`] implements [`nav_core::StepEnv`] directly over a
//! [`nav_graph::Graph`]; `nav-mask` wraps it (rather than subclassing it)
//! to add action masking and cycle prevention, a composition-over-
//! inheritance redesign of the original's `ActionMaskingWrapper(gym.Wrapper)`.

pub mod config;
pub mod env;
pub mod observation;

pub use config::{EnvConfig, MaxSteps, RewardConfig};
pub use env::WaypointNavEnv;
pub use observation::{observation_dim, EfficiencyInfo};
