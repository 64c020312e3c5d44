//! Shared error type for the `nav-*` crates.
//!
//! Sub-crates convert their own failure cases into [`NavError`] via `From`
//! impls, or keep local enums and wrap `NavError` as one variant.

use thiserror::Error;

/// Construction-time and configuration failures. In-episode termination
/// (destination reached, max steps, loop detected) is never represented
/// here — it is ordinary `StepOutcome` data, not an error.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("unknown {role} node {node}")]
    UnknownNode { node: u32, role: &'static str },

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("waypoint list is empty")]
    EmptyWaypoints,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("node {node} is unreachable from {from}")]
    Unreachable { from: u32, node: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `nav-*` crates.
pub type Result<T> = std::result::Result<T, NavError>;
