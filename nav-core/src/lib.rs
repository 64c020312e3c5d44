//! `nav-core` — foundational types shared by every `nav-*` crate.
//!
//! This crate has no `nav-*` dependencies and minimal external ones (only
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                      |
//! |-------------|------------------------------------------------|
//! | [`error`]    | `NavError`, `Result`                           |
//! | [`road`]     | `HighwayClass`, `Surface`, `MaxSpeed`, `NodeAttrs`, `EdgeAttrs` |
//! | [`step_env`] | `StepEnv` trait, `StepOutcome`, `StepInfo`      |

pub mod error;
pub mod road;
pub mod step_env;

pub use error::{NavError, Result};
pub use road::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, Surface};
pub use step_env::{ResetInfo, StepEnv, StepInfo, StepOutcome, TerminatedReason};

/// Stable node identifier, an index into the graph's CSR arrays.
pub type NodeId = u32;
