//! `nav-graph` — the compressed sparse row (CSR) road network graph shared
//! by every other `nav-*` crate.
//!
//! # What lives here
//!
//! | Module     | Contents                                    |
//! |------------|----------------------------------------------|
//! | [`graph`]  | `Graph`, `GraphBuilder`                      |

pub mod graph;

pub use graph::{Graph, GraphBuilder};
