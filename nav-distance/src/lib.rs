//! `nav-distance` — C1, the shortest-path distance oracle.
//!
//! Backed primarily by a precomputed `node -> node -> length` table; any
//! pair missing from the table falls back to an on-demand single-pair
//! search (A* with a Euclidean heuristic, or plain Dijkstra) whose result
//! is inserted into a bounded LRU so repeated queries for the same pair
//! stay cheap. Disconnected pairs never produce `inf`: they resolve to the
//! graph's node count, an effective-infinity sentinel comparisons can use
//! safely.

mod search;
mod table;

pub use table::DistanceTable;

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use nav_core::NodeId;
use nav_graph::Graph;
use parking_lot::Mutex;

/// Edge-weight attribute the oracle (and the environment) cost traversals
/// by. Mirrors the original environment's `weight_name` configuration
/// knob.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    TravelTime,
    Length,
}

/// Single-pair fallback search algorithm, selected via the
/// `shortest_path_algorithm` configuration knob.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    AStar,
    Dijkstra,
}

/// Default speed (km/h) `EdgeAttrs::travel_time` falls back to when an
/// edge carries neither `travel_time_s`, `speed_kph`, nor a parseable
/// `maxspeed`.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;

/// Default LRU capacity for the oracle's on-demand search cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 50_000;

/// Returns the edge cost of the minimum-cost parallel edge `from -> to`
/// under `weight`, or `None` if no such edge exists.
pub fn edge_cost(graph: &Graph, from: NodeId, to: NodeId, weight: WeightKind) -> Option<f64> {
    graph
        .neighbors(from)
        .iter()
        .zip(graph.neighbor_edges(from))
        .filter(|(&head, _)| head == to)
        .map(|(_, attrs)| match weight {
            WeightKind::TravelTime => attrs.travel_time(DEFAULT_SPEED_KMH),
            WeightKind::Length => attrs.length_m,
        })
        .fold(None, |acc, c| Some(acc.map_or(c, |a: f64| a.min(c))))
}

/// Read-only shortest-path oracle. `length` takes `&self`: the LRU cache
/// behind it uses interior synchronization (a `parking_lot::Mutex`) so
/// many worker threads can share one oracle over a read-only graph. Holds
/// the graph by `Arc` rather than by reference so it composes with the
/// environment and wrapper crates without threading a lifetime through
/// every type in the workspace — the graph is read-only and may be shared
/// across workers for the lifetime of a training run.
pub struct DistanceOracle {
    graph: Arc<Graph>,
    table: Option<DistanceTable>,
    weight: WeightKind,
    algorithm: Algorithm,
    cache: Mutex<LruCache<(NodeId, NodeId), f64>>,
}

impl DistanceOracle {
    pub fn new(
        graph: Arc<Graph>,
        table: Option<DistanceTable>,
        weight: WeightKind,
        algorithm: Algorithm,
    ) -> Self {
        Self::with_cache_capacity(graph, table, weight, algorithm, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(
        graph: Arc<Graph>,
        table: Option<DistanceTable>,
        weight: WeightKind,
        algorithm: Algorithm,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity.max(1)).unwrap();
        Self {
            graph,
            table,
            weight,
            algorithm,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn table(&self) -> Option<&DistanceTable> {
        self.table.as_ref()
    }

    /// Effective-infinity sentinel returned for disconnected pairs.
    pub fn sentinel(&self) -> f64 {
        self.graph.node_count() as f64
    }

    /// Shortest-path length from `u` to `v`. Never fails: unknown nodes
    /// and disconnected pairs both degrade to [`Self::sentinel`].
    pub fn length(&self, u: NodeId, v: NodeId) -> f64 {
        if u == v {
            return 0.0;
        }
        if !self.graph.contains(u) || !self.graph.contains(v) {
            return self.sentinel();
        }
        if let Some(table) = &self.table {
            if let Some(d) = table.get(u, v) {
                return d;
            }
        }
        if let Some(d) = self.cache.lock().get(&(u, v)).copied() {
            return d;
        }

        let computed = match self.algorithm {
            Algorithm::AStar => search::astar(&self.graph, u, v, self.weight),
            Algorithm::Dijkstra => search::dijkstra(&self.graph, u, v, self.weight),
        };
        let d = computed.unwrap_or_else(|| self.sentinel());
        tracing::trace!(from = u, to = v, distance = d, "oracle cache miss, computed on demand");
        self.cache.lock().put((u, v), d);
        d
    }
}
