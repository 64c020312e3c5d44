//! Single-pair fallback search, used when a pair is absent from the
//! precomputed [`crate::DistanceTable`]. Grounded on the bidirectional
//! Dijkstra in `nbg_ch/query.rs`, simplified to a one-directional search
//! since the oracle has no contraction hierarchy to exploit and needs to
//! support an A* Euclidean heuristic the CH query does not.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nav_core::NodeId;
use nav_graph::Graph;

use crate::{edge_cost, WeightKind};

#[derive(Copy, Clone, PartialEq)]
struct HeapEntry {
    priority: f64,
    node: NodeId,
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest priority.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Plain Dijkstra from `source` to `target`. Returns `None` if
/// disconnected.
pub fn dijkstra(graph: &Graph, source: NodeId, target: NodeId, weight: WeightKind) -> Option<f64> {
    run(graph, source, target, weight, |_, _| 0.0)
}

/// A* from `source` to `target` using Euclidean distance on node
/// coordinates as the heuristic.
pub fn astar(graph: &Graph, source: NodeId, target: NodeId, weight: WeightKind) -> Option<f64> {
    run(graph, source, target, weight, |g, n| g.euclidean_distance(n, target))
}

fn run(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
    weight: WeightKind,
    heuristic: impl Fn(&Graph, NodeId) -> f64,
) -> Option<f64> {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut visited = vec![false; n];
    dist[source as usize] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry {
        priority: heuristic(graph, source),
        node: source,
    });

    while let Some(HeapEntry { node: u, .. }) = heap.pop() {
        if u == target {
            return Some(dist[u as usize]);
        }
        if visited[u as usize] {
            continue;
        }
        visited[u as usize] = true;

        let base = dist[u as usize];
        for &v in graph.neighbors(u) {
            if visited[v as usize] {
                continue;
            }
            let Some(cost) = edge_cost(graph, u, v, weight) else {
                continue;
            };
            let candidate = base + cost;
            if candidate < dist[v as usize] {
                dist[v as usize] = candidate;
                heap.push(HeapEntry {
                    priority: candidate + heuristic(graph, v),
                    node: v,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::{EdgeAttrs, HighwayClass, NodeAttrs, Surface};
    use nav_graph::GraphBuilder;

    fn attrs(length_m: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m,
            maxspeed: None,
            lanes: None,
            highway: HighwayClass::Residential,
            surface: Surface::Paved,
            oneway: false,
            travel_time_s: Some(length_m),
            speed_kph: None,
        }
    }

    #[test]
    fn astar_finds_detour_shorter_than_direct_edge() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let c = b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        let detour = b.add_node(NodeAttrs { x: 0.5, y: 0.0 });
        b.add_edge(a, c, attrs(100.0));
        b.add_edge(a, detour, attrs(1.0));
        b.add_edge(detour, c, attrs(1.0));
        let g = b.build().unwrap();

        let d = astar(&g, a, c, WeightKind::Length).unwrap();
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn dijkstra_returns_none_when_disconnected() {
        let mut b = GraphBuilder::new();
        let a = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let c = b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        let g = b.build().unwrap();
        assert!(dijkstra(&g, a, c, WeightKind::Length).is_none());
    }
}
