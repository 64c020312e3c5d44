//! `nav-embed` — C2, the deterministic per-node embedding builder.
//!
//! Ported feature-for-feature from the original `build_node_embeddings`:
//! each node gets a fixed-length vector of structural features (position,
//! degree statistics, neighbor-degree summary), edge-aggregated road
//! features (length, maxspeed, lanes, highway class, surface, oneway,
//! travel time — all averaged over the node's incident edges), and two
//! context features (2-hop intersection density, average road hierarchy).
//! Runs once per graph; the result is indexed by node id for the lifetime
//! of the environment.

use nav_core::NodeId;
use nav_graph::Graph;

/// Dimensionality of one node's embedding (13 structural + 7
/// edge-aggregated + 2 contextual features).
pub const EMBEDDING_DIM: usize = 22;

pub type Embedding = [f32; EMBEDDING_DIM];

/// Default speed (km/h) used to derive travel time for edges that carry
/// neither an explicit travel time nor a usable speed/maxspeed value.
const DEFAULT_SPEED_KMH: f64 = 50.0;

/// Intersection-density BFS radius, in hops.
const INTERSECTION_RADIUS_HOPS: usize = 2;

struct GlobalStats {
    x_min: f64,
    x_range: f64,
    y_min: f64,
    y_range: f64,
    max_degree: f64,
    total_degree: Vec<u32>,
    network_density: f64,
    length_max: f64,
    maxspeed_max: f64,
    lanes_max: f64,
    travel_time_max: f64,
}

fn global_stats(graph: &Graph) -> GlobalStats {
    let n = graph.node_count();

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for node in graph.nodes() {
        x_min = x_min.min(node.x);
        x_max = x_max.max(node.x);
        y_min = y_min.min(node.y);
        y_max = y_max.max(node.y);
    }
    if n == 0 {
        x_min = 0.0;
        x_max = 0.0;
        y_min = 0.0;
        y_max = 0.0;
    }

    let mut in_degree = vec![0u32; n];
    let mut length_max = 1.0f64;
    let mut maxspeed_max = 1.0f64;
    let mut lanes_max = 1.0f64;
    let mut travel_time_max = 1.0f64;

    for u in 0..n as u32 {
        for (i, &v) in graph.neighbors(u).iter().enumerate() {
            in_degree[v as usize] += 1;
            let attrs = &graph.neighbor_edges(u)[i];
            length_max = length_max.max(attrs.length_m);
            if let Some(ms) = attrs.maxspeed_kmh() {
                maxspeed_max = maxspeed_max.max(ms);
            }
            if let Some(lanes) = attrs.lanes {
                lanes_max = lanes_max.max(lanes);
            }
            travel_time_max = travel_time_max.max(attrs.travel_time(DEFAULT_SPEED_KMH));
        }
    }

    let total_degree: Vec<u32> = (0..n as u32)
        .map(|u| graph.out_degree(u) as u32 + in_degree[u as usize])
        .collect();
    let max_degree = total_degree.iter().copied().max().unwrap_or(1).max(1) as f64;

    let total_edges = graph.edge_count() as f64;
    let denom = (n as f64) * ((n as f64) - 1.0);
    let network_density = if denom > 0.0 { total_edges / denom } else { 0.0 };

    GlobalStats {
        x_min,
        x_range: if x_max > x_min { x_max - x_min } else { 1.0 },
        y_min,
        y_range: if y_max > y_min { y_max - y_min } else { 1.0 },
        max_degree,
        total_degree,
        network_density,
        length_max,
        maxspeed_max,
        lanes_max,
        travel_time_max,
    }
}

/// Count of unique nodes reachable within `INTERSECTION_RADIUS_HOPS` hops
/// of `node` (excluding itself), normalized the way the original
/// heuristic does: `count / (radius * 10)`.
fn intersection_density(graph: &Graph, node: NodeId) -> f64 {
    use std::collections::HashSet;

    let mut visited: HashSet<NodeId> = HashSet::from([node]);
    let mut frontier: Vec<NodeId> = vec![node];

    for _ in 0..INTERSECTION_RADIUS_HOPS {
        let mut next = Vec::new();
        for &n in &frontier {
            for &neighbor in graph.neighbors(n) {
                if visited.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    (visited.len() as f64 - 1.0) / (INTERSECTION_RADIUS_HOPS as f64 * 10.0)
}

/// Builds one embedding per node, in node-id order. Runs once; the
/// result should be cached alongside the graph it was built from.
pub fn build(graph: &Graph) -> Vec<Embedding> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let stats = global_stats(graph);

    (0..n as u32)
        .map(|node| embed_one(graph, &stats, node))
        .collect()
}

fn embed_one(graph: &Graph, stats: &GlobalStats, node: NodeId) -> Embedding {
    let n = graph.node_count() as f64;
    let pos = graph.position(node);

    let x = (pos.x - stats.x_min) / stats.x_range;
    let y = (pos.y - stats.y_min) / stats.y_range;

    let out_degree = graph.out_degree(node) as f64;
    let total_degree = stats.total_degree[node as usize] as f64;
    let in_degree = total_degree - out_degree;
    let deg_norm = total_degree / stats.max_degree;

    let neighbors = graph.neighbors(node);
    let neighbor_count = neighbors.len() as f64;
    let neighbor_degs: Vec<f64> = if neighbors.is_empty() {
        vec![0.0]
    } else {
        neighbors
            .iter()
            .map(|&nb| stats.total_degree[nb as usize] as f64)
            .collect()
    };
    let avg_neighbor_deg = mean(&neighbor_degs);
    let max_neighbor_deg = neighbor_degs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_neighbor_deg = neighbor_degs.iter().cloned().fold(f64::INFINITY, f64::min);
    let neighbor_deg_std = std_dev(&neighbor_degs, avg_neighbor_deg);

    let degree_centrality = if n > 1.0 { total_degree / (n - 1.0) } else { 0.0 };
    let local_density_proxy = neighbor_count / n;

    let edges = graph.neighbor_edges(node);
    let (
        length_avg,
        maxspeed_norm_avg,
        lanes_norm_avg,
        highway_code_avg,
        surface_score_avg,
        oneway_flag_avg,
        travel_time_norm_avg,
    ) = if edges.is_empty() {
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    } else {
        let count = edges.len() as f64;
        let length_avg = edges.iter().map(|e| e.length_m).sum::<f64>() / count / stats.length_max;
        let maxspeed_norm_avg = edges
            .iter()
            .map(|e| e.maxspeed_kmh().map_or(0.0, |v| v / stats.maxspeed_max))
            .sum::<f64>()
            / count;
        let lanes_norm_avg = edges
            .iter()
            .map(|e| e.lanes.map_or(0.0, |v| v / stats.lanes_max))
            .sum::<f64>()
            / count;
        let highway_code_avg = edges.iter().map(|e| e.highway.hierarchy_norm()).sum::<f64>() / count;
        let surface_score_avg = edges.iter().map(|e| e.surface.score()).sum::<f64>() / count;
        let oneway_flag_avg = edges.iter().map(|e| if e.oneway { 1.0 } else { 0.0 }).sum::<f64>() / count;
        let travel_time_norm_avg = edges
            .iter()
            .map(|e| e.travel_time(DEFAULT_SPEED_KMH) / stats.travel_time_max)
            .sum::<f64>()
            / count;
        (
            length_avg,
            maxspeed_norm_avg,
            lanes_norm_avg,
            highway_code_avg,
            surface_score_avg,
            oneway_flag_avg,
            travel_time_norm_avg,
        )
    };

    let intersection_density = intersection_density(graph, node);
    let road_hierarchy = highway_code_avg;

    let feats = [
        x,
        y,
        deg_norm,
        in_degree,
        out_degree,
        neighbor_count,
        avg_neighbor_deg,
        max_neighbor_deg,
        min_neighbor_deg,
        neighbor_deg_std,
        degree_centrality,
        local_density_proxy,
        stats.network_density,
        length_avg,
        maxspeed_norm_avg,
        lanes_norm_avg,
        highway_code_avg,
        surface_score_avg,
        oneway_flag_avg,
        travel_time_norm_avg,
        intersection_density,
        road_hierarchy,
    ];

    let mut out = [0.0f32; EMBEDDING_DIM];
    for (dst, src) in out.iter_mut().zip(feats.iter()) {
        *dst = *src as f32;
    }
    out
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn std_dev(xs: &[f64], mean: f64) -> f64 {
    (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, Surface};
    use nav_graph::GraphBuilder;

    fn attrs(length_m: f64) -> EdgeAttrs {
        EdgeAttrs {
            length_m,
            maxspeed: Some(MaxSpeed::Numeric(50.0)),
            lanes: Some(2.0),
            highway: HighwayClass::Residential,
            surface: Surface::Paved,
            oneway: false,
            travel_time_s: None,
            speed_kph: None,
        }
    }

    #[test]
    fn dimension_is_22() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let n1 = b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        b.add_bidirectional_edge(n0, n1, attrs(10.0));
        let g = b.build().unwrap();
        let emb = build(&g);
        assert_eq!(emb.len(), 2);
        assert_eq!(emb[0].len(), EMBEDDING_DIM);
    }

    #[test]
    fn coordinates_normalize_to_unit_range() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let n1 = b.add_node(NodeAttrs { x: 10.0, y: 20.0 });
        b.add_bidirectional_edge(n0, n1, attrs(5.0));
        let g = b.build().unwrap();
        let emb = build(&g);
        assert!((emb[0][0] - 0.0).abs() < 1e-6);
        assert!((emb[1][0] - 1.0).abs() < 1e-6);
        assert!((emb[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn isolated_node_has_zero_edge_features() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        let g = b.build().unwrap();
        let emb = build(&g);
        // edge-aggregated features start at index 13 and run for 7 entries
        assert!(emb[n0 as usize][13..20].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_node_graph_does_not_panic() {
        let mut b = GraphBuilder::new();
        b.add_node(NodeAttrs { x: 5.0, y: 5.0 });
        let g = b.build().unwrap();
        let emb = build(&g);
        assert_eq!(emb.len(), 1);
    }
}
