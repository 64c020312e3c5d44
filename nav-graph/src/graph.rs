//! CSR (compressed sparse row) road network graph.
//!
//! Neighbor order is fixed at build time and never reshuffled afterward:
//! neighbor `i` of node `u` is always `heads[offsets[u] + i]` for the life
//! of the `Graph` value, which is what lets the navigation environment use
//! a plain neighbor index as its action space (see `nav-env`).

use nav_core::{EdgeAttrs, NavError, NodeAttrs, NodeId, Result};

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<NodeAttrs>,
    offsets: Vec<u32>,
    heads: Vec<u32>,
    edge_attrs: Vec<EdgeAttrs>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.heads.len()
    }

    pub fn position(&self, node: NodeId) -> NodeAttrs {
        self.nodes[node as usize]
    }

    pub fn nodes(&self) -> &[NodeAttrs] {
        &self.nodes
    }

    /// Out-neighbors of `node`, in stable build-time order.
    pub fn neighbors(&self, node: NodeId) -> &[u32] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.heads[start..end]
    }

    /// Edge attributes parallel to `neighbors(node)`.
    pub fn neighbor_edges(&self, node: NodeId) -> &[EdgeAttrs] {
        let start = self.offsets[node as usize] as usize;
        let end = self.offsets[node as usize + 1] as usize;
        &self.edge_attrs[start..end]
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    /// The `i`th out-edge of `node`, as `(target, attrs)`.
    pub fn nth_edge(&self, node: NodeId, i: usize) -> (NodeId, &EdgeAttrs) {
        let start = self.offsets[node as usize] as usize;
        (self.heads[start + i], &self.edge_attrs[start + i])
    }

    /// Straight-line distance between two nodes in the graph's own
    /// coordinate units. Used as the A* heuristic and as a fallback
    /// distance estimate when no path exists.
    pub fn euclidean_distance(&self, a: NodeId, b: NodeId) -> f64 {
        let pa = self.position(a);
        let pb = self.position(b);
        ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        (node as usize) < self.nodes.len()
    }

    fn require_node(&self, node: NodeId, role: &'static str) -> Result<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(NavError::UnknownNode { node, role })
        }
    }

    pub fn check_node(&self, node: NodeId, role: &'static str) -> Result<()> {
        self.require_node(node, role)
    }
}

/// Builds a [`Graph`] from an incremental edge list, then compacts it into
/// CSR arrays once at `build()`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeAttrs>,
    adjacency: Vec<Vec<(u32, EdgeAttrs)>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, attrs: NodeAttrs) -> NodeId {
        let id = self.nodes.len() as u32;
        self.nodes.push(attrs);
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds a directed edge `from -> to`. Callers that want a
    /// non-`oneway` road add both directions explicitly, mirroring how the
    /// original tooling expands an undirected `networkx.MultiDiGraph` edge
    /// into two directed CSR entries.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) {
        self.adjacency[from as usize].push((to, attrs));
    }

    /// Convenience for a two-way road segment: adds `a -> b` and `b -> a`
    /// with the same attributes.
    pub fn add_bidirectional_edge(&mut self, a: NodeId, b: NodeId, attrs: EdgeAttrs) {
        self.add_edge(a, b, attrs.clone());
        self.add_edge(b, a, attrs);
    }

    pub fn build(self) -> Result<Graph> {
        if self.nodes.is_empty() {
            return Err(NavError::EmptyGraph);
        }

        let n = self.nodes.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut heads = Vec::new();
        let mut edge_attrs = Vec::new();

        offsets.push(0u32);
        for adj in &self.adjacency {
            for (to, attrs) in adj {
                heads.push(*to);
                edge_attrs.push(attrs.clone());
            }
            offsets.push(heads.len() as u32);
        }

        let graph = Graph {
            nodes: self.nodes,
            offsets,
            heads,
            edge_attrs,
        };

        for node in 0..n as u32 {
            for &neighbor in graph.neighbors(node) {
                if !graph.contains(neighbor) {
                    return Err(NavError::UnknownNode {
                        node: neighbor,
                        role: "edge target",
                    });
                }
            }
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::{HighwayClass, MaxSpeed, Surface};

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
    fn neighbor_order_is_stable() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let n1 = b.add_node(NodeAttrs { x: 1.0, y: 0.0 });
        let n2 = b.add_node(NodeAttrs { x: 0.0, y: 1.0 });
        b.add_edge(n0, n2, attrs(10.0));
        b.add_edge(n0, n1, attrs(5.0));
        let g = b.build().unwrap();
        assert_eq!(g.neighbors(n0), &[n2, n1]);
    }

    #[test]
    fn empty_graph_rejected() {
        let b = GraphBuilder::new();
        assert!(matches!(b.build(), Err(NavError::EmptyGraph)));
    }

    #[test]
    fn dangling_edge_rejected() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        b.add_edge(n0, 99, attrs(1.0));
        assert!(b.build().is_err());
    }

    #[test]
    fn euclidean_distance_matches_pythagoras() {
        let mut b = GraphBuilder::new();
        let n0 = b.add_node(NodeAttrs { x: 0.0, y: 0.0 });
        let n1 = b.add_node(NodeAttrs { x: 3.0, y: 4.0 });
        let g = b.build().unwrap();
        assert!((g.euclidean_distance(n0, n1) - 5.0).abs() < 1e-9);
    }
}
