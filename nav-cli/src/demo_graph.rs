//! A synthetic grid road network used by the demo binary. OSM ingestion is
//! explicitly out of scope here — this is just enough of a graph to
//! exercise C1 through C5 end to end without external data.

use nav_core::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, NodeId, Surface};
use nav_graph::{Graph, GraphBuilder};

pub fn grid(side: usize, cell_size_m: f64) -> Graph {
    let mut b = GraphBuilder::new();
    let mut ids = vec![vec![0u32; side]; side];
    for row in 0..side {
        for col in 0..side {
            ids[row][col] = b.add_node(NodeAttrs {
                x: col as f64 * cell_size_m,
                y: row as f64 * cell_size_m,
            });
        }
    }

    // Tagged as a string, same as a `maxspeed="50 km/h"` OSM way attribute
    // would arrive, so the demo exercises the string-parsing path rather
    // than only ever handing the environment an already-numeric value.
    let attrs = EdgeAttrs {
        length_m: cell_size_m,
        maxspeed: Some(MaxSpeed::Tagged("50 km/h".to_string())),
        lanes: Some(2.0),
        highway: HighwayClass::Residential,
        surface: Surface::Paved,
        oneway: false,
        travel_time_s: None,
        speed_kph: None,
    };

    for row in 0..side {
        for col in 0..side {
            if col + 1 < side {
                b.add_bidirectional_edge(ids[row][col], ids[row][col + 1], attrs.clone());
            }
            if row + 1 < side {
                b.add_bidirectional_edge(ids[row][col], ids[row + 1][col], attrs.clone());
            }
        }
    }

    b.build().expect("grid graph is always well-formed")
}

pub fn corner_node(side: usize, row: usize, col: usize) -> NodeId {
    (row * side + col) as u32
}
