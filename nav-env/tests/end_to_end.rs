//! End-to-end scenarios for the MDP's behavior, run against the bare
//! (unwrapped) environment the way a unit test of the original
//! `WaypointNavigationEnv` would.

use std::sync::Arc;

use nav_core::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, StepEnv, Surface, TerminatedReason};
use nav_distance::{Algorithm, DistanceOracle, WeightKind};
use nav_env::{EnvConfig, RewardConfig, WaypointNavEnv};
use nav_graph::{Graph, GraphBuilder};

fn corridor_attrs() -> EdgeAttrs {
    EdgeAttrs {
        length_m: 10.0,
        maxspeed: Some(MaxSpeed::Numeric(36.0)),
        lanes: Some(1.0),
        highway: HighwayClass::Residential,
        surface: Surface::Paved,
        oneway: false,
        travel_time_s: Some(1.0),
        speed_kph: None,
    }
}

fn env_for(graph: Arc<Graph>, start: u32, waypoints: Vec<u32>, destination: u32) -> WaypointNavEnv {
    let embeddings = Arc::new(nav_embed::build(&graph));
    let oracle = Arc::new(DistanceOracle::new(graph.clone(), None, WeightKind::TravelTime, Algorithm::AStar));
    WaypointNavEnv::new(
        graph,
        embeddings,
        oracle,
        start,
        waypoints,
        destination,
        EnvConfig::default(),
        RewardConfig::default(),
    )
    .unwrap()
}

/// Builds a bidirectional line graph with every node's forward edge
/// added before its backward edge, so action `0` is always "step toward
/// the higher-indexed node". `GraphBuilder` preserves per-node insertion
/// order, and interleaving forward/backward edges pair-by-pair (as
/// `add_bidirectional_edge` does) would instead make the *backward*
/// neighbor of an interior node come first.
fn build_corridor(b: &mut GraphBuilder, nodes: &[u32]) {
    for w in nodes.windows(2) {
        b.add_edge(w[0], w[1], corridor_attrs());
    }
    for w in nodes.windows(2) {
        b.add_edge(w[1], w[0], corridor_attrs());
    }
}

/// Scenario 1: a straight 5-node corridor, no waypoints. Expects 4
/// steps, the path [0,1,2,3,4], a destination_reached termination, and
/// positive progress reward at every step plus the destination bonus on
/// the last.
#[test]
fn straight_corridor_no_waypoints() {
    let mut b = GraphBuilder::new();
    let nodes: Vec<_> = (0..5).map(|i| b.add_node(NodeAttrs { x: i as f64 * 10.0, y: 0.0 })).collect();
    build_corridor(&mut b, &nodes);
    let graph = Arc::new(b.build().unwrap());

    let mut env = env_for(graph, 0, vec![], 4);
    let (_, reset_info) = env.reset().unwrap();
    assert!(reset_info.remaining_waypoints.is_empty());

    let mut path = vec![0u32];
    let mut rewards = Vec::new();
    let mut last = None;
    for _ in 0..4 {
        let outcome = env.step(0).unwrap();
        path.push(outcome.info.current_node);
        rewards.push(outcome.reward);
        last = Some(outcome);
    }

    assert_eq!(path, vec![0, 1, 2, 3, 4]);
    assert!(rewards.iter().take(3).all(|&r| r > 0.0), "every non-final step should show positive progress: {rewards:?}");
    let last = last.unwrap();
    assert!(last.terminated);
    assert_eq!(last.info.terminated_reason, Some(TerminatedReason::DestinationReached));
    assert!(last.reward > RewardConfig::default().destination_bonus - 1.0);
}

/// Scenario 2: the same corridor plus a detour edge 2-5 (length 10).
/// With waypoint [5] and destination 4, the agent must visit node 5
/// before the destination counts: path [0,1,2,5,2,3,4], waypoint bonus
/// on the step that reaches 5, destination bonus on the last step.
#[test]
fn single_waypoint_detour() {
    let mut b = GraphBuilder::new();
    let nodes: Vec<_> = (0..5).map(|i| b.add_node(NodeAttrs { x: i as f64 * 10.0, y: 0.0 })).collect();
    build_corridor(&mut b, &nodes);
    let detour = b.add_node(NodeAttrs { x: 20.0, y: 10.0 });
    b.add_bidirectional_edge(nodes[2], detour, corridor_attrs());
    let graph = Arc::new(b.build().unwrap());

    let mut env = env_for(graph, 0, vec![detour], 4);
    let (_, reset_info) = env.reset().unwrap();
    assert_eq!(reset_info.remaining_waypoints, vec![detour]);

    // 0->1, 1->2, 2->5(detour), 5->2, 2->3, 3->4. Node 2's neighbors
    // build up as [3, 1, detour] (forward, backward, spur), so the step
    // into the detour is action 2; every other step is action 0
    // ("toward the higher-indexed neighbor").
    let mut outcomes = Vec::new();
    let mut path = vec![0u32];
    for action in [0usize, 0, 2, 0, 0, 0] {
        let outcome = env.step(action).unwrap();
        path.push(outcome.info.current_node);
        outcomes.push(outcome);
    }

    assert_eq!(path, vec![0, 1, 2, detour, 2, 3, 4]);

    let waypoint_step = &outcomes[2];
    assert_eq!(waypoint_step.info.current_node, detour);
    assert!(waypoint_step.reward >= RewardConfig::default().waypoint_bonus - 1.0);
    assert!(env.remaining_waypoints().is_empty());

    let last = outcomes.last().unwrap();
    assert!(last.terminated);
    assert_eq!(last.info.terminated_reason, Some(TerminatedReason::DestinationReached));
    assert!(last.reward >= RewardConfig::default().destination_bonus - 1.0);
}
