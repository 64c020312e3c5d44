//! Wires every component (C1 oracle, C2 embeddings, C3 environment, C4
//! mask/cycle wrapper, C5 normalizer) together the way `nav-cli`'s
//! episode runner does, and drives a full episode with a learner that
//! always submits an out-of-range action — exercising the mask's
//! substitution path and the normalizer's clip guarantee across the whole
//! stack at once, not any single crate in isolation.

use std::sync::Arc;

use nav_core::{EdgeAttrs, HighwayClass, MaxSpeed, NodeAttrs, StepEnv, Surface};
use nav_distance::{Algorithm, DistanceOracle, WeightKind};
use nav_env::{EnvConfig, RewardConfig, WaypointNavEnv};
use nav_graph::GraphBuilder;
use nav_mask::{MaskConfig, MaskingWrapper};
use nav_normalize::VC2Normalizer;

fn attrs(length_m: f64) -> EdgeAttrs {
    EdgeAttrs {
        length_m,
        maxspeed: Some(MaxSpeed::Numeric(40.0)),
        lanes: Some(1.0),
        highway: HighwayClass::Residential,
        surface: Surface::Paved,
        oneway: false,
        travel_time_s: Some(length_m / 10.0),
        speed_kph: None,
    }
}

/// A 3x3 grid so nodes have real branching (degree up to 4), unlike a
/// bare corridor, giving the mask something nontrivial to filter.
fn grid3x3() -> Arc<nav_graph::Graph> {
    let mut b = GraphBuilder::new();
    let mut ids = [[0u32; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            ids[row][col] = b.add_node(NodeAttrs { x: col as f64 * 10.0, y: row as f64 * 10.0 });
        }
    }
    for row in 0..3 {
        for col in 0..3 {
            if col + 1 < 3 {
                b.add_bidirectional_edge(ids[row][col], ids[row][col + 1], attrs(10.0));
            }
            if row + 1 < 3 {
                b.add_bidirectional_edge(ids[row][col], ids[row + 1][col], attrs(10.0));
            }
        }
    }
    Arc::new(b.build().unwrap())
}

#[test]
fn full_pipeline_clips_rewards_and_substitutes_invalid_actions() {
    let graph = grid3x3();
    let embeddings = Arc::new(nav_embed::build(&graph));
    let oracle = Arc::new(DistanceOracle::new(graph.clone(), None, WeightKind::TravelTime, Algorithm::AStar));

    let start = 0u32; // top-left corner
    let destination = 8u32; // bottom-right corner
    let waypoint = 2u32; // top-right corner

    let env = WaypointNavEnv::new(
        graph.clone(),
        embeddings,
        oracle.clone(),
        start,
        vec![waypoint],
        destination,
        EnvConfig::default(),
        RewardConfig::default(),
    )
    .unwrap();

    let max_actions = (0..graph.node_count() as u32).map(|n| graph.out_degree(n)).max().unwrap().max(1);
    let masked = MaskingWrapper::new(env, graph.clone(), oracle, destination, max_actions, MaskConfig::default());
    let clip_range = 4.0;
    let mut stack = VC2Normalizer::with_config(
        masked,
        nav_normalize::NormalizerConfig { clip_range, ..Default::default() },
    );

    let (obs, reset_info) = stack.reset().unwrap();
    assert_eq!(obs.len(), stack.observation_shape());
    assert_eq!(reset_info.remaining_waypoints, vec![waypoint]);

    let mut terminated_or_truncated = false;
    for _ in 0..200 {
        // Always submit an out-of-range action: the mask must substitute
        // a legal one every single step.
        let outcome = stack.step(9_999).unwrap();

        assert!(outcome.reward >= -clip_range && outcome.reward <= clip_range, "reward {} escaped clip range", outcome.reward);
        assert!(outcome.info.masking_applied, "an out-of-range action must always be substituted");
        assert_eq!(outcome.info.original_action, Some(9_999));
        let chosen = outcome.info.chosen_action.expect("chosen_action must be set whenever masking applies");
        assert!(chosen < max_actions);
        let mask = outcome.info.action_mask.as_ref().expect("masking wrapper must always publish a mask");
        assert!(mask[chosen], "the substituted action must itself be legal");

        if outcome.terminated || outcome.truncated {
            terminated_or_truncated = true;
            break;
        }
    }

    assert!(terminated_or_truncated, "episode should reach a terminal state well within 200 steps on a 9-node grid");
}
