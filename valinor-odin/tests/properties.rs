//! Universal properties from spec.md §8, checked against small generated
//! graphs, following `valhalla-graphtile::spatial`'s use of `proptest` for
//! its Haversine approximator (an oracle test over a randomized input rather
//! than a single fixture).

use std::collections::HashMap;

use proptest::prelude::*;
use valinor_odin::{
    DirectedEdgeView, EdgeId, GraphFacade, Instruction, LatLon, NodeId, RoadClass,
    RoadEnvironment, SimpleWeighting, SptEntry, calc_points, edge_point_spans, reconstruct_path,
    synthesize,
};

struct ChainGraph {
    nodes: HashMap<u64, LatLon>,
    edges: HashMap<(u64, u64), DirectedEdgeView>,
}

impl GraphFacade for ChainGraph {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn lat_lon(&self, node: NodeId) -> LatLon {
        self.nodes[&node.0]
    }

    fn edges_from(&self, node: NodeId) -> Vec<DirectedEdgeView> {
        self.edges.values().filter(|e| e.base_node == node).cloned().collect()
    }

    fn edge_by_id(&self, edge_id: EdgeId, base_node: NodeId) -> Option<DirectedEdgeView> {
        self.edges.get(&(edge_id.0, base_node.0)).cloned()
    }
}

/// Builds a simple chain graph `0 -> 1 -> ... -> n` with the given per-edge
/// `(distance, speed, name)` triples, wandering south-east by a small,
/// deterministic step per node so consecutive edges have varying bearings.
fn build_chain(specs: &[(f64, f64, String)]) -> (ChainGraph, Vec<EdgeId>) {
    let mut nodes = HashMap::new();
    let mut edges = HashMap::new();
    let mut edge_ids = Vec::new();

    let mut lat = 0.0;
    let mut lon = 0.0;
    nodes.insert(0u64, LatLon::new(lat, lon));

    for (i, (distance, speed, name)) in specs.iter().enumerate() {
        // Zig-zag the heading so consecutive edges span the full range of
        // turn-angle bands (straight through U-turn), exercising every
        // emission branch rather than only the forced-continue case a
        // constant heading would hit.
        #[allow(clippy::cast_precision_loss)]
        let step = 0.01 + 0.001 * ((i % 5) as f64);
        let sign = if i % 3 == 0 { 1.0 } else { -1.0 };
        lat += step;
        lon += sign * step * 0.3;
        nodes.insert((i + 1) as u64, LatLon::new(lat, lon));

        let edge = DirectedEdgeView {
            base_node: NodeId(i as u64),
            adj_node: NodeId((i + 1) as u64),
            edge_id: EdgeId(i as u64),
            edge_key: 2 * i as u64,
            distance: *distance,
            geometry: vec![],
            name: name.clone(),
            road_class: RoadClass::Residential,
            road_class_link: false,
            road_environment: RoadEnvironment::Road,
            roundabout: false,
            forward_access: true,
            reverse_access: true,
            forward_speed: *speed,
            reverse_speed: *speed,
        };
        edge_ids.push(edge.edge_id);
        edges.insert((edge.edge_id.0, edge.base_node.0), edge);
    }

    (ChainGraph { nodes, edges }, edge_ids)
}

fn edge_spec_strategy() -> impl Strategy<Value = (f64, f64, String)> {
    (10.0..5000.0, 5.0..120.0, prop::sample::select(vec!["Main St", "Oak Ave", ""]))
        .prop_map(|(d, s, n)| (d, s, n.to_string()))
}

proptest! {
    /// Property 1 and property 3 from spec.md §8: distance/time are
    /// conserved between edges and instructions, and the point-range
    /// coverage of every non-Finish instruction sums to `total points - 1`.
    /// Property 2: the path's last instruction is always a zero-length
    /// Finish. Property 6: synthesizing twice is idempotent.
    #[test]
    fn universal_properties_hold_over_random_chains(
        specs in prop::collection::vec(edge_spec_strategy(), 1..8)
    ) {
        let (graph, edge_ids) = build_chain(&specs);
        let weighting = SimpleWeighting;

        let mut spt = SptEntry::root(NodeId(0));
        for (i, edge_id) in edge_ids.iter().enumerate() {
            spt = spt.extend(*edge_id, NodeId((i + 1) as u64), 0.0);
        }

        let path = reconstruct_path(&spt, &graph, &weighting).expect("chain always reconstructs");
        let instructions = synthesize(&path, &graph, &weighting).expect("chain always synthesizes");
        let instructions_again = synthesize(&path, &graph, &weighting).expect("chain always synthesizes");

        // Property 6: idempotence.
        prop_assert_eq!(&instructions, &instructions_again);

        // Property 1: distance and time are conserved.
        prop_assert!((instructions.total_distance() - path.distance).abs() < 1e-6);
        prop_assert_eq!(instructions.total_time(), path.time);

        // Property 2: the last instruction is a zero-length Finish.
        let last = instructions.iter().last().expect("non-empty path has instructions");
        prop_assert!(matches!(last, Instruction::Finish { .. }));
        prop_assert_eq!(last.points().len(), 0);

        // Property 3: point-range coverage sums to total points - 1.
        let total_points = calc_points(&path, &graph).len();
        let covered: usize = instructions
            .iter()
            .filter(|i| !matches!(i, Instruction::Finish { .. }))
            .map(|i| i.points().len())
            .sum();
        prop_assert_eq!(covered, total_points - 1);
    }
}

/// Property 5 from spec.md §8: reversing a path and re-synthesizing yields
/// the same total distance and the same point multiset (content only; the
/// instruction set itself is generally different, since bearings flip).
#[test]
fn reversing_a_path_preserves_distance_and_point_multiset() {
    let specs = vec![
        (1000.0, 40.0, "Forward Ave".to_string()),
        (2000.0, 60.0, "Forward Ave".to_string()),
        (500.0, 30.0, "Side St".to_string()),
    ];
    let (graph, edge_ids) = build_chain(&specs);
    let weighting = SimpleWeighting;

    let mut spt = SptEntry::root(NodeId(0));
    for (i, edge_id) in edge_ids.iter().enumerate() {
        spt = spt.extend(*edge_id, NodeId((i + 1) as u64), 0.0);
    }
    let forward_path = reconstruct_path(&spt, &graph, &weighting).expect("reconstructs");
    let forward_points = calc_points(&forward_path, &graph);
    let forward_spans = edge_point_spans(&forward_path);
    assert_eq!(forward_spans.len(), forward_path.edges.len());

    // Build the reverse traversal by hand: reversed edges with geometry and
    // base/adj swapped, speed/access read from the opposite direction.
    let n = specs.len() as u64;
    let mut reverse_graph = ChainGraph {
        nodes: graph.nodes.clone(),
        edges: HashMap::new(),
    };
    let mut reverse_edge_ids = Vec::new();
    for i in (0..specs.len()).rev() {
        let fwd = &graph.edges[&(i as u64, i as u64)];
        let reversed = DirectedEdgeView {
            base_node: fwd.adj_node,
            adj_node: fwd.base_node,
            edge_id: fwd.edge_id,
            edge_key: fwd.edge_key + 1,
            distance: fwd.distance,
            geometry: Vec::new(),
            name: fwd.name.clone(),
            road_class: fwd.road_class,
            road_class_link: fwd.road_class_link,
            road_environment: fwd.road_environment,
            roundabout: fwd.roundabout,
            forward_access: fwd.reverse_access,
            reverse_access: fwd.forward_access,
            forward_speed: fwd.reverse_speed,
            reverse_speed: fwd.forward_speed,
        };
        reverse_edge_ids.push(reversed.edge_id);
        reverse_graph
            .edges
            .insert((reversed.edge_id.0, reversed.base_node.0), reversed);
    }

    let mut rspt = SptEntry::root(NodeId(n));
    let mut via = n;
    for edge_id in &reverse_edge_ids {
        via -= 1;
        rspt = rspt.extend(*edge_id, NodeId(via), 0.0);
    }
    let reverse_path = reconstruct_path(&rspt, &reverse_graph, &weighting).expect("reconstructs");
    let reverse_points = calc_points(&reverse_path, &reverse_graph);

    assert!((forward_path.distance - reverse_path.distance).abs() < 1e-9);

    #[allow(clippy::cast_possible_truncation)]
    fn micro_degrees(p: &LatLon) -> (i64, i64) {
        ((p.lat() * 1e6).round() as i64, (p.lon() * 1e6).round() as i64)
    }
    let mut forward_sorted: Vec<(i64, i64)> = forward_points.iter().map(micro_degrees).collect();
    let mut reverse_sorted: Vec<(i64, i64)> = reverse_points.iter().map(micro_degrees).collect();
    forward_sorted.sort_unstable();
    reverse_sorted.sort_unstable();
    assert_eq!(forward_sorted, reverse_sorted);
}
