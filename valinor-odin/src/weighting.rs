//! The weighting collaborator (spec.md §6): tells the synthesizer which
//! edges are traversable and how long they take, without the synthesizer
//! needing to know anything about the costing model in use.

use crate::graph::{DirectedEdgeView, EdgeId, NodeId};

/// Mirrors spec.md §6's weighting collaborator exactly.
///
/// `edge_weight` returning `f64::INFINITY` is how "not traversable in this
/// direction under this profile" is expressed; the synthesizer's alternative
/// enumeration (spec.md §4.2 step 1) filters on `edge_weight(..).is_finite()`.
///
/// Requires `Sync` (spec.md §5, SPEC_FULL.md §5): a single weighting is
/// shared across concurrently-synthesizing threads alongside the read-only
/// `GraphFacade` (graph.rs's `GraphFacade: Sync`), with no writer running
/// while a synthesis is underway.
pub trait Weighting: Sync {
    /// Routing weight for traversing `edge`. `reverse = true` asks for the
    /// weight of the `adj -> base` direction. `f64::INFINITY` means
    /// non-traversable.
    fn edge_weight(&self, edge: &DirectedEdgeView, reverse: bool) -> f64;

    /// Travel time (milliseconds) for traversing `edge`.
    fn edge_millis(&self, edge: &DirectedEdgeView, reverse: bool) -> u64;

    /// Extra cost incurred turning from `in_edge` onto `out_edge` at
    /// `via_node`. Zero for weightings that don't model turn costs.
    fn turn_weight(&self, in_edge: EdgeId, via_node: NodeId, out_edge: EdgeId) -> f64;

    /// Extra time (milliseconds) incurred turning from `in_edge` onto
    /// `out_edge` at `via_node`.
    fn turn_millis(&self, in_edge: EdgeId, via_node: NodeId, out_edge: EdgeId) -> u64;

    /// Whether this weighting models turn costs at all. Path reconstruction
    /// (spec.md §4.1) only bothers calling `turn_millis` when this is true.
    fn has_turn_costs(&self) -> bool;
}

/// A reference [`Weighting`] for tests and for consumers without a real
/// costing model yet.
///
/// Grounded on `valinor-sif::Costing` (`edge_allowed`/`edge_cost`/
/// `transition_cost`), generalized to plain `f64` seconds/weight: this crate
/// has no pathfinding-specific `EdgeLabel` to carry a `Cost` accumulator
/// through, so there's nothing to gain from a dedicated `Cost` struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleWeighting;

impl Weighting for SimpleWeighting {
    fn edge_weight(&self, edge: &DirectedEdgeView, reverse: bool) -> f64 {
        if !edge.access(reverse) || edge.speed(reverse) <= 0.0 {
            return f64::INFINITY;
        }
        edge.distance / (edge.speed(reverse) / 3.6)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn edge_millis(&self, edge: &DirectedEdgeView, reverse: bool) -> u64 {
        let weight = self.edge_weight(edge, reverse);
        if weight.is_finite() {
            (weight * 1000.0) as u64
        } else {
            0
        }
    }

    fn turn_weight(&self, _in_edge: EdgeId, _via_node: NodeId, _out_edge: EdgeId) -> f64 {
        0.0
    }

    fn turn_millis(&self, _in_edge: EdgeId, _via_node: NodeId, _out_edge: EdgeId) -> u64 {
        0
    }

    fn has_turn_costs(&self) -> bool {
        false
    }
}
