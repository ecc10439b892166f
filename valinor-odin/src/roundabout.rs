//! The roundabout sub-machine (spec.md §4.2 steps 4-6), used internally by
//! [`crate::synthesizer`].
//!
//! Entered when an edge with the roundabout attribute is first encountered;
//! counts used exits by inspecting non-roundabout, routable outgoing
//! alternatives at each intermediate node, and emits one instruction with
//! exit number and turn angle upon leaving.

use crate::geometry::{roundabout_turn_angle, turn_angle};
use crate::graph::DirectedEdgeView;

/// Accumulated state for a roundabout currently being traversed.
#[derive(Debug, Clone)]
pub struct RoundaboutProgress {
    /// Bearing of the first roundabout edge's entry tangent, fixed at entry.
    entry_bearing: f64,
    /// One-based; starts at 1 to account for the exit ultimately taken
    /// (spec.md §9: "over-counts by one... by design").
    exit_number: u32,
    pub name: String,
}

impl RoundaboutProgress {
    /// Opens a new roundabout traversal (spec.md §4.2 step 4).
    #[must_use]
    pub fn enter(entry_bearing: f64, name: String) -> Self {
        Self {
            entry_bearing,
            exit_number: 1,
            name,
        }
    }

    /// At an intermediate roundabout node, counts the non-roundabout
    /// routable branches observed there as candidate exits (spec.md §4.2
    /// step 5).
    pub fn observe_intermediate_node(&mut self, alternatives: &[DirectedEdgeView]) {
        let candidate_exits = alternatives.iter().filter(|a| !a.roundabout).count();
        self.exit_number += u32::try_from(candidate_exits).unwrap_or(u32::MAX);
    }

    #[must_use]
    pub fn exit_number(&self) -> u32 {
        self.exit_number
    }

    /// Finalizes the roundabout given the exit edge's outgoing tangent
    /// bearing, returning the signed turn angle (spec.md §4.2 step 6, §4.4).
    #[must_use]
    pub fn exit_turn_angle(&self, exit_bearing: f64) -> f64 {
        let delta = turn_angle(self.entry_bearing, exit_bearing);
        let clockwise = delta >= 0.0;
        roundabout_turn_angle(clockwise, delta)
    }
}
