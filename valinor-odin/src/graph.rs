//! The read-only graph façade the synthesizer and detail extractor consume.
//!
//! This is deliberately graph-implementation-agnostic (spec.md §1 treats map
//! storage and the shortest-path search as external collaborators): node and
//! edge ids are plain `u64` newtypes, not a hierarchical tile address.

use geo::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u64);

/// Opaque directed-edge identifier. Note this is the *edge* id, not the
/// [edge key](https://en.wikipedia.org/wiki/Directed_graph): two directed
/// traversals of the same physical edge share one `EdgeId` but have distinct
/// edge keys (see [`DirectedEdgeView::edge_key`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeId(pub u64);

/// A geographic coordinate.
///
/// Wraps [`geo::Point<f64>`] rather than exposing `x()`/`y()` directly: `geo`
/// treats `x` as longitude, which is a frequent source of transposition bugs
/// when the rest of a codebase talks in lat/lon.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLon(Point<f64>);

impl LatLon {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(Point::new(lon, lat))
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.0.y()
    }

    #[must_use]
    pub fn lon(&self) -> f64 {
        self.0.x()
    }

    #[must_use]
    pub fn as_point(&self) -> Point<f64> {
        self.0
    }
}

/// Broad hierarchy of relative road importance.
///
/// Mirrors the vocabulary `valhalla-graphtile::RoadClass` establishes, but is
/// redeclared here as a plain `Copy` enum: the tile-parsing original derives
/// `TryFromBytes` for zerocopy decoding and deliberately isn't `Clone`/`Copy`,
/// which is right for a value read out of a memory-mapped tile but wrong for
/// one this crate's [`DirectedEdgeView`] copies around freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    ServiceOther,
}

impl RoadClass {
    /// Whether this class participates in "motorway fork" suppression logic
    /// (spec.md §4.2 step 7, slight band).
    #[must_use]
    pub fn is_motorway_or_trunk(self) -> bool {
        matches!(self, RoadClass::Motorway | RoadClass::Trunk)
    }
}

/// The road environment an edge travels through.
///
/// New vocabulary this crate introduces (spec.md §3): neither
/// `valhalla-graphtile` nor GraphHopper's model expose this as a single
/// consolidated enum at the point the synthesizer consumes it. A façade
/// implementation is responsible for deriving it from whatever its backing
/// store represents (tunnel/bridge bits, ferry `RoadUse`, etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoadEnvironment {
    Road,
    Ferry,
    Tunnel,
    Bridge,
    Ford,
}

/// A directed traversal of a physical edge, oriented `base_node -> adj_node`.
///
/// This is a value type: the façade hands out owned copies rather than
/// references into its own storage, since the underlying representation
/// (memory-mapped tile, in-memory test fixture, whatever) is opaque here.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectedEdgeView {
    pub base_node: NodeId,
    pub adj_node: NodeId,
    pub edge_id: EdgeId,
    /// `2 * edge_id + direction_bit`. Same physical edge, two keys.
    pub edge_key: u64,
    /// Meters. Always non-negative.
    pub distance: f64,
    /// Pillar points between the two tower endpoints, in `base -> adj`
    /// order. Excludes the tower endpoints themselves by convention; callers
    /// compose full lines via [`crate::path::calc_points`].
    pub geometry: Vec<LatLon>,
    /// Street name. Empty string is distinct from "no name was ever set"
    /// (this crate has no `Option<String>` here by design: spec.md §9 notes
    /// empty and missing are both treated as "no name" for comparison
    /// purposes, so a plain empty string suffices).
    pub name: String,
    pub road_class: RoadClass,
    pub road_class_link: bool,
    pub road_environment: RoadEnvironment,
    pub roundabout: bool,
    /// Whether this edge is traversable in the `base -> adj` direction.
    pub forward_access: bool,
    /// Whether this edge is traversable in the `adj -> base` direction.
    pub reverse_access: bool,
    /// Speed (km/h) traveling `base -> adj`.
    pub forward_speed: f64,
    /// Speed (km/h) traveling `adj -> base`.
    pub reverse_speed: f64,
}

impl DirectedEdgeView {
    /// Access for the requested direction: `reverse = false` is this view's
    /// natural `base -> adj` direction, `reverse = true` is `adj -> base`.
    #[must_use]
    pub fn access(&self, reverse: bool) -> bool {
        if reverse {
            self.reverse_access
        } else {
            self.forward_access
        }
    }

    /// Speed (km/h) for the requested direction.
    #[must_use]
    pub fn speed(&self, reverse: bool) -> f64 {
        if reverse {
            self.reverse_speed
        } else {
            self.forward_speed
        }
    }
}

/// Read-only access to a routed road graph.
///
/// Implementations must be safe to query concurrently from multiple threads
/// (spec.md §5): no writer can run while a synthesis is underway.
pub trait GraphFacade: Sync {
    /// Total number of nodes in the graph.
    fn node_count(&self) -> usize;

    /// The coordinate of a node.
    fn lat_lon(&self, node: NodeId) -> LatLon;

    /// All edges incident to `node`, oriented outward (`base_node == node`).
    fn edges_from(&self, node: NodeId) -> Vec<DirectedEdgeView>;

    /// Resolves a traversed edge id to its `base_node -> adj_node` view, given
    /// the node it was traversed away from. Returns `None` if no such edge
    /// exists from `base_node`.
    fn edge_by_id(&self, edge_id: EdgeId, base_node: NodeId) -> Option<DirectedEdgeView>;
}
