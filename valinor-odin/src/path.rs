//! Path reconstruction from a shortest-path-tree predecessor chain
//! (spec.md §4.1), plus the point-index bookkeeping shared by the
//! synthesizer and the path-detail extractor (spec.md §4.3).

use std::rc::Rc;

use crate::error::OdinError;
use crate::graph::{DirectedEdgeView, EdgeId, GraphFacade, LatLon, NodeId};
use crate::weighting::Weighting;

/// One link in a shortest-path tree's predecessor chain, child -> parent.
///
/// The sentinel root has `edge_id: None`: it carries no incoming edge,
/// only the origin node. `Rc` is used rather than `&'a SptEntry` so that
/// callers can build the chain incrementally (as a real SPT search does,
/// one relaxation at a time) without fighting the borrow checker over a
/// self-referential tree.
#[derive(Debug, Clone)]
pub struct SptEntry {
    pub edge_id: Option<EdgeId>,
    pub node_id: NodeId,
    pub edge_weight: f64,
    pub parent: Option<Rc<SptEntry>>,
}

impl SptEntry {
    /// Constructs the sentinel root entry for a search starting at `node_id`.
    #[must_use]
    pub fn root(node_id: NodeId) -> Rc<Self> {
        Rc::new(Self {
            edge_id: None,
            node_id,
            edge_weight: 0.0,
            parent: None,
        })
    }

    /// Extends this chain by one traversal.
    #[must_use]
    pub fn extend(self: &Rc<Self>, edge_id: EdgeId, node_id: NodeId, edge_weight: f64) -> Rc<Self> {
        Rc::new(Self {
            edge_id: Some(edge_id),
            node_id,
            edge_weight,
            parent: Some(Rc::clone(self)),
        })
    }
}

/// A reconstructed route: an ordered list of directed edge traversals plus
/// the endpoints (spec.md §3).
///
/// Invariant: consecutive edges share a node
/// (`edges[i].adj_node == edges[i + 1].base_node`). An empty `edges` with
/// `found = false` represents "no route".
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub found: bool,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub edges: Vec<DirectedEdgeView>,
    pub weight: f64,
    /// Milliseconds.
    pub time: u64,
    /// Meters.
    pub distance: f64,
}

/// Walks `leaf`'s parent chain back to the sentinel root, resolving each
/// traversed edge id via the graph façade, and assembles a forward-ordered
/// [`Path`].
///
/// # Errors
///
/// Returns [`OdinError::PathMalformed`] if a traversed edge id has no
/// corresponding edge from the node it claims to leave.
pub fn reconstruct_path(
    leaf: &Rc<SptEntry>,
    facade: &dyn GraphFacade,
    weighting: &dyn Weighting,
) -> Result<Path, OdinError> {
    // Walk parent pointers to the root, collecting (edge_id, adj_node) pairs
    // in child-to-parent (i.e. reverse traversal) order.
    let mut reversed_links = Vec::new();
    let mut cursor = Rc::clone(leaf);
    loop {
        let Some(edge_id) = cursor.edge_id else {
            break;
        };
        let adj_node = cursor.node_id;
        let Some(parent) = cursor.parent.clone() else {
            return Err(OdinError::PathMalformed {
                reason: format!("entry for node {adj_node:?} has an edge id but no parent"),
            });
        };
        reversed_links.push((edge_id, parent.node_id, adj_node));
        cursor = parent;
    }
    let from_node = cursor.node_id;
    reversed_links.reverse();

    let mut edges = Vec::with_capacity(reversed_links.len());
    let mut distance = 0.0;
    let mut time: u64 = 0;
    let mut prev_edge_id: Option<EdgeId> = None;
    let mut prev_node: Option<NodeId> = None;

    for (edge_id, base_node, adj_node) in reversed_links {
        let edge = facade.edge_by_id(edge_id, base_node).ok_or_else(|| {
            OdinError::PathMalformed {
                reason: format!(
                    "no edge {edge_id:?} found leaving node {base_node:?} (chain claims it reaches {adj_node:?})"
                ),
            }
        })?;
        if edge.adj_node != adj_node {
            return Err(OdinError::PathMalformed {
                reason: format!(
                    "edge {edge_id:?} from {base_node:?} lands on {:?}, but the chain expects {adj_node:?}",
                    edge.adj_node
                ),
            });
        }

        distance += edge.distance;
        time += weighting.edge_millis(&edge, false);
        if weighting.has_turn_costs() {
            if let (Some(in_edge), Some(via_node)) = (prev_edge_id, prev_node) {
                time += weighting.turn_millis(in_edge, via_node, edge_id);
            }
        }

        prev_edge_id = Some(edge_id);
        prev_node = Some(base_node);
        edges.push(edge);
    }

    let to_node = edges.last().map_or(from_node, |e| e.adj_node);

    Ok(Path {
        found: true,
        from_node,
        to_node,
        edges,
        weight: leaf.edge_weight,
        time,
        distance,
    })
}

/// Concatenates the full point sequence for `path`: the origin node, each
/// edge's pillar geometry in forward order, and the node it lands on
/// (spec.md §4.1).
#[must_use]
pub fn calc_points(path: &Path, facade: &dyn GraphFacade) -> Vec<LatLon> {
    if path.edges.is_empty() {
        return vec![facade.lat_lon(path.from_node)];
    }

    let mut points = Vec::new();
    points.push(facade.lat_lon(path.edges[0].base_node));
    for edge in &path.edges {
        points.extend_from_slice(&edge.geometry);
        points.push(facade.lat_lon(edge.adj_node));
    }
    points
}

/// For each edge, the half-open `[first, last]` point-index span it spans in
/// the point sequence [`calc_points`] produces (spec.md §4.3): edge `i`
/// begins at point index `p_i` and ends at `p_i + 1 + |geometry|`, which
/// becomes `p_{i+1}` for the next edge.
#[must_use]
pub fn edge_point_spans(path: &Path) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(path.edges.len());
    let mut cursor = 0usize;
    for edge in &path.edges {
        let end = cursor + 1 + edge.geometry.len();
        spans.push((cursor, end));
        cursor = end;
    }
    spans
}
