//! The path-detail extractor (spec.md §4.3): partitions a path into maximal
//! contiguous runs sharing a chosen attribute.
//!
//! Shares the edge-walk contract and point-index bookkeeping with
//! [`crate::synthesizer`] (see [`crate::path::edge_point_spans`]), which is
//! why this crate implements both rather than just the instruction
//! synthesizer spec.md §1 leads with.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::{Value, json};

use crate::error::OdinError;
use crate::geometry;
use crate::graph::{DirectedEdgeView, GraphFacade, NodeId};
use crate::path::{Path, edge_point_spans};
use crate::weighting::Weighting;

/// Threshold (meters) below which an edge is absorbed into the previous
/// average-speed run regardless of its own speed, to avoid spurious 1-point
/// runs (spec.md §4.3, §9 — the precise threshold is implementation-defined;
/// this crate fixes it at 1m).
const SHORT_EDGE_COALESCE_THRESHOLD_METERS: f64 = 1.0;

/// Which detail stream a [`PathDetail`] run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailKey {
    AverageSpeed,
    StreetName,
    EdgeId,
    EdgeKey,
    Time,
    Distance,
    Intersection,
}

/// One maximal run of edges sharing a detail value, expressed over the
/// point-index space (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct PathDetail {
    pub value: Value,
    pub first: usize,
    pub last: usize,
}

/// Shared context a [`DetailBuilder`] may need beyond the edge itself.
pub struct DetailContext<'a> {
    pub facade: &'a dyn GraphFacade,
    pub weighting: &'a dyn Weighting,
}

/// A small policy object deciding, per edge, the detail value and whether
/// consecutive edges belong to the same run.
pub trait DetailBuilder {
    fn key(&self) -> DetailKey;

    /// The detail value for `edge`, the `index`-th edge in `path`.
    fn value(&self, edge: &DirectedEdgeView, index: usize, path: &Path, ctx: &DetailContext) -> Value;

    /// Whether `edge` (with value `edge_value`) continues the run started by
    /// `prev_edge` (with value `prev_value`). Defaults to value equality.
    fn same_run(
        &self,
        prev_edge: &DirectedEdgeView,
        prev_value: &Value,
        edge: &DirectedEdgeView,
        edge_value: &Value,
    ) -> bool {
        let _ = (prev_edge, edge);
        prev_value == edge_value
    }
}

/// Forward speed of the edge (spec.md §4.3); adjacent edges with equal speed
/// coalesce, and sub-meter edges are absorbed into the previous run
/// regardless of speed.
pub struct AverageSpeedBuilder;

impl DetailBuilder for AverageSpeedBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::AverageSpeed
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, _ctx: &DetailContext) -> Value {
        json!(edge.forward_speed)
    }

    fn same_run(
        &self,
        _prev_edge: &DirectedEdgeView,
        prev_value: &Value,
        edge: &DirectedEdgeView,
        edge_value: &Value,
    ) -> bool {
        edge.distance < SHORT_EDGE_COALESCE_THRESHOLD_METERS || prev_value == edge_value
    }
}

/// Edge name; empty string is distinct from a missing value (this crate
/// never produces `null` here, only `""` vs a real name).
pub struct StreetNameBuilder;

impl DetailBuilder for StreetNameBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::StreetName
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, _ctx: &DetailContext) -> Value {
        json!(edge.name)
    }
}

pub struct EdgeIdBuilder;

impl DetailBuilder for EdgeIdBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::EdgeId
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, _ctx: &DetailContext) -> Value {
        json!(edge.edge_id.0)
    }
}

pub struct EdgeKeyBuilder;

impl DetailBuilder for EdgeKeyBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::EdgeKey
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, _ctx: &DetailContext) -> Value {
        json!(edge.edge_key)
    }
}

/// Edge traversal time (milliseconds) for the direction used.
pub struct TimeBuilder;

impl DetailBuilder for TimeBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::Time
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, ctx: &DetailContext) -> Value {
        json!(ctx.weighting.edge_millis(edge, false))
    }
}

pub struct DistanceBuilder;

impl DetailBuilder for DistanceBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::Distance
    }

    fn value(&self, edge: &DirectedEdgeView, _index: usize, _path: &Path, _ctx: &DetailContext) -> Value {
        json!(edge.distance)
    }
}

/// Intersection fan-out at the edge's base node: the chosen outgoing
/// alternative's bearing-sorted index, the incoming alternative's index (if
/// any), per-alternative enterability, and bearings (spec.md §4.3).
pub struct IntersectionBuilder;

/// Alternatives at `node` sorted by compass bearing (0 = north), ascending.
fn bearing_sorted_alternatives(
    node: NodeId,
    facade: &dyn GraphFacade,
) -> Vec<(DirectedEdgeView, u32)> {
    let mut with_bearings: Vec<_> = facade
        .edges_from(node)
        .into_iter()
        .map(|e| {
            let from = facade.lat_lon(e.base_node);
            let to = e
                .geometry
                .first()
                .copied()
                .unwrap_or_else(|| facade.lat_lon(e.adj_node));
            let bearing = compass_bearing_degrees(geometry::calc_orientation(from, to));
            (e, bearing)
        })
        .collect();
    with_bearings.sort_by_key(|(_, bearing)| *bearing);
    with_bearings
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compass_bearing_degrees(theta_rad: f64) -> u32 {
    let degrees = theta_rad.to_degrees() + 90.0;
    degrees.rem_euclid(360.0).round() as u32
}

impl DetailBuilder for IntersectionBuilder {
    fn key(&self) -> DetailKey {
        DetailKey::Intersection
    }

    fn value(&self, edge: &DirectedEdgeView, index: usize, path: &Path, ctx: &DetailContext) -> Value {
        let sorted = bearing_sorted_alternatives(edge.base_node, ctx.facade);

        let out_index = sorted.iter().position(|(e, _)| e.edge_id == edge.edge_id);
        let in_index = if index == 0 {
            None
        } else {
            let incoming = &path.edges[index - 1];
            sorted.iter().position(|(e, _)| e.edge_id == incoming.edge_id)
        };

        let entries: Vec<bool> = sorted
            .iter()
            .map(|(e, _)| ctx.weighting.edge_weight(e, false).is_finite())
            .collect();
        let bearings: Vec<u32> = sorted.iter().map(|(_, bearing)| *bearing).collect();

        json!({
            "out": out_index,
            "in": in_index,
            "entries": entries,
            "bearings": bearings,
        })
    }
}

/// Returns the default set of detail builders covering every key spec.md
/// §4.3 names.
#[must_use]
pub fn default_builders() -> Vec<Box<dyn DetailBuilder>> {
    vec![
        Box::new(AverageSpeedBuilder),
        Box::new(StreetNameBuilder),
        Box::new(EdgeIdBuilder),
        Box::new(EdgeKeyBuilder),
        Box::new(TimeBuilder),
        Box::new(DistanceBuilder),
        Box::new(IntersectionBuilder),
    ]
}

/// Runs one pass per requested builder over `path`'s edges, producing the
/// maximal runs each builder's policy identifies.
///
/// # Errors
///
/// This never actually fails today (the façade calls it makes are
/// infallible), but returns a `Result` to match the other path-walking
/// entry points and leave room for façade-side contract violations to
/// surface uniformly.
pub fn extract_path_details(
    path: &Path,
    facade: &dyn GraphFacade,
    weighting: &dyn Weighting,
    builders: &[Box<dyn DetailBuilder>],
) -> Result<BTreeMap<DetailKey, Vec<PathDetail>>, OdinError> {
    let mut result = BTreeMap::new();
    if path.edges.is_empty() {
        return Ok(result);
    }

    let spans = edge_point_spans(path);
    let ctx = DetailContext { facade, weighting };

    for builder in builders {
        let mut runs = Vec::new();
        let mut run_first = spans[0].0;
        let mut run_value = builder.value(&path.edges[0], 0, path, &ctx);

        for ((prev_index, prev_edge), (index, edge)) in
            path.edges.iter().enumerate().tuple_windows::<(_, _)>()
        {
            let value = builder.value(edge, index, path, &ctx);
            if builder.same_run(prev_edge, &run_value, edge, &value) {
                // Extend the run; its representative value stays whatever
                // opened it (so a sub-meter edge absorbed mid-run doesn't
                // drag the run's value to its own).
                continue;
            }
            runs.push(PathDetail {
                value: run_value,
                first: run_first,
                last: spans[prev_index].1,
            });
            run_first = spans[index].0;
            run_value = value;
        }

        runs.push(PathDetail {
            value: run_value,
            first: run_first,
            last: spans[path.edges.len() - 1].1,
        });
        result.insert(builder.key(), runs);
    }

    Ok(result)
}
