//! The instruction state machine (spec.md §4.2): walks a path's edges in
//! order, decides at each junction whether to finalize the instruction in
//! progress and open a new one, classifies turn signs, and assembles
//! name/annotations.
//!
//! Grounded on `illuvatar-service`'s placement as the narrative-builder seam
//! (`unimplemented!("TODO: Narrative builder!")` in
//! `illuvatar-service/src/main.rs`) — this module is what that stub was
//! left for.

use crate::error::OdinError;
use crate::geometry::{self, AngleBand};
use crate::graph::{DirectedEdgeView, GraphFacade, NodeId, RoadEnvironment};
use crate::instruction::{Instruction, InstructionList, PointRange, Sign};
use crate::path::{Path, edge_point_spans};
use crate::roundabout::RoundaboutProgress;
use crate::weighting::Weighting;

/// Short edges with no pillar geometry fall back to the straight line
/// between their endpoints for bearing purposes.
fn edge_departure_bearing(edge: &DirectedEdgeView, facade: &dyn GraphFacade) -> f64 {
    let from = facade.lat_lon(edge.base_node);
    let to = edge
        .geometry
        .first()
        .copied()
        .unwrap_or_else(|| facade.lat_lon(edge.adj_node));
    geometry::calc_orientation(from, to)
}

fn edge_arrival_bearing(edge: &DirectedEdgeView, facade: &dyn GraphFacade) -> f64 {
    let from = edge
        .geometry
        .last()
        .copied()
        .unwrap_or_else(|| facade.lat_lon(edge.base_node));
    let to = facade.lat_lon(edge.adj_node);
    geometry::calc_orientation(from, to)
}

/// Outgoing, routable alternatives at `v`, excluding the reverse of the edge
/// just traversed (compared by edge id, not node, so parallel edges are
/// handled correctly — spec.md §9).
fn alternatives_at(
    facade: &dyn GraphFacade,
    weighting: &dyn Weighting,
    v: NodeId,
    prev_edge: &DirectedEdgeView,
) -> Vec<DirectedEdgeView> {
    facade
        .edges_from(v)
        .into_iter()
        .filter(|e| e.edge_id != prev_edge.edge_id)
        .filter(|e| weighting.edge_weight(e, false).is_finite())
        .collect()
}

fn same_street(a: &DirectedEdgeView, b: &DirectedEdgeView) -> bool {
    !a.name.is_empty() && !b.name.is_empty() && a.name == b.name
}

/// Whether a junction represents a genuine rename, for the straight-band
/// "else: emit Continue onto the new name" decision (spec.md §4.2's
/// "Name precedence" note): a rename only triggers emission if the names
/// actually differ and at least one of them is non-empty. Plain string
/// equality (unlike [`same_street`]) is the right test here: two edges that
/// are both unnamed haven't been renamed at all, so they must not trigger an
/// emission merely because [`same_street`] treats empty names as never equal.
fn names_equal(a: &DirectedEdgeView, b: &DirectedEdgeView) -> bool {
    a.name == b.name
}

fn is_motorway_fork(a: &DirectedEdgeView, b: &DirectedEdgeView) -> bool {
    a.road_class.is_motorway_or_trunk()
        && b.road_class.is_motorway_or_trunk()
        && (a.road_class_link || b.road_class_link)
}

fn uturn_sign(delta: f64) -> Sign {
    if delta < 0.0 {
        Sign::UTurnLeft
    } else {
        Sign::UTurnRight
    }
}

fn slight_sign(delta: f64) -> Sign {
    if delta < 0.0 {
        Sign::SlightLeft
    } else {
        Sign::SlightRight
    }
}

fn keep_sign(delta: f64) -> Sign {
    if delta < 0.0 {
        Sign::KeepLeft
    } else {
        Sign::KeepRight
    }
}

fn normal_or_sharp_sign(band: AngleBand, delta: f64) -> Sign {
    match (band, delta < 0.0) {
        (AngleBand::Normal, true) => Sign::Left,
        (AngleBand::Normal, false) => Sign::Right,
        (AngleBand::Sharp, true) => Sign::SharpLeft,
        (AngleBand::Sharp, false) => Sign::SharpRight,
        _ => Sign::Ignore,
    }
}

/// What kind of instruction is currently accumulating edges.
#[derive(Debug, Clone)]
enum OpenKind {
    Continue,
    Turn(Sign),
    Ferry,
    Roundabout(RoundaboutProgress),
}

/// The instruction currently being extended.
struct Open {
    kind: OpenKind,
    name: String,
    distance: f64,
    time: u64,
    first_point: usize,
    last_edge_index: usize,
}

impl Open {
    fn start(edge: &DirectedEdgeView, kind: OpenKind, first_point: usize, edge_index: usize) -> Self {
        Self {
            kind,
            name: edge.name.clone(),
            distance: 0.0,
            time: 0,
            first_point,
            last_edge_index: edge_index,
        }
    }

    fn accumulate(&mut self, edge: &DirectedEdgeView, millis: u64, edge_index: usize) {
        self.distance += edge.distance;
        self.time += millis;
        self.last_edge_index = edge_index;
    }

    fn finalize(self, spans: &[(usize, usize)]) -> Instruction {
        let points = PointRange {
            first: self.first_point,
            last: spans[self.last_edge_index].1,
        };
        match self.kind {
            OpenKind::Continue => Instruction::Continue {
                name: self.name,
                distance: self.distance,
                time: self.time,
                points,
            },
            OpenKind::Turn(sign) => Instruction::Turn {
                sign,
                name: self.name,
                distance: self.distance,
                time: self.time,
                points,
            },
            OpenKind::Ferry => Instruction::Ferry {
                name: self.name,
                distance: self.distance,
                time: self.time,
                points,
            },
            OpenKind::Roundabout(_) => {
                unreachable!("roundabouts are finalized via finalize_roundabout, not finalize")
            }
        }
    }
}

/// Checks the invariants spec.md §7 requires at instruction finalization:
/// non-negative distance and a monotone point range. A façade that hands
/// back negative edge distances or an inconsistent point-index walk trips
/// this rather than propagating garbage into the instruction list.
fn validate_instruction(instruction: Instruction) -> Result<Instruction, OdinError> {
    if instruction.distance() < 0.0 {
        return Err(OdinError::GraphContractViolation {
            reason: format!(
                "instruction onto {:?} has negative distance {}",
                instruction.name(),
                instruction.distance()
            ),
        });
    }
    let points = instruction.points();
    if points.last < points.first {
        return Err(OdinError::GraphContractViolation {
            reason: format!(
                "instruction onto {:?} has a non-monotone point range [{}, {})",
                instruction.name(),
                points.first,
                points.last
            ),
        });
    }
    Ok(instruction)
}

/// Synthesizes the turn-by-turn instruction list for a reconstructed path
/// (spec.md §4.2).
///
/// # Errors
///
/// Propagates [`OdinError::GraphContractViolation`] if the façade hands back
/// data that violates invariants checked at instruction finalization
/// (non-negative distance, monotone point indices).
pub fn synthesize(
    path: &Path,
    facade: &dyn GraphFacade,
    weighting: &dyn Weighting,
) -> Result<InstructionList, OdinError> {
    let mut instructions = InstructionList::new();

    if path.edges.is_empty() {
        return Ok(instructions);
    }

    let spans = edge_point_spans(path);
    let mut open = Open::start(&path.edges[0], OpenKind::Continue, spans[0].0, 0);
    open.accumulate(&path.edges[0], weighting.edge_millis(&path.edges[0], false), 0);

    for i in 1..path.edges.len() {
        let prev = &path.edges[i - 1];
        let edge = &path.edges[i];
        let v = edge.base_node;
        let millis = weighting.edge_millis(edge, false);

        // Roundabout continuation: swallow the edge into the in-progress
        // roundabout accumulation regardless of the normal emission rules.
        if let OpenKind::Roundabout(progress) = &mut open.kind {
            if edge.roundabout {
                let alternatives = alternatives_at(facade, weighting, v, prev);
                progress.observe_intermediate_node(&alternatives);
                open.accumulate(edge, millis, i);
                continue;
            }

            // Roundabout exit (spec.md §4.2 step 6).
            let exit_bearing = edge_departure_bearing(edge, facade);
            let turn_angle = progress.exit_turn_angle(exit_bearing);
            let exit_number = progress.exit_number();
            let roundabout_name = progress.name.clone();
            let points = PointRange {
                first: open.first_point,
                last: spans[i - 1].1,
            };
            instructions.push(validate_instruction(Instruction::Roundabout {
                exit_number,
                turn_angle,
                name: roundabout_name,
                distance: open.distance,
                time: open.time,
                points,
                exited: true,
            })?);
            open = Open::start(edge, OpenKind::Continue, spans[i].0, i);
            open.accumulate(edge, millis, i);
            continue;
        }

        // Roundabout entry (spec.md §4.2 step 4).
        if edge.roundabout && !prev.roundabout {
            instructions.push(validate_instruction(open.finalize(&spans))?);
            let entry_bearing = edge_departure_bearing(edge, facade);
            let progress = RoundaboutProgress::enter(entry_bearing, edge.name.clone());
            open = Open::start(edge, OpenKind::Roundabout(progress), spans[i].0, i);
            open.accumulate(edge, millis, i);
            continue;
        }

        // Ferry transitions (spec.md §4.2 step 3) — unconditional, bypassing
        // the alternative-based suppression rules below.
        if prev.road_environment != RoadEnvironment::Ferry && edge.road_environment == RoadEnvironment::Ferry {
            instructions.push(validate_instruction(open.finalize(&spans))?);
            open = Open::start(edge, OpenKind::Ferry, spans[i].0, i);
            open.accumulate(edge, millis, i);
            continue;
        }
        if prev.road_environment == RoadEnvironment::Ferry && edge.road_environment != RoadEnvironment::Ferry {
            let in_bearing = edge_arrival_bearing(prev, facade);
            let out_bearing = edge_departure_bearing(edge, facade);
            let delta = geometry::turn_angle(in_bearing, out_bearing);
            let band = geometry::classify_angle(delta);
            let sign = match band {
                AngleBand::UTurn => uturn_sign(delta),
                AngleBand::Normal | AngleBand::Sharp => normal_or_sharp_sign(band, delta),
                AngleBand::Slight => slight_sign(delta),
                AngleBand::Straight => Sign::Ignore,
            };
            instructions.push(validate_instruction(open.finalize(&spans))?);
            open = Open::start(edge, OpenKind::Turn(sign), spans[i].0, i);
            open.accumulate(edge, millis, i);
            continue;
        }

        // Otherwise: the ordinary non-roundabout, non-ferry junction
        // (spec.md §4.2 step 7).
        let in_bearing = edge_arrival_bearing(prev, facade);
        let out_bearing = edge_departure_bearing(edge, facade);
        let delta = geometry::turn_angle(in_bearing, out_bearing);
        let band = geometry::classify_angle(delta);
        let street_matches = same_street(prev, edge);

        if band == AngleBand::UTurn && street_matches {
            instructions.push(validate_instruction(open.finalize(&spans))?);
            open = Open::start(edge, OpenKind::Turn(uturn_sign(delta)), spans[i].0, i);
            open.accumulate(edge, millis, i);
            continue;
        }

        let alternatives = alternatives_at(facade, weighting, v, prev);

        match band {
            AngleBand::Straight => {
                if names_equal(prev, edge) || alternatives.len() <= 1 {
                    // No real rename (plain string equality, so two unnamed
                    // edges count as unchanged), or no real alternative at
                    // this junction: extend the current instruction without
                    // emitting.
                    open.accumulate(edge, millis, i);
                } else {
                    instructions.push(validate_instruction(open.finalize(&spans))?);
                    open = Open::start(edge, OpenKind::Continue, spans[i].0, i);
                    open.accumulate(edge, millis, i);
                }
            }
            AngleBand::Slight => {
                let comparable_alt_same_side = alternatives.iter().any(|alt| {
                    if alt.edge_id == edge.edge_id {
                        return false;
                    }
                    let alt_out_bearing = edge_departure_bearing(alt, facade);
                    let alt_delta = geometry::turn_angle(in_bearing, alt_out_bearing);
                    geometry::classify_angle(alt_delta) == AngleBand::Slight
                        && (alt_delta < 0.0) == (delta < 0.0)
                });

                if comparable_alt_same_side {
                    instructions.push(validate_instruction(open.finalize(&spans))?);
                    open = Open::start(edge, OpenKind::Turn(keep_sign(delta)), spans[i].0, i);
                    open.accumulate(edge, millis, i);
                } else if street_matches {
                    // The road simply bends; no competing alternative.
                    open.accumulate(edge, millis, i);
                } else if is_motorway_fork(prev, edge) {
                    // Known weakness preserved verbatim (spec.md §9): this
                    // ought to be a keepRight, but stays a silent
                    // continuation; downstream code handles the ramp.
                    open.accumulate(edge, millis, i);
                } else {
                    instructions.push(validate_instruction(open.finalize(&spans))?);
                    open = Open::start(edge, OpenKind::Turn(slight_sign(delta)), spans[i].0, i);
                    open.accumulate(edge, millis, i);
                }
            }
            AngleBand::Normal | AngleBand::Sharp => {
                instructions.push(validate_instruction(open.finalize(&spans))?);
                open = Open::start(edge, OpenKind::Turn(normal_or_sharp_sign(band, delta)), spans[i].0, i);
                open.accumulate(edge, millis, i);
            }
            AngleBand::UTurn => {
                instructions.push(validate_instruction(open.finalize(&spans))?);
                open = Open::start(edge, OpenKind::Turn(uturn_sign(delta)), spans[i].0, i);
                open.accumulate(edge, millis, i);
            }
        }
    }

    // If the path ends mid-roundabout (no exit edge was ever reached), the
    // roundabout itself still needs to be finalized; there's no exit
    // tangent to compute an angle from, so the angle is left at zero.
    match open.kind {
        OpenKind::Roundabout(ref progress) => {
            let points = PointRange {
                first: open.first_point,
                last: spans[open.last_edge_index].1,
            };
            instructions.push(validate_instruction(Instruction::Roundabout {
                exit_number: progress.exit_number(),
                turn_angle: 0.0,
                name: progress.name.clone(),
                distance: open.distance,
                time: open.time,
                points,
                exited: false,
            })?);
        }
        _ => instructions.push(validate_instruction(open.finalize(&spans))?),
    }

    let last_point = spans[spans.len() - 1].1;
    let finish_name = path.edges.last().map(|e| e.name.clone()).unwrap_or_default();
    instructions.push(validate_instruction(Instruction::Finish {
        name: finish_name,
        points: PointRange {
            first: last_point,
            last: last_point,
        },
    })?);

    Ok(instructions)
}
