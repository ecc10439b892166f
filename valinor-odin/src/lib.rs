//! Turn-by-turn instruction synthesis and path-detail extraction over an
//! already-computed shortest path.
//!
//! Given a completed shortest-path result over a road graph — a sequence of
//! directed edges with attached attributes — this crate produces a
//! human-readable sequence of navigation instructions (continue,
//! slight/normal/sharp left/right, U-turn, roundabout-with-exit-count,
//! ferry, arrive), plus a path-detail extractor that partitions a path into
//! maximal contiguous runs sharing a chosen attribute.
//!
//! Out of scope: the shortest-path search itself, map ingestion, persistent
//! graph storage, encoded-value bit-packing, translation/locale lookup, and
//! HTTP/CLI surfaces. This crate consumes a read-only [`graph::GraphFacade`]
//! and a reconstructed predecessor chain ([`path::SptEntry`]).

pub mod detail;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod instruction;
pub mod path;
pub mod roundabout;
pub mod synthesizer;
pub mod translator;
pub mod weighting;

pub use detail::{DetailBuilder, DetailContext, DetailKey, PathDetail, extract_path_details};
pub use error::OdinError;
pub use graph::{DirectedEdgeView, EdgeId, GraphFacade, LatLon, NodeId, RoadClass, RoadEnvironment};
pub use instruction::{Instruction, InstructionList, PointRange, Sign};
pub use path::{Path, SptEntry, calc_points, edge_point_spans, reconstruct_path};
pub use synthesizer::synthesize;
pub use translator::Translator;
pub use weighting::{SimpleWeighting, Weighting};
