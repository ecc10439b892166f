//! Error types for path reconstruction and instruction synthesis.

use thiserror::Error;

/// Failure modes for the core of this crate.
///
/// `EmptyPath` from spec.md §7 is deliberately not a variant here: an empty
/// path is not an error, it's a successful [`crate::path::Path`] with
/// `found = false` and no edges.
#[derive(Debug, Error)]
pub enum OdinError {
    /// The predecessor chain handed to [`crate::path::reconstruct_path`] is
    /// inconsistent: a traversed edge id has no corresponding
    /// [`crate::graph::DirectedEdgeView`] in the graph façade, or two
    /// consecutive entries don't share a node.
    #[error("Path is malformed: {reason}")]
    PathMalformed { reason: String },

    /// The graph façade returned data that violates its contract: a
    /// requested attribute is missing, or an encoded enum value is out of
    /// range.
    #[error("Graph contract violation: {reason}")]
    GraphContractViolation { reason: String },
}
