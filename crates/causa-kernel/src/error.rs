//! Error types for Causa kernel operations.
//!
//! Only structural problems are errors. Degenerate inputs (empty graphs, no
//! decisions, no resources) flow through the analysis and end up in the
//! `Unverified` verdict branch instead.

use crate::graph::{EdgeId, NodeId};

/// Which end of an edge referenced a missing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Source,
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Errors raised while mutating a reality graph.
///
/// A failed mutation leaves the graph exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint does not exist in the node collection.
    #[error("edge {edge} references unknown {endpoint} node {node}")]
    UnknownNode {
        edge: EdgeId,
        endpoint: Endpoint,
        node: NodeId,
    },

    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("edge already exists: {0}")]
    DuplicateEdge(EdgeId),
}

/// Errors raised while decoding a graph document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid graph document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
