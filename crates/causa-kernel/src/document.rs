//! Graph documents: the JSON boundary of a reality graph.
//!
//! A document lists nodes and edges in order, optionally with an embedded
//! verification context. Edge ids may be omitted; missing ids are generated
//! when the document is loaded.
//!
//! ```json
//! {
//!   "nodes": [{"id": "d1", "kind": "decision", "name": "Use Postgres"}],
//!   "edges": [{"source": "d1", "target": "b1", "kind": "causes"}],
//!   "context": {"failure_inevitability_index": 0.2}
//! }
//! ```

use crate::context::VerificationContext;
use crate::error::{DocumentError, GraphError};
use crate::graph::{Edge, EdgeId, EdgeKind, Metadata, Node, NodeId, RealityGraph};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(alias = "type")]
    pub kind: EdgeKind,
    #[serde(default = "unit")]
    pub weight: f64,
    #[serde(default = "unit")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

fn unit() -> f64 {
    1.0
}

impl From<&Edge> for EdgeDocument {
    fn from(edge: &Edge) -> Self {
        Self {
            id: Some(edge.id.clone()),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind,
            weight: edge.weight,
            confidence: edge.confidence,
            metadata: edge.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<VerificationContext>,
}

impl GraphDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Export a graph. Nodes and edges keep graph order; no context.
    pub fn from_graph(graph: &RealityGraph) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().map(EdgeDocument::from).collect(),
            context: None,
        }
    }

    /// Build a graph. Fails on the first structural error.
    ///
    /// Generated ids never take an id spelled out later in the document.
    pub fn to_graph(&self) -> Result<RealityGraph, GraphError> {
        let mut graph = RealityGraph::new();
        for node in &self.nodes {
            graph.add_node(node.clone())?;
        }
        let explicit: BTreeSet<&EdgeId> =
            self.edges.iter().filter_map(|e| e.id.as_ref()).collect();
        for doc in &self.edges {
            let id = match &doc.id {
                Some(id) => id.clone(),
                None => loop {
                    let id = graph.fresh_edge_id();
                    if !explicit.contains(&id) {
                        break id;
                    }
                },
            };
            let mut edge = Edge::new(id, doc.source.clone(), doc.target.clone(), doc.kind)
                .with_weight(doc.weight)
                .with_confidence(doc.confidence);
            edge.metadata = doc.metadata.clone();
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// `sha256:<hex>` over the compact JSON encoding of the graph part.
    ///
    /// Metadata maps are ordered, so equal documents always hash equal.
    /// The embedded context does not contribute.
    pub fn digest(&self) -> String {
        let graph_only = GraphDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            context: None,
        };
        // Serializing plain data with string keys cannot fail.
        let bytes = serde_json::to_vec(&graph_only).unwrap_or_default();
        let hash = Sha256::digest(&bytes);
        let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
        format!("sha256:{hex}")
    }
}

/// Digest of a graph as exported.
pub fn graph_digest(graph: &RealityGraph) -> String {
    GraphDocument::from_graph(graph).digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Endpoint;
    use crate::graph::NodeKind;

    const DOC: &str = r#"{
        "nodes": [
            {"id": "d1", "kind": "decision", "name": "Use Postgres", "criticality": 0.9},
            {"id": "b1", "type": "behavior", "name": "Durable writes"}
        ],
        "edges": [
            {"source": "d1", "target": "b1", "kind": "causes"},
            {"id": "x", "source": "b1", "target": "d1", "type": "depends_on", "metadata": {"note": 1}}
        ],
        "context": {"failure_inevitability_index": 0.25}
    }"#;

    #[test]
    fn loads_document_with_generated_edge_ids() {
        let doc = GraphDocument::from_json_str(DOC).expect("document parses");
        assert_eq!(
            doc.context.as_ref().map(|c| c.failure_inevitability_index),
            Some(0.25)
        );
        let graph = doc.to_graph().expect("graph builds");
        let ids: Vec<&str> = graph.edges().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "x"]);
        let b1 = graph.node(&"b1".into()).expect("b1 present");
        assert_eq!(b1.kind, NodeKind::Behavior);
        assert_eq!(b1.criticality, 0.5);
    }

    #[test]
    fn generated_ids_skip_ids_declared_later() {
        let raw = r#"{"nodes": [{"id": "a", "kind": "decision", "name": "A"},
                                {"id": "b", "kind": "behavior", "name": "B"}],
                      "edges": [{"source": "a", "target": "b", "kind": "causes"},
                                {"id": "e1", "source": "a", "target": "b", "kind": "enables"},
                                {"source": "b", "target": "a", "kind": "depends_on"}]}"#;
        let graph = GraphDocument::from_json_str(raw)
            .expect("shape is valid")
            .to_graph()
            .expect("unique explicit ids must load");
        let edges: Vec<(&str, EdgeKind)> =
            graph.edges().map(|e| (e.id.as_str(), e.kind)).collect();
        assert_eq!(
            edges,
            vec![
                ("e2", EdgeKind::Causes),
                ("e1", EdgeKind::Enables),
                ("e3", EdgeKind::DependsOn),
            ]
        );
        assert!(graph.indices_consistent());
    }

    #[test]
    fn dangling_edge_is_a_graph_error() {
        let raw = r#"{"nodes": [{"id": "a", "kind": "decision", "name": "A"}],
                      "edges": [{"id": "e9", "source": "ghost", "target": "a", "kind": "causes"}]}"#;
        let err = GraphDocument::from_json_str(raw)
            .expect("shape is valid")
            .to_graph()
            .expect_err("ghost source must fail");
        assert_eq!(
            err,
            GraphError::UnknownNode {
                edge: EdgeId::new("e9"),
                endpoint: Endpoint::Source,
                node: NodeId::new("ghost"),
            }
        );
    }

    #[test]
    fn malformed_json_is_a_document_error() {
        let err = GraphDocument::from_json_str("{\"nodes\": [1]}").expect_err("bad node");
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn digest_is_stable_and_ignores_context() {
        let doc = GraphDocument::from_json_str(DOC).expect("document parses");
        let exported = GraphDocument::from_graph(&doc.to_graph().expect("graph builds"));

        let digest = exported.digest();
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), "sha256:".len() + 64);

        let reloaded = exported.to_graph().expect("export reloads");
        assert_eq!(graph_digest(&reloaded), digest);

        let mut with_context = exported.clone();
        with_context.context = Some(VerificationContext::new());
        assert_eq!(with_context.digest(), digest);
    }
}
