//! Reality graph: the causal model of a system under verification.
//!
//! Nodes are decisions, constraints, assumptions, resources, behaviors and
//! the like; edges are typed causal relationships between them. This is not
//! a call graph or a package graph. An edge `A --causes--> B` claims that B
//! exists because of A.
//!
//! The graph owns three synchronized structures:
//! - the node and edge stores (keyed by id, plus insertion order),
//! - forward adjacency (node -> outgoing edge ids),
//! - reverse adjacency (node -> incoming edge ids).
//!
//! Every edge id sits in exactly one forward bucket and one reverse bucket,
//! and both endpoints of every edge exist. All mutation goes through
//! `RealityGraph` methods, which validate before touching any index.
//!
//! Iteration order is insertion order everywhere, so every derived result
//! (contradictions, collapse paths, scenarios) is reproducible.

use crate::error::{Endpoint, GraphError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Open string-keyed metadata attached to nodes and edges.
pub type Metadata = BTreeMap<String, Value>;

/// Default criticality threshold used by `stats()`.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.7;

pub const META_CAPACITY: &str = "capacity";
pub const META_RESOURCE_DEMAND: &str = "resource_demand";
pub const META_AVAILABLE: &str = "available";
pub const META_HAS_REDUNDANCY: &str = "has_redundancy";
pub const META_SEVERITY: &str = "severity";
pub const META_REASON: &str = "reason";

const DEFAULT_EXPLICIT_SEVERITY: f64 = 0.9;
const OVERSUBSCRIPTION_SEVERITY: f64 = 0.85;
const HA_SINGLE_POINT_SEVERITY: f64 = 0.95;
const STATELESS_STATEFUL_SEVERITY: f64 = 0.7;

/// Stable identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stable identifier for an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Node classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Explicit engineering decision.
    Decision,
    /// Direct result of decisions.
    Consequence,
    /// Limit or boundary condition.
    Constraint,
    /// Implicit or explicit assumption.
    Assumption,
    /// System resource (cpu, memory, a human, ...).
    Resource,
    /// Observable system behavior.
    Behavior,
    /// Identified failure scenario.
    FailureMode,
    /// Operational or organizational policy.
    Policy,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Decision,
        NodeKind::Consequence,
        NodeKind::Constraint,
        NodeKind::Assumption,
        NodeKind::Resource,
        NodeKind::Behavior,
        NodeKind::FailureMode,
        NodeKind::Policy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Decision => "decision",
            NodeKind::Consequence => "consequence",
            NodeKind::Constraint => "constraint",
            NodeKind::Assumption => "assumption",
            NodeKind::Resource => "resource",
            NodeKind::Behavior => "behavior",
            NodeKind::FailureMode => "failure_mode",
            NodeKind::Policy => "policy",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A causes B.
    Causes,
    /// A requires B to function.
    Requires,
    /// A and B are mutually exclusive.
    Contradicts,
    /// A depends on B.
    DependsOn,
    /// A enables B to exist.
    Enables,
    /// A weakens the guarantees of B.
    Weakens,
    /// A assumes B holds.
    Assumes,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Causes => "causes",
            EdgeKind::Requires => "requires",
            EdgeKind::Contradicts => "contradicts",
            EdgeKind::DependsOn => "depends_on",
            EdgeKind::Enables => "enables",
            EdgeKind::Weakens => "weakens",
            EdgeKind::Assumes => "assumes",
        }
    }

    /// Edges followed by `causal_paths`.
    pub fn is_causal(&self) -> bool {
        matches!(self, EdgeKind::Causes | EdgeKind::Enables | EdgeKind::Requires)
    }

    /// Edges along which a failure propagates to dependents.
    pub fn propagates_failure(&self) -> bool {
        matches!(self, EdgeKind::Causes | EdgeKind::Enables)
    }

    /// Edges that can form a wait-for cycle.
    pub fn is_blocking(&self) -> bool {
        matches!(self, EdgeKind::Requires | EdgeKind::DependsOn)
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the reality graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// In [0, 1]. Out-of-range input is clamped on load.
    #[serde(default = "default_criticality", deserialize_with = "unit_interval")]
    pub criticality: f64,
}

fn default_criticality() -> f64 {
    0.5
}

fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.clamp(0.0, 1.0))
}

/// Truthiness of a metadata value: `false`, `null`, zero, and empty
/// strings, arrays or objects are false; everything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            description: String::new(),
            metadata: Metadata::new(),
            criticality: default_criticality(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set criticality, clamped to [0, 1].
    pub fn with_criticality(mut self, criticality: f64) -> Self {
        self.criticality = criticality.clamp(0.0, 1.0);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    /// Demand this node places on each resource it requires (default 1).
    pub fn resource_demand(&self) -> f64 {
        self.meta_f64(META_RESOURCE_DEMAND).unwrap_or(1.0)
    }

    /// Resource capacity; unbounded when not declared.
    pub fn capacity(&self) -> f64 {
        self.meta_f64(META_CAPACITY).unwrap_or(f64::INFINITY)
    }

    /// Any truthy `has_redundancy` value counts (`true`, `1`, `"yes"`).
    pub fn has_redundancy(&self) -> bool {
        self.metadata.get(META_HAS_REDUNDANCY).is_some_and(truthy)
    }

    fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A typed, directed edge between two existing nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(alias = "type")]
    pub kind: EdgeKind,
    /// Strength of the relationship. Informational.
    #[serde(default = "default_unit")]
    pub weight: f64,
    /// How certain the relationship is. Informational.
    #[serde(default = "default_unit")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_unit() -> f64 {
    1.0
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
            weight: 1.0,
            confidence: 1.0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the edge touches `node` in either direction.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Which detector produced a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionSource {
    ExplicitEdge,
    ResourceOversubscription,
    NamePattern,
}

/// A detected contradiction between two nodes. Computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub node_a_name: String,
    pub node_b_name: String,
    pub severity: f64,
    pub explanation: String,
    pub causal_chain: Vec<String>,
    pub source: ContradictionSource,
}

impl Contradiction {
    fn between(
        a: &Node,
        b: &Node,
        severity: f64,
        explanation: String,
        causal_chain: Vec<String>,
        source: ContradictionSource,
    ) -> Self {
        Self {
            node_a: a.id.clone(),
            node_b: b.id.clone(),
            node_a_name: a.name.clone(),
            node_b_name: b.name.clone(),
            severity,
            explanation,
            causal_chain,
            source,
        }
    }
}

/// Graph statistics: counts by kind plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub critical_nodes: usize,
    pub by_kind: BTreeMap<NodeKind, usize>,
}

impl GraphStats {
    pub fn count(&self, kind: NodeKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn decisions(&self) -> usize {
        self.count(NodeKind::Decision)
    }

    pub fn behaviors(&self) -> usize {
        self.count(NodeKind::Behavior)
    }

    pub fn assumptions(&self) -> usize {
        self.count(NodeKind::Assumption)
    }
}

/// The directed causal graph of a system under verification.
#[derive(Debug, Default)]
pub struct RealityGraph {
    nodes: BTreeMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    edges: BTreeMap<EdgeId, Edge>,
    edge_order: Vec<EdgeId>,
    outgoing: BTreeMap<NodeId, Vec<EdgeId>>,
    incoming: BTreeMap<NodeId, Vec<EdgeId>>,
    edge_seq: u64,
}

impl RealityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy: every node and edge is reallocated and both adjacency
    /// indices are rebuilt from the copied edges. The copy shares no
    /// metadata with `self`.
    pub fn deep_clone(&self) -> Self {
        let mut copy = Self {
            edge_seq: self.edge_seq,
            ..Self::default()
        };
        for node in self.nodes() {
            copy.insert_node_unchecked(node.clone());
        }
        for edge in self.edges() {
            copy.insert_edge_unchecked(edge.clone());
        }
        copy
    }

    /// Add a node. Node ids are unique.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.insert_node_unchecked(node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        if !self.nodes.contains_key(&edge.source) {
            return Err(GraphError::UnknownNode {
                edge: edge.id,
                endpoint: Endpoint::Source,
                node: edge.source,
            });
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(GraphError::UnknownNode {
                edge: edge.id,
                endpoint: Endpoint::Target,
                node: edge.target,
            });
        }
        self.insert_edge_unchecked(edge);
        Ok(())
    }

    /// Add an edge with a freshly generated id.
    pub fn connect(
        &mut self,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        kind: EdgeKind,
    ) -> Result<EdgeId, GraphError> {
        let id = self.fresh_edge_id();
        self.add_edge(Edge::new(id.clone(), source, target, kind))?;
        Ok(id)
    }

    /// Next unused generated edge id (`e1`, `e2`, ...).
    pub fn fresh_edge_id(&mut self) -> EdgeId {
        loop {
            self.edge_seq += 1;
            let id = EdgeId(format!("e{}", self.edge_seq));
            if !self.edges.contains_key(&id) {
                return id;
            }
        }
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;

        let mut touching: Vec<EdgeId> = Vec::new();
        touching.extend(self.outgoing.remove(id).unwrap_or_default());
        for edge_id in self.incoming.remove(id).unwrap_or_default() {
            if !touching.contains(&edge_id) {
                touching.push(edge_id);
            }
        }

        for edge_id in &touching {
            if let Some(edge) = self.edges.remove(edge_id) {
                if let Some(bucket) = self.outgoing.get_mut(&edge.source) {
                    bucket.retain(|e| e != edge_id);
                }
                if let Some(bucket) = self.incoming.get_mut(&edge.target) {
                    bucket.retain(|e| e != edge_id);
                }
            }
        }
        self.edge_order.retain(|e| !touching.contains(e));
        self.node_order.retain(|n| n != id);
        Some(node)
    }

    fn insert_node_unchecked(&mut self, node: Node) {
        let id = node.id.clone();
        self.outgoing.entry(id.clone()).or_default();
        self.incoming.entry(id.clone()).or_default();
        self.node_order.push(id.clone());
        self.nodes.insert(id, node);
    }

    fn insert_edge_unchecked(&mut self, edge: Edge) {
        let id = edge.id.clone();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(id.clone());
        self.edge_order.push(id.clone());
        self.edges.insert(id, edge);
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node access is reserved for counterfactual mutation operators.
    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    /// Edges leaving `id`, O(out-degree).
    pub fn outgoing_edges(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
    }

    /// Edges entering `id`, O(in-degree).
    pub fn incoming_edges(&self, id: &NodeId) -> impl Iterator<Item = &Edge> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|edge_id| self.edges.get(edge_id))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes().filter(|n| n.kind == kind).collect()
    }

    /// Nodes with `criticality >= threshold`, in insertion order.
    pub fn critical_nodes(&self, threshold: f64) -> Vec<&Node> {
        self.nodes()
            .filter(|n| n.criticality >= threshold)
            .collect()
    }

    /// Whether `id` is a decision or can be reached backwards from one.
    ///
    /// Walks incoming edges of every kind. Unknown ids have no ancestry.
    pub fn has_decision_ancestry(&self, id: &NodeId) -> bool {
        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        let mut stack: Vec<&NodeId> = vec![id];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if node.kind == NodeKind::Decision {
                return true;
            }
            for edge in self.incoming_edges(current) {
                stack.push(&edge.source);
            }
        }

        false
    }

    /// Nodes reachable forward from `id` along edges accepted by `follow`,
    /// in discovery order. `id` itself is only included when a cycle leads
    /// back to it.
    pub fn reachable_from(&self, id: &NodeId, follow: impl Fn(EdgeKind) -> bool) -> Vec<NodeId> {
        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut reached = Vec::new();
        let mut stack: Vec<&NodeId> = vec![id];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for edge in self.outgoing_edges(current) {
                if follow(edge.kind) {
                    if seen.insert(&edge.target) {
                        reached.push(edge.target.clone());
                    }
                    stack.push(&edge.target);
                }
            }
        }

        reached
    }

    /// Every contradiction in the graph.
    ///
    /// Detector order is fixed: explicit `contradicts` edges, then resource
    /// oversubscription, then name-pattern heuristics.
    pub fn find_contradictions(&self) -> Vec<Contradiction> {
        let mut found = self.explicit_contradictions();
        found.extend(self.resource_contradictions());
        found.extend(self.name_pattern_contradictions());
        found
    }

    fn explicit_contradictions(&self) -> Vec<Contradiction> {
        let mut found = Vec::new();
        for edge in self.edges().filter(|e| e.kind == EdgeKind::Contradicts) {
            let (Some(a), Some(b)) = (self.node(&edge.source), self.node(&edge.target)) else {
                continue;
            };
            let severity = edge
                .metadata
                .get(META_SEVERITY)
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_EXPLICIT_SEVERITY);
            let explanation = edge
                .metadata
                .get(META_REASON)
                .and_then(Value::as_str)
                .unwrap_or("Explicit contradiction")
                .to_string();
            found.push(Contradiction::between(
                a,
                b,
                severity,
                explanation,
                vec![a.name.clone(), "contradicts".to_string(), b.name.clone()],
                ContradictionSource::ExplicitEdge,
            ));
        }
        found
    }

    /// Sources of incoming `requires` edges on `resource`, in edge order.
    pub fn consumers_of(&self, resource: &NodeId) -> Vec<&Node> {
        self.incoming_edges(resource)
            .filter(|e| e.kind == EdgeKind::Requires)
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    fn resource_contradictions(&self) -> Vec<Contradiction> {
        let mut found = Vec::new();
        for resource in self.nodes_of_kind(NodeKind::Resource) {
            let consumers = self.consumers_of(&resource.id);
            if consumers.len() < 2 {
                continue;
            }
            let capacity = resource.capacity();
            let demand: f64 = consumers.iter().map(|c| c.resource_demand()).sum();
            if demand <= capacity {
                continue;
            }
            let (a, b) = (consumers[0], consumers[1]);
            found.push(Contradiction::between(
                a,
                b,
                OVERSUBSCRIPTION_SEVERITY,
                format!(
                    "Resource '{}' oversubscribed: {demand} > {capacity}",
                    resource.name
                ),
                vec![
                    a.name.clone(),
                    format!("requires {}", resource.name),
                    b.name.clone(),
                    "resource_exhausted".to_string(),
                ],
                ContradictionSource::ResourceOversubscription,
            ));
        }
        found
    }

    // Substring heuristics over decision names. Known to be weak on
    // real-world naming; kept for compatibility with existing models.
    fn name_pattern_contradictions(&self) -> Vec<Contradiction> {
        let decisions: Vec<(&Node, String)> = self
            .nodes_of_kind(NodeKind::Decision)
            .into_iter()
            .map(|n| (n, n.name_lower()))
            .collect();

        let high_availability = decisions
            .iter()
            .filter(|(_, name)| name.contains("high") && name.contains("availab"));
        let single_points: Vec<&Node> = decisions
            .iter()
            .filter(|(_, name)| name.contains("single"))
            .map(|(n, _)| *n)
            .collect();
        let stateless: Vec<&Node> = decisions
            .iter()
            .filter(|(_, name)| name.contains("stateless"))
            .map(|(n, _)| *n)
            .collect();
        let stateful: Vec<&Node> = decisions
            .iter()
            .filter(|(_, name)| name.contains("state") && !name.contains("stateless"))
            .map(|(n, _)| *n)
            .collect();

        let mut found = Vec::new();
        for (ha, _) in high_availability {
            for sp in &single_points {
                found.push(Contradiction::between(
                    ha,
                    sp,
                    HA_SINGLE_POINT_SEVERITY,
                    "High availability cannot coexist with single point of failure".to_string(),
                    vec![
                        ha.name.clone(),
                        "requires_redundancy".to_string(),
                        sp.name.clone(),
                        "lacks_redundancy".to_string(),
                    ],
                    ContradictionSource::NamePattern,
                ));
            }
        }
        for sl in &stateless {
            for sf in &stateful {
                found.push(Contradiction::between(
                    sl,
                    sf,
                    STATELESS_STATEFUL_SEVERITY,
                    "Stateless architecture contradicts stateful component".to_string(),
                    vec![
                        sl.name.clone(),
                        "requires_no_state".to_string(),
                        sf.name.clone(),
                        "maintains_state".to_string(),
                    ],
                    ContradictionSource::NamePattern,
                ));
            }
        }
        found
    }

    /// Every simple path from `from` to `to` over causes/enables/requires
    /// edges.
    ///
    /// Exhaustive enumeration; exponential in the worst case. Callers are
    /// responsible for bounding the graph they ask about.
    pub fn causal_paths(&self, from: &NodeId, to: &NodeId) -> Vec<Vec<NodeId>> {
        let mut paths = Vec::new();
        if !self.contains_node(from) || !self.contains_node(to) {
            return paths;
        }
        let mut on_path = BTreeSet::new();
        let mut path = Vec::new();
        self.walk_causal(from, to, &mut on_path, &mut path, &mut paths);
        paths
    }

    fn walk_causal<'a>(
        &'a self,
        current: &'a NodeId,
        to: &NodeId,
        on_path: &mut BTreeSet<&'a NodeId>,
        path: &mut Vec<NodeId>,
        paths: &mut Vec<Vec<NodeId>>,
    ) {
        if !on_path.insert(current) {
            return;
        }
        path.push(current.clone());

        if current == to {
            paths.push(path.clone());
        } else {
            for edge in self.outgoing_edges(current) {
                if edge.kind.is_causal() {
                    self.walk_causal(&edge.target, to, on_path, path, paths);
                }
            }
        }

        path.pop();
        on_path.remove(current);
    }

    pub fn stats(&self) -> GraphStats {
        let mut by_kind = BTreeMap::new();
        for node in self.nodes() {
            *by_kind.entry(node.kind).or_insert(0) += 1;
        }
        GraphStats {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            critical_nodes: self.critical_nodes(DEFAULT_CRITICAL_THRESHOLD).len(),
            by_kind,
        }
    }

    /// Check that the adjacency indices agree with the edge store.
    pub fn indices_consistent(&self) -> bool {
        let forward: usize = self.outgoing.values().map(Vec::len).sum();
        let reverse: usize = self.incoming.values().map(Vec::len).sum();
        if forward != self.edges.len() || reverse != self.edges.len() {
            return false;
        }
        self.edges.values().all(|edge| {
            self.nodes.contains_key(&edge.source)
                && self.nodes.contains_key(&edge.target)
                && self
                    .outgoing
                    .get(&edge.source)
                    .is_some_and(|b| b.contains(&edge.id))
                && self
                    .incoming
                    .get(&edge.target)
                    .is_some_and(|b| b.contains(&edge.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(id: &str, name: &str) -> Node {
        Node::new(id, NodeKind::Decision, name)
    }

    fn graph_with(nodes: Vec<Node>, edges: Vec<Edge>) -> RealityGraph {
        let mut graph = RealityGraph::new();
        for node in nodes {
            graph.add_node(node).expect("node should insert");
        }
        for edge in edges {
            graph.add_edge(edge).expect("edge should insert");
        }
        graph
    }

    #[test]
    fn add_edge_rejects_unknown_endpoint_without_mutation() {
        let mut graph = graph_with(vec![decision("d1", "Use Postgres")], vec![]);
        let err = graph
            .add_edge(Edge::new("e1", "d1", "missing", EdgeKind::Causes))
            .expect_err("dangling edge must be rejected");

        assert_eq!(
            err,
            GraphError::UnknownNode {
                edge: EdgeId::new("e1"),
                endpoint: Endpoint::Target,
                node: NodeId::new("missing"),
            }
        );
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.indices_consistent());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut graph = graph_with(
            vec![decision("d1", "A"), decision("d2", "B")],
            vec![Edge::new("e1", "d1", "d2", EdgeKind::Causes)],
        );
        assert_eq!(
            graph.add_node(decision("d1", "again")),
            Err(GraphError::DuplicateNode(NodeId::new("d1")))
        );
        assert_eq!(
            graph.add_edge(Edge::new("e1", "d2", "d1", EdgeKind::Causes)),
            Err(GraphError::DuplicateEdge(EdgeId::new("e1")))
        );
    }

    #[test]
    fn adjacency_tracks_direction() {
        let graph = graph_with(
            vec![decision("d1", "A"), decision("d2", "B")],
            vec![Edge::new("e1", "d1", "d2", EdgeKind::Causes)],
        );
        let out: Vec<_> = graph.outgoing_edges(&"d1".into()).map(|e| &e.id).collect();
        let inc: Vec<_> = graph.incoming_edges(&"d2".into()).map(|e| &e.id).collect();
        assert_eq!(out, vec![&EdgeId::new("e1")]);
        assert_eq!(inc, vec![&EdgeId::new("e1")]);
        assert_eq!(graph.incoming_edges(&"d1".into()).count(), 0);
    }

    #[test]
    fn decision_ancestry_walks_incoming_edges() {
        let graph = graph_with(
            vec![
                decision("d1", "Shard by tenant"),
                Node::new("c1", NodeKind::Consequence, "Cross-shard joins"),
                Node::new("b1", NodeKind::Behavior, "Slow reports"),
                Node::new("b2", NodeKind::Behavior, "Nightly spikes"),
            ],
            vec![
                Edge::new("e1", "d1", "c1", EdgeKind::Causes),
                Edge::new("e2", "c1", "b1", EdgeKind::Causes),
            ],
        );
        assert!(graph.has_decision_ancestry(&"b1".into()));
        assert!(!graph.has_decision_ancestry(&"b2".into()));
        assert!(graph.has_decision_ancestry(&"d1".into()));
    }

    #[test]
    fn decision_ancestry_terminates_on_cycles() {
        let graph = graph_with(
            vec![
                Node::new("b1", NodeKind::Behavior, "Retry storm"),
                Node::new("b2", NodeKind::Behavior, "Queue growth"),
            ],
            vec![
                Edge::new("e1", "b1", "b2", EdgeKind::Causes),
                Edge::new("e2", "b2", "b1", EdgeKind::Causes),
            ],
        );
        assert!(!graph.has_decision_ancestry(&"b1".into()));
    }

    #[test]
    fn explicit_contradiction_reads_edge_metadata() {
        let graph = graph_with(
            vec![decision("d1", "Strong consistency"), decision("d2", "Multi-master writes")],
            vec![
                Edge::new("e1", "d1", "d2", EdgeKind::Contradicts)
                    .with_meta(META_SEVERITY, 0.6)
                    .with_meta(META_REASON, "CAP"),
            ],
        );
        let found = graph.find_contradictions();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, 0.6);
        assert_eq!(found[0].explanation, "CAP");
        assert_eq!(
            found[0].causal_chain,
            vec!["Strong consistency", "contradicts", "Multi-master writes"]
        );
    }

    #[test]
    fn explicit_contradiction_defaults_severity() {
        let graph = graph_with(
            vec![decision("d1", "A"), decision("d2", "B")],
            vec![Edge::new("e1", "d1", "d2", EdgeKind::Contradicts)],
        );
        let found = graph.find_contradictions();
        assert_eq!(found[0].severity, 0.9);
        assert_eq!(found[0].explanation, "Explicit contradiction");
    }

    #[test]
    fn oversubscribed_resource_pairs_first_two_consumers() {
        let graph = graph_with(
            vec![
                Node::new("r1", NodeKind::Resource, "Connection pool").with_meta(META_CAPACITY, 10),
                decision("d1", "API").with_meta(META_RESOURCE_DEMAND, 8),
                decision("d2", "Worker").with_meta(META_RESOURCE_DEMAND, 8),
            ],
            vec![
                Edge::new("e1", "d1", "r1", EdgeKind::Requires),
                Edge::new("e2", "d2", "r1", EdgeKind::Requires),
            ],
        );
        let found = graph.find_contradictions();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, ContradictionSource::ResourceOversubscription);
        assert_eq!(found[0].node_a, NodeId::new("d1"));
        assert_eq!(found[0].node_b, NodeId::new("d2"));
        assert_eq!(found[0].severity, 0.85);
        assert_eq!(
            found[0].explanation,
            "Resource 'Connection pool' oversubscribed: 16 > 10"
        );
    }

    #[test]
    fn single_consumer_or_unbounded_resource_never_contradicts() {
        let graph = graph_with(
            vec![
                Node::new("r1", NodeKind::Resource, "Disk").with_meta(META_CAPACITY, 1),
                Node::new("r2", NodeKind::Resource, "Bandwidth"),
                decision("d1", "A").with_meta(META_RESOURCE_DEMAND, 50),
                decision("d2", "B").with_meta(META_RESOURCE_DEMAND, 50),
            ],
            vec![
                Edge::new("e1", "d1", "r1", EdgeKind::Requires),
                Edge::new("e2", "d1", "r2", EdgeKind::Requires),
                Edge::new("e3", "d2", "r2", EdgeKind::Requires),
            ],
        );
        assert!(graph.find_contradictions().is_empty());
    }

    #[test]
    fn name_patterns_pair_every_match() {
        let graph = graph_with(
            vec![
                decision("d1", "High Availability API"),
                decision("d2", "Single Postgres primary"),
                decision("d3", "Stateless web tier"),
                decision("d4", "Sticky session state"),
            ],
            vec![],
        );
        let found = graph.find_contradictions();
        let pairs: Vec<(&str, &str, f64)> = found
            .iter()
            .map(|c| (c.node_a.as_str(), c.node_b.as_str(), c.severity))
            .collect();
        assert_eq!(pairs, vec![("d1", "d2", 0.95), ("d3", "d4", 0.7)]);
    }

    #[test]
    fn contradiction_detectors_concatenate_in_fixed_order() {
        let graph = graph_with(
            vec![
                decision("d1", "High availability"),
                decision("d2", "Single region").with_meta(META_RESOURCE_DEMAND, 3),
                decision("d3", "Batch").with_meta(META_RESOURCE_DEMAND, 3),
                Node::new("r1", NodeKind::Resource, "GPU").with_meta(META_CAPACITY, 4),
            ],
            vec![
                Edge::new("e1", "d2", "r1", EdgeKind::Requires),
                Edge::new("e2", "d3", "r1", EdgeKind::Requires),
                Edge::new("e3", "d3", "d1", EdgeKind::Contradicts),
            ],
        );
        let sources: Vec<ContradictionSource> =
            graph.find_contradictions().iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![
                ContradictionSource::ExplicitEdge,
                ContradictionSource::ResourceOversubscription,
                ContradictionSource::NamePattern,
            ]
        );
    }

    #[test]
    fn causal_paths_enumerate_simple_paths_over_causal_edges() {
        let graph = graph_with(
            vec![
                decision("a", "A"),
                decision("b", "B"),
                decision("c", "C"),
                decision("d", "D"),
            ],
            vec![
                Edge::new("e1", "a", "b", EdgeKind::Causes),
                Edge::new("e2", "b", "d", EdgeKind::Enables),
                Edge::new("e3", "a", "c", EdgeKind::Requires),
                Edge::new("e4", "c", "d", EdgeKind::Causes),
                Edge::new("e5", "d", "a", EdgeKind::Causes),
                Edge::new("e6", "a", "d", EdgeKind::Weakens),
            ],
        );
        let paths = graph.causal_paths(&"a".into(), &"d".into());
        let rendered: Vec<Vec<&str>> = paths
            .iter()
            .map(|p| p.iter().map(NodeId::as_str).collect())
            .collect();
        assert_eq!(rendered, vec![vec!["a", "b", "d"], vec!["a", "c", "d"]]);
    }

    #[test]
    fn remove_node_drops_incident_edges_in_both_directions() {
        let mut graph = graph_with(
            vec![decision("a", "A"), decision("x", "X"), decision("b", "B")],
            vec![
                Edge::new("e1", "a", "x", EdgeKind::Causes),
                Edge::new("e2", "x", "b", EdgeKind::Causes),
                Edge::new("e3", "a", "b", EdgeKind::Causes),
            ],
        );
        let removed = graph.remove_node(&"x".into()).expect("x exists");
        assert_eq!(removed.name, "X");
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edges().all(|e| !e.touches(&"x".into())));
        assert!(graph.indices_consistent());
        assert!(graph.remove_node(&"x".into()).is_none());
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut graph = graph_with(
            vec![decision("a", "A").with_meta(META_RESOURCE_DEMAND, 2), decision("b", "B")],
            vec![Edge::new("e1", "a", "b", EdgeKind::Causes)],
        );
        let mut copy = graph.deep_clone();
        copy.node_mut(&"a".into())
            .expect("a exists")
            .metadata
            .insert(META_RESOURCE_DEMAND.to_string(), Value::from(99));
        copy.remove_node(&"b".into());

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node(&"a".into()).map(Node::resource_demand), Some(2.0));
        assert!(copy.indices_consistent());

        let fresh = graph.fresh_edge_id();
        assert_ne!(fresh, EdgeId::new("e1"));
    }

    #[test]
    fn stats_count_kinds_and_critical_nodes() {
        let graph = graph_with(
            vec![
                decision("d1", "A").with_criticality(0.9),
                Node::new("b1", NodeKind::Behavior, "B"),
                Node::new("a1", NodeKind::Assumption, "C").with_criticality(0.7),
            ],
            vec![Edge::new("e1", "d1", "b1", EdgeKind::Causes)],
        );
        let stats = graph.stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.critical_nodes, 2);
        assert_eq!(stats.decisions(), 1);
        assert_eq!(stats.behaviors(), 1);
        assert_eq!(stats.assumptions(), 1);
        assert_eq!(stats.count(NodeKind::Policy), 0);
    }

    fn contradiction_set(graph: &RealityGraph) -> BTreeSet<(NodeId, NodeId, u64)> {
        graph
            .find_contradictions()
            .into_iter()
            .map(|c| {
                let (a, b) = if c.node_a <= c.node_b {
                    (c.node_a, c.node_b)
                } else {
                    (c.node_b, c.node_a)
                };
                (a, b, c.severity.to_bits())
            })
            .collect()
    }

    #[test]
    fn contradiction_set_ignores_insertion_order() {
        let nodes = vec![
            decision("d1", "High availability gateway"),
            decision("d2", "Single primary database").with_meta(META_RESOURCE_DEMAND, 6),
            decision("d3", "Stateless workers").with_meta(META_RESOURCE_DEMAND, 6),
            decision("d4", "Session state in memory"),
            Node::new("r1", NodeKind::Resource, "Connection pool").with_meta(META_CAPACITY, 10),
        ];
        let edges = vec![
            Edge::new("e1", "d2", "r1", EdgeKind::Requires),
            Edge::new("e2", "d3", "r1", EdgeKind::Requires),
            Edge::new("e3", "d4", "d1", EdgeKind::Contradicts).with_meta(META_SEVERITY, 0.6),
        ];

        let forward = graph_with(nodes.clone(), edges.clone());
        let reversed = graph_with(
            nodes.into_iter().rev().collect(),
            edges.into_iter().rev().collect(),
        );

        let expected: BTreeSet<(NodeId, NodeId, u64)> = [
            ("d1", "d4", 0.6),
            ("d2", "d3", 0.85),
            ("d1", "d2", 0.95),
            ("d3", "d4", 0.7),
        ]
        .into_iter()
        .map(|(a, b, sev)| (NodeId::new(a), NodeId::new(b), f64::to_bits(sev)))
        .collect();
        assert_eq!(contradiction_set(&forward), expected);
        assert_eq!(contradiction_set(&reversed), expected);
    }

    #[test]
    fn redundancy_flag_accepts_truthy_values() {
        let flagged = |value: Value| {
            Node::new("r1", NodeKind::Resource, "Primary DB")
                .with_meta(META_HAS_REDUNDANCY, value)
                .has_redundancy()
        };
        assert!(flagged(Value::Bool(true)));
        assert!(flagged(Value::from(1)));
        assert!(flagged(Value::from("yes")));
        assert!(!flagged(Value::Bool(false)));
        assert!(!flagged(Value::from(0)));
        assert!(!flagged(Value::from("")));
        assert!(!flagged(Value::Null));
        assert!(!Node::new("r2", NodeKind::Resource, "Replica").has_redundancy());
    }

    #[test]
    fn deserialized_criticality_is_clamped() {
        let high: Node = serde_json::from_str(
            r#"{"id": "d1", "kind": "decision", "name": "A", "criticality": 5.0}"#,
        )
        .expect("node parses");
        let low: Node = serde_json::from_str(
            r#"{"id": "d2", "kind": "decision", "name": "B", "criticality": -2}"#,
        )
        .expect("node parses");
        let absent: Node =
            serde_json::from_str(r#"{"id": "d3", "kind": "decision", "name": "C"}"#)
                .expect("node parses");
        assert_eq!(high.criticality, 1.0);
        assert_eq!(low.criticality, 0.0);
        assert_eq!(absent.criticality, 0.5);
    }
}
