//! Failure Inevitability Index (FII).
//!
//! A deterministic measure of how certain structural collapse is, derived
//! from the graph and the axiom violations found on it. It is not a
//! probability estimate and not a prediction.
//!
//! ```text
//! collapse paths ──OR──► base ─┐
//! axiom violations ────► adj  ─┼─OR──► clamp[0,1] ──► fii
//! graph structure ─────► adj  ─┘
//! ```
//!
//! Bands: < 0.3 low, < 0.7 medium, < 0.9 high, otherwise absolute.

use crate::axiom::AxiomViolation;
use crate::graph::{EdgeKind, NodeId, NodeKind, RealityGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;

const CASCADE_TRIGGER_CRITICALITY: f64 = 0.8;
const CASCADE_MIN_DEPENDENTS: usize = 3;
const CASCADE_CERTAINTY_CAP: f64 = 0.9;
const SPOF_DEPENDENT_CRITICALITY: f64 = 0.7;
const SPOF_CERTAINTY_CAP: f64 = 0.95;
const DEADLOCK_CERTAINTY: f64 = 0.8;

/// Classification of a collapse path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseKind {
    Contradiction,
    ResourceExhaustion,
    HumanDependency,
    CascadingFailure,
    /// Reserved; no detector emits it yet.
    AssumptionViolation,
    Deadlock,
    /// Reserved; no detector emits it yet.
    UnboundedGrowth,
}

impl CollapseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollapseKind::Contradiction => "contradiction",
            CollapseKind::ResourceExhaustion => "resource_exhaustion",
            CollapseKind::HumanDependency => "human_dependency",
            CollapseKind::CascadingFailure => "cascading_failure",
            CollapseKind::AssumptionViolation => "assumption_violation",
            CollapseKind::Deadlock => "deadlock",
            CollapseKind::UnboundedGrowth => "unbounded_growth",
        }
    }
}

/// One structural reason the system collapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsePath {
    pub kind: CollapseKind,
    pub nodes: Vec<NodeId>,
    pub certainty: f64,
    pub explanation: String,
    pub metadata: Value,
}

/// Interpretation band of an FII value. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiiBand {
    Low,
    Medium,
    High,
    Absolute,
}

impl FiiBand {
    pub fn of(fii: f64) -> Self {
        if fii < 0.3 {
            FiiBand::Low
        } else if fii < 0.7 {
            FiiBand::Medium
        } else if fii < 0.9 {
            FiiBand::High
        } else {
            FiiBand::Absolute
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            FiiBand::Low => "LOW - System may survive",
            FiiBand::Medium => "MEDIUM - System is fragile",
            FiiBand::High => "HIGH - Failure is likely inevitable",
            FiiBand::Absolute => "ABSOLUTE - System is logically failed",
        }
    }
}

/// Probabilistic OR: `a + b - a*b`.
///
/// `p ∨ 0 = p`, `p ∨ 1 = 1`, commutative.
pub fn probabilistic_or(a: f64, b: f64) -> f64 {
    a + b - a * b
}

/// Fold certainties left to right through `probabilistic_or`, from 0.
pub fn combine_certainties(certainties: impl IntoIterator<Item = f64>) -> f64 {
    certainties.into_iter().fold(0.0, probabilistic_or)
}

/// Result of one FII computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInevitability {
    pub fii: f64,
    pub base: f64,
    pub violation_adjustment: f64,
    pub structure_adjustment: f64,
    pub collapse_paths: Vec<CollapsePath>,
}

impl FailureInevitability {
    pub fn band(&self) -> FiiBand {
        FiiBand::of(self.fii)
    }

    /// Highest-certainty path; the earliest one wins ties.
    pub fn most_certain_path(&self) -> Option<&CollapsePath> {
        self.collapse_paths
            .iter()
            .fold(None, |best: Option<&CollapsePath>, p| match best {
                Some(b) if b.certainty >= p.certainty => Some(b),
                _ => Some(p),
            })
    }
}

/// Computes the FII of a graph given the violations found on it.
pub struct InevitabilityCalculator<'a> {
    graph: &'a RealityGraph,
    violations: &'a [AxiomViolation],
}

impl<'a> InevitabilityCalculator<'a> {
    pub fn new(graph: &'a RealityGraph, violations: &'a [AxiomViolation]) -> Self {
        Self { graph, violations }
    }

    pub fn compute(&self) -> FailureInevitability {
        let collapse_paths = self.collapse_paths();
        let base = combine_certainties(collapse_paths.iter().map(|p| p.certainty));
        let violation_adjustment = self.violation_adjustment();
        let structure_adjustment = self.structure_adjustment();
        let fii = combine_certainties([base, violation_adjustment, structure_adjustment])
            .clamp(0.0, 1.0);

        tracing::debug!(
            fii,
            base,
            violation_adjustment,
            structure_adjustment,
            paths = collapse_paths.len(),
            "failure inevitability computed"
        );

        FailureInevitability {
            fii,
            base,
            violation_adjustment,
            structure_adjustment,
            collapse_paths,
        }
    }

    /// All collapse paths, in detector order.
    pub fn collapse_paths(&self) -> Vec<CollapsePath> {
        let mut paths = self.contradiction_paths();
        paths.extend(self.resource_exhaustion_paths());
        paths.extend(self.cascading_failure_paths());
        paths.extend(self.single_point_of_failure_paths());
        paths.extend(self.deadlock_paths());
        for path in &paths {
            tracing::trace!(
                kind = path.kind.as_str(),
                certainty = path.certainty,
                "collapse path"
            );
        }
        paths
    }

    fn contradiction_paths(&self) -> Vec<CollapsePath> {
        self.graph
            .find_contradictions()
            .into_iter()
            .map(|c| CollapsePath {
                kind: CollapseKind::Contradiction,
                nodes: vec![c.node_a.clone(), c.node_b.clone()],
                certainty: c.severity,
                explanation: c.explanation,
                metadata: json!({
                    "source": c.node_a_name,
                    "target": c.node_b_name,
                    "causal_chain": c.causal_chain,
                }),
            })
            .collect()
    }

    fn resource_exhaustion_paths(&self) -> Vec<CollapsePath> {
        let mut paths = Vec::new();
        for resource in self.graph.nodes_of_kind(NodeKind::Resource) {
            let consumers = self.graph.consumers_of(&resource.id);
            if consumers.is_empty() {
                continue;
            }
            let capacity = resource.capacity();
            let demand: f64 = consumers.iter().map(|c| c.resource_demand()).sum();
            if demand <= capacity {
                continue;
            }

            let (certainty, oversubscription) = if capacity > 0.0 {
                ((demand / capacity - 1.0).min(1.0), Some(demand / capacity))
            } else {
                (1.0, None)
            };
            let mut nodes: Vec<NodeId> = consumers.iter().map(|c| c.id.clone()).collect();
            nodes.push(resource.id.clone());
            paths.push(CollapsePath {
                kind: CollapseKind::ResourceExhaustion,
                nodes,
                certainty,
                explanation: format!(
                    "Resource '{}' exhausted: demand {demand} > capacity {capacity}",
                    resource.name
                ),
                metadata: json!({
                    "resource": resource.name,
                    "capacity": capacity,
                    "demand": demand,
                    "oversubscription": oversubscription,
                }),
            });
        }
        paths
    }

    fn dependents(&self, id: &NodeId) -> Vec<NodeId> {
        self.graph
            .reachable_from(id, |kind: EdgeKind| kind.propagates_failure())
    }

    fn cascading_failure_paths(&self) -> Vec<CollapsePath> {
        let mut paths = Vec::new();
        for node in self.graph.critical_nodes(CASCADE_TRIGGER_CRITICALITY) {
            let dependents = self.dependents(&node.id);
            if dependents.len() <= CASCADE_MIN_DEPENDENTS {
                continue;
            }
            let count = dependents.len();
            let mut nodes = vec![node.id.clone()];
            nodes.extend(dependents);
            paths.push(CollapsePath {
                kind: CollapseKind::CascadingFailure,
                nodes,
                certainty: (count as f64 / 10.0).min(CASCADE_CERTAINTY_CAP),
                explanation: format!("Failure of '{}' cascades to {count} components", node.name),
                metadata: json!({
                    "trigger": node.name,
                    "cascade_size": count,
                    "criticality": node.criticality,
                }),
            });
        }
        paths
    }

    fn single_point_of_failure_paths(&self) -> Vec<CollapsePath> {
        let mut paths = Vec::new();
        for node in self.graph.nodes() {
            if node.has_redundancy() {
                continue;
            }
            let critical: Vec<NodeId> = self
                .dependents(&node.id)
                .into_iter()
                .filter(|d| {
                    self.graph
                        .node(d)
                        .is_some_and(|n| n.criticality > SPOF_DEPENDENT_CRITICALITY)
                })
                .collect();
            if critical.len() <= 1 {
                continue;
            }
            let count = critical.len();
            let kind = if node.kind == NodeKind::Resource {
                CollapseKind::HumanDependency
            } else {
                CollapseKind::CascadingFailure
            };
            let mut nodes = vec![node.id.clone()];
            nodes.extend(critical);
            paths.push(CollapsePath {
                kind,
                nodes,
                certainty: (0.7 + 0.05 * count as f64).min(SPOF_CERTAINTY_CAP),
                explanation: format!(
                    "'{}' is a single point of failure for {count} critical components",
                    node.name
                ),
                metadata: json!({
                    "spof": node.name,
                    "critical_dependents": count,
                }),
            });
        }
        paths
    }

    /// One path per back edge found by the DFS, not one per DFS tree.
    ///
    /// The search does not stop a tree at its first cycle. Several
    /// independent cycles under one root each contribute to the base index,
    /// so such graphs score higher than a first-cycle search would.
    fn deadlock_paths(&self) -> Vec<CollapsePath> {
        let mut search = CycleSearch::default();
        for node in self.graph.nodes() {
            if !search.visited.contains(&node.id) {
                search.visit(self.graph, &node.id);
            }
        }

        search
            .cycles
            .into_iter()
            .map(|cycle| {
                let names: Vec<&str> = cycle
                    .iter()
                    .filter_map(|id| self.graph.node(id))
                    .map(|n| n.name.as_str())
                    .collect();
                CollapsePath {
                    kind: CollapseKind::Deadlock,
                    explanation: format!("Circular dependency detected: {}", names.join(" → ")),
                    metadata: json!({ "cycle": cycle }),
                    nodes: cycle,
                    certainty: DEADLOCK_CERTAINTY,
                }
            })
            .collect()
    }

    fn violation_adjustment(&self) -> f64 {
        let Some(max_severity) = self
            .violations
            .iter()
            .map(|v| v.severity)
            .reduce(f64::max)
        else {
            return 0.0;
        };
        let count = self.violations.len() as f64;
        (max_severity * (1.0 + 0.05 * (count - 1.0))).min(1.0)
    }

    fn structure_adjustment(&self) -> f64 {
        let stats = self.graph.stats();
        if stats.total_nodes == 0 {
            return 0.0;
        }
        let critical_ratio = stats.critical_nodes as f64 / stats.total_nodes as f64;
        let assumption_ratio = stats.assumptions() as f64 / stats.decisions().max(1) as f64;
        critical_ratio * 0.3 + assumption_ratio.min(1.0) * 0.2
    }
}

/// Depth-first search over requires/depends_on edges with an explicit
/// recursion stack. Every back edge records the stack segment from its
/// target onward as one cycle.
///
/// Iterative: one frame per entered node, so chain length is bounded by
/// heap, not by the thread stack.
#[derive(Default)]
struct CycleSearch {
    visited: BTreeSet<NodeId>,
    on_stack: BTreeSet<NodeId>,
    stack: Vec<NodeId>,
    cycles: Vec<Vec<NodeId>>,
}

/// Blocking successors of one entered node and how many have been tried.
struct Frame {
    targets: Vec<NodeId>,
    cursor: usize,
}

impl CycleSearch {
    fn visit(&mut self, graph: &RealityGraph, root: &NodeId) {
        let mut frames = vec![self.enter(graph, root)];

        while let Some(frame) = frames.last_mut() {
            let Some(target) = frame.targets.get(frame.cursor).cloned() else {
                frames.pop();
                if let Some(id) = self.stack.pop() {
                    self.on_stack.remove(&id);
                }
                continue;
            };
            frame.cursor += 1;

            if !self.visited.contains(&target) {
                frames.push(self.enter(graph, &target));
            } else if self.on_stack.contains(&target) {
                if let Some(start) = self.stack.iter().position(|n| n == &target) {
                    self.cycles.push(self.stack[start..].to_vec());
                }
            }
        }
    }

    fn enter(&mut self, graph: &RealityGraph, id: &NodeId) -> Frame {
        self.visited.insert(id.clone());
        self.on_stack.insert(id.clone());
        self.stack.push(id.clone());
        Frame {
            targets: graph
                .outgoing_edges(id)
                .filter(|e| e.kind.is_blocking())
                .map(|e| e.target.clone())
                .collect(),
            cursor: 0,
        }
    }
}
