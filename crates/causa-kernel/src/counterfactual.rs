//! Counterfactual simulator.
//!
//! Each scenario runs against its own deep clone of the base graph:
//!
//! ```text
//! base ──deep_clone──► clone ──mutations──► axioms + FII ──► survived?
//! ```
//!
//! Clones share nothing with the base graph or with each other, so the base
//! graph is read-only for the whole simulation.

use crate::axiom::{AxiomRegistry, AxiomViolation, CRITICAL_SCENARIO};
use crate::context::{CounterfactualSignal, VerificationContext};
use crate::error::GraphError;
use crate::graph::{
    Edge, EdgeKind, META_AVAILABLE, META_CAPACITY, META_REASON, META_RESOURCE_DEMAND,
    META_SEVERITY, NodeId, NodeKind, RealityGraph,
};
use crate::inevitability::InevitabilityCalculator;
use crate::percent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A scenario survives only while its FII stays below this.
pub const SURVIVAL_FII: f64 = 0.9;

const VIOLATED_ASSUMPTION_SEVERITY: f64 = 0.85;
const NODE_FAILURE_THRESHOLD: f64 = 0.8;
const MAX_NODE_FAILURES: usize = 3;
const MAX_HUMAN_SCENARIOS: usize = 2;
const MAX_ASSUMPTION_SCENARIOS: usize = 3;

/// A single graph mutation. Applied to clones only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Multiply the demand placed on cpu/memory resources.
    TrafficSpike { multiplier: f64 },
    /// Remove the node and every edge touching it.
    NodeFailure { node: NodeId },
    /// Mark a resource unavailable with zero capacity. The node stays.
    ResourceRemoval { node: NodeId },
    /// Contradict every node that assumes this one.
    AssumptionViolation { node: NodeId },
}

impl Mutation {
    pub fn apply(&self, graph: &mut RealityGraph) -> Result<(), GraphError> {
        match self {
            Mutation::TrafficSpike { multiplier } => {
                spike_traffic(graph, *multiplier);
                Ok(())
            }
            Mutation::NodeFailure { node } => {
                graph.remove_node(node);
                Ok(())
            }
            Mutation::ResourceRemoval { node } => {
                if let Some(resource) = graph.node_mut(node) {
                    resource
                        .metadata
                        .insert(META_AVAILABLE.to_string(), Value::Bool(false));
                    resource
                        .metadata
                        .insert(META_CAPACITY.to_string(), Value::from(0));
                }
                Ok(())
            }
            Mutation::AssumptionViolation { node } => violate_assumption(graph, node),
        }
    }
}

fn is_load_bearing(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("cpu") || name.contains("memory")
}

fn spike_traffic(graph: &mut RealityGraph, multiplier: f64) {
    // One entry per incoming edge; a source feeding two such resources is
    // scaled twice.
    let sources: Vec<NodeId> = graph
        .nodes_of_kind(NodeKind::Resource)
        .into_iter()
        .filter(|r| is_load_bearing(&r.name))
        .flat_map(|r| graph.incoming_edges(&r.id).map(|e| e.source.clone()))
        .collect();

    for id in sources {
        let Some(node) = graph.node_mut(&id) else {
            continue;
        };
        if let Some(demand) = node.meta_f64(META_RESOURCE_DEMAND) {
            node.metadata.insert(
                META_RESOURCE_DEMAND.to_string(),
                Value::from(demand * multiplier),
            );
        }
    }
}

fn violate_assumption(graph: &mut RealityGraph, id: &NodeId) -> Result<(), GraphError> {
    let Some(assumption) = graph.node(id) else {
        return Ok(());
    };
    let reason = format!("Assumption '{}' violated", assumption.name);
    let dependents: Vec<NodeId> = graph
        .outgoing_edges(id)
        .filter(|e| e.kind == EdgeKind::Assumes)
        .map(|e| e.target.clone())
        .collect();

    for dependent in dependents {
        let edge_id = graph.fresh_edge_id();
        graph.add_edge(
            Edge::new(edge_id, dependent, id.clone(), EdgeKind::Contradicts)
                .with_meta(META_REASON, reason.clone())
                .with_meta(META_SEVERITY, VIOLATED_ASSUMPTION_SEVERITY),
        )?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    TrafficSpike,
    NodeFailure,
    HumanUnavailable,
    AssumptionViolated,
}

impl ScenarioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::TrafficSpike => "traffic_spike",
            ScenarioKind::NodeFailure => "node_failure",
            ScenarioKind::HumanUnavailable => "human_unavailable",
            ScenarioKind::AssumptionViolated => "assumption_violated",
        }
    }
}

/// An alternate reality: a named set of mutations plus its criticality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualScenario {
    pub name: String,
    pub kind: ScenarioKind,
    pub description: String,
    pub criticality: f64,
    pub mutations: Vec<Mutation>,
    #[serde(default)]
    pub metadata: Value,
}

impl CounterfactualScenario {
    pub fn is_critical(&self) -> bool {
        self.criticality >= CRITICAL_SCENARIO
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualResult {
    pub scenario: CounterfactualScenario,
    pub survived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_reason: Option<String>,
    pub fii_after: f64,
    pub violations: Vec<AxiomViolation>,
    pub explanation: String,
}

impl CounterfactualResult {
    pub fn is_critical_failure(&self) -> bool {
        !self.survived && self.scenario.is_critical()
    }

    /// The minimal record the counterfactual-validity axiom consumes.
    pub fn signal(&self) -> CounterfactualSignal {
        CounterfactualSignal {
            scenario_name: self.scenario.name.clone(),
            survived: self.survived,
            scenario_criticality: self.scenario.criticality,
        }
    }
}

/// `failed / total`, or 0 when nothing ran.
pub fn failure_rate(results: &[CounterfactualResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let failed = results.iter().filter(|r| !r.survived).count();
    failed as f64 / results.len() as f64
}

/// Failed results whose scenario criticality is at least 0.7.
pub fn critical_failures(results: &[CounterfactualResult]) -> Vec<&CounterfactualResult> {
    results.iter().filter(|r| r.is_critical_failure()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total: usize,
    pub survived: usize,
    pub failed: usize,
    pub failure_rate: f64,
    pub critical_failures: usize,
}

impl SimulationSummary {
    pub fn from_results(results: &[CounterfactualResult]) -> Self {
        let survived = results.iter().filter(|r| r.survived).count();
        Self {
            total: results.len(),
            survived,
            failed: results.len() - survived,
            failure_rate: failure_rate(results),
            critical_failures: critical_failures(results).len(),
        }
    }
}

pub struct CounterfactualSimulator<'a> {
    base: &'a RealityGraph,
    registry: AxiomRegistry,
}

impl<'a> CounterfactualSimulator<'a> {
    pub fn new(base: &'a RealityGraph, registry: AxiomRegistry) -> Self {
        Self { base, registry }
    }

    /// The standard scenario set, derived from the base graph in a fixed
    /// order: traffic spikes, node failures, missing humans, broken
    /// assumptions.
    pub fn standard_scenarios(&self) -> Vec<CounterfactualScenario> {
        let mut scenarios = vec![
            traffic_spike("Traffic Spike 1.5x", 1.5, 0.7),
            traffic_spike("Traffic Spike 3x", 3.0, 0.8),
        ];

        for node in self
            .base
            .critical_nodes(NODE_FAILURE_THRESHOLD)
            .into_iter()
            .take(MAX_NODE_FAILURES)
        {
            scenarios.push(CounterfactualScenario {
                name: format!("Node Failure: {}", node.name),
                kind: ScenarioKind::NodeFailure,
                description: format!("Critical node '{}' fails", node.name),
                criticality: 0.9,
                mutations: vec![Mutation::NodeFailure {
                    node: node.id.clone(),
                }],
                metadata: json!({ "failed_node": node.name }),
            });
        }

        let humans = self
            .base
            .nodes_of_kind(NodeKind::Resource)
            .into_iter()
            .filter(|r| {
                let name = r.name.to_lowercase();
                name.contains("human") || name.contains("engineer")
            })
            .take(MAX_HUMAN_SCENARIOS);
        for human in humans {
            scenarios.push(CounterfactualScenario {
                name: format!("Human Unavailable: {}", human.name),
                kind: ScenarioKind::HumanUnavailable,
                description: format!("Key person '{}' becomes unavailable", human.name),
                criticality: 0.85,
                mutations: vec![Mutation::ResourceRemoval {
                    node: human.id.clone(),
                }],
                metadata: json!({ "missing_human": human.name }),
            });
        }

        for assumption in self
            .base
            .nodes_of_kind(NodeKind::Assumption)
            .into_iter()
            .take(MAX_ASSUMPTION_SCENARIOS)
        {
            scenarios.push(CounterfactualScenario {
                name: format!("Assumption Violated: {}", assumption.name),
                kind: ScenarioKind::AssumptionViolated,
                description: format!("Assumption '{}' proves false", assumption.name),
                criticality: 0.75,
                mutations: vec![Mutation::AssumptionViolation {
                    node: assumption.id.clone(),
                }],
                metadata: json!({ "violated_assumption": assumption.name }),
            });
        }

        scenarios
    }

    /// Run the standard scenario set.
    pub fn run(&self) -> Result<Vec<CounterfactualResult>, GraphError> {
        self.run_scenarios(&self.standard_scenarios())
    }

    pub fn run_scenarios(
        &self,
        scenarios: &[CounterfactualScenario],
    ) -> Result<Vec<CounterfactualResult>, GraphError> {
        scenarios.iter().map(|s| self.test_scenario(s)).collect()
    }

    pub fn test_scenario(
        &self,
        scenario: &CounterfactualScenario,
    ) -> Result<CounterfactualResult, GraphError> {
        let mut clone = self.base.deep_clone();
        for mutation in &scenario.mutations {
            mutation.apply(&mut clone)?;
        }

        let ctx = VerificationContext::counterfactual(scenario.name.clone());
        let violations = self.registry.verify_all(&clone, &ctx);
        let fii_after = InevitabilityCalculator::new(&clone, &violations)
            .compute()
            .fii;
        let fatal = self.registry.fatal_violations(&violations);
        let survived = fatal.is_empty() && fii_after < SURVIVAL_FII;

        let collapse_reason = if survived {
            None
        } else if let Some(first) = fatal.first() {
            Some(format!("Fatal axiom violation: {}", first.explanation))
        } else {
            Some(format!(
                "FII reached {} - inevitable failure",
                percent(fii_after)
            ))
        };
        let explanation = match &collapse_reason {
            Some(reason) => format!("System collapsed under '{}': {reason}", scenario.name),
            None => format!(
                "System survived '{}' (FII: {})",
                scenario.name,
                percent(fii_after)
            ),
        };

        tracing::debug!(
            scenario = %scenario.name,
            survived,
            fii_after,
            violations = violations.len(),
            "counterfactual scenario evaluated"
        );

        Ok(CounterfactualResult {
            scenario: scenario.clone(),
            survived,
            collapse_reason,
            fii_after,
            violations,
            explanation,
        })
    }
}

fn traffic_spike(name: &str, multiplier: f64, criticality: f64) -> CounterfactualScenario {
    CounterfactualScenario {
        name: name.to_string(),
        kind: ScenarioKind::TrafficSpike,
        description: format!("System receives {multiplier}x expected traffic"),
        criticality,
        mutations: vec![Mutation::TrafficSpike { multiplier }],
        metadata: json!({ "multiplier": multiplier }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn graph(nodes: Vec<Node>, edges: Vec<Edge>) -> RealityGraph {
        let mut g = RealityGraph::new();
        for n in nodes {
            g.add_node(n).expect("node");
        }
        for e in edges {
            g.add_edge(e).expect("edge");
        }
        g
    }

    #[test]
    fn traffic_spike_scales_only_declared_demand() {
        let mut g = graph(
            vec![
                Node::new("cpu", NodeKind::Resource, "CPU pool"),
                Node::new("disk", NodeKind::Resource, "Disk"),
                Node::new("api", NodeKind::Decision, "API").with_meta(META_RESOURCE_DEMAND, 2),
                Node::new("cron", NodeKind::Decision, "Cron"),
                Node::new("etl", NodeKind::Decision, "ETL").with_meta(META_RESOURCE_DEMAND, 5),
            ],
            vec![
                Edge::new("e1", "api", "cpu", EdgeKind::Requires),
                Edge::new("e2", "cron", "cpu", EdgeKind::DependsOn),
                Edge::new("e3", "etl", "disk", EdgeKind::Requires),
            ],
        );
        Mutation::TrafficSpike { multiplier: 3.0 }
            .apply(&mut g)
            .expect("spike applies");

        let demand = |id: &str| g.node(&id.into()).and_then(|n| n.meta_f64(META_RESOURCE_DEMAND));
        assert_eq!(demand("api"), Some(6.0));
        assert_eq!(demand("cron"), None);
        assert_eq!(demand("etl"), Some(5.0));
    }

    #[test]
    fn node_failure_leaves_no_dangling_edges_and_base_intact() {
        let base = graph(
            vec![
                Node::new("a", NodeKind::Decision, "A"),
                Node::new("x", NodeKind::Decision, "X").with_criticality(0.9),
                Node::new("b", NodeKind::Behavior, "B"),
            ],
            vec![
                Edge::new("e1", "a", "x", EdgeKind::Causes),
                Edge::new("e2", "x", "b", EdgeKind::Causes),
            ],
        );
        let mut clone = base.deep_clone();
        Mutation::NodeFailure { node: "x".into() }
            .apply(&mut clone)
            .expect("failure applies");

        assert_eq!(clone.edge_count(), 0);
        assert!(clone.indices_consistent());
        assert_eq!(base.node_count(), 3);
        assert_eq!(base.edge_count(), 2);
    }

    #[test]
    fn resource_removal_is_soft() {
        let mut g = graph(
            vec![Node::new("r", NodeKind::Resource, "Staff engineer").with_meta(META_CAPACITY, 3)],
            vec![],
        );
        Mutation::ResourceRemoval { node: "r".into() }
            .apply(&mut g)
            .expect("removal applies");
        let node = g.node(&"r".into()).expect("node survives removal");
        assert_eq!(node.capacity(), 0.0);
        assert_eq!(node.meta_bool(META_AVAILABLE), Some(false));
    }

    #[test]
    fn assumption_violation_contradicts_each_assuming_target() {
        let mut g = graph(
            vec![
                Node::new("a1", NodeKind::Assumption, "Clocks are synced"),
                Node::new("d1", NodeKind::Decision, "Lease-based locks"),
                Node::new("d2", NodeKind::Decision, "TTL caches"),
            ],
            vec![
                Edge::new("e1", "a1", "d1", EdgeKind::Assumes),
                Edge::new("e2", "a1", "d2", EdgeKind::Assumes),
            ],
        );
        Mutation::AssumptionViolation { node: "a1".into() }
            .apply(&mut g)
            .expect("violation applies");

        let contradictions = g.find_contradictions();
        assert_eq!(contradictions.len(), 2);
        assert_eq!(contradictions[0].node_a, NodeId::new("d1"));
        assert_eq!(contradictions[0].node_b, NodeId::new("a1"));
        assert_eq!(contradictions[0].severity, 0.85);
        assert_eq!(
            contradictions[0].explanation,
            "Assumption 'Clocks are synced' violated"
        );
        assert!(g.indices_consistent());
    }

    #[test]
    fn standard_scenarios_follow_fixed_order_and_caps() {
        let mut nodes = vec![
            Node::new("h1", NodeKind::Resource, "Human operator"),
            Node::new("h2", NodeKind::Resource, "Release engineer"),
            Node::new("h3", NodeKind::Resource, "Senior Engineer"),
            Node::new("db", NodeKind::Resource, "Database"),
        ];
        for i in 0..4 {
            nodes.push(
                Node::new(format!("c{i}").as_str(), NodeKind::Decision, format!("Core {i}"))
                    .with_criticality(0.85),
            );
            nodes.push(Node::new(format!("a{i}").as_str(), NodeKind::Assumption, format!("Assume {i}")));
        }
        let g = graph(nodes, vec![]);
        let names: Vec<String> = CounterfactualSimulator::new(&g, AxiomRegistry::new())
            .standard_scenarios()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Traffic Spike 1.5x",
                "Traffic Spike 3x",
                "Node Failure: Core 0",
                "Node Failure: Core 1",
                "Node Failure: Core 2",
                "Human Unavailable: Human operator",
                "Human Unavailable: Release engineer",
                "Assumption Violated: Assume 0",
                "Assumption Violated: Assume 1",
                "Assumption Violated: Assume 2",
            ]
        );
    }

    #[test]
    fn losing_the_only_engineer_collapses() {
        let g = graph(
            vec![
                Node::new("ops", NodeKind::Resource, "On-call engineer"),
                Node::new("d1", NodeKind::Decision, "Manual failover"),
            ],
            vec![Edge::new("e1", "d1", "ops", EdgeKind::Requires)],
        );
        let sim = CounterfactualSimulator::new(&g, AxiomRegistry::new());
        let results = sim.run().expect("simulation runs");
        assert_eq!(results.len(), 3);

        let spike = &results[0];
        assert!(spike.survived);
        assert_eq!(spike.collapse_reason, None);

        let human = &results[2];
        assert_eq!(human.scenario.kind, ScenarioKind::HumanUnavailable);
        assert!(!human.survived);
        assert_eq!(human.fii_after, 1.0);
        assert_eq!(
            human.collapse_reason.as_deref(),
            Some("FII reached 100.00% - inevitable failure")
        );
        assert_eq!(
            human.explanation,
            "System collapsed under 'Human Unavailable: On-call engineer': \
             FII reached 100.00% - inevitable failure"
        );

        // The base graph never sees the soft removal.
        let base_ops = g.node(&"ops".into()).expect("ops exists");
        assert_eq!(base_ops.capacity(), f64::INFINITY);

        let summary = SimulationSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.critical_failures, 1);
        assert!((summary.failure_rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fatal_violation_drives_collapse_reason() {
        let g = graph(
            vec![
                Node::new("a1", NodeKind::Assumption, "Single writer"),
                Node::new("d1", NodeKind::Decision, "High availability writes"),
                Node::new("d2", NodeKind::Decision, "Single primary"),
            ],
            vec![Edge::new("e1", "a1", "d1", EdgeKind::Assumes)],
        );
        let sim = CounterfactualSimulator::new(&g, AxiomRegistry::new());
        let scenario = sim
            .standard_scenarios()
            .into_iter()
            .find(|s| s.kind == ScenarioKind::AssumptionViolated)
            .expect("assumption scenario generated");
        let result = sim.test_scenario(&scenario).expect("scenario runs");
        assert!(!result.survived);
        assert_eq!(
            result.collapse_reason.as_deref(),
            Some("Fatal axiom violation: High availability cannot coexist with single point of failure")
        );
    }

    #[test]
    fn empty_results_have_zero_failure_rate() {
        assert_eq!(failure_rate(&[]), 0.0);
        assert!(critical_failures(&[]).is_empty());
        let summary = SimulationSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
    }
}
