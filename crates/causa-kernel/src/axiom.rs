//! Axiom registry: the fixed laws every reality graph is checked against.
//!
//! Axioms are constants of the model, not policy. There is no way to
//! disable, reorder, or reweight them. Each axiom is a pure function of
//! `(graph, context)` and emits at most one violation; `verify_all` runs all
//! six in declaration order so output ordering is deterministic.

use crate::context::VerificationContext;
use crate::graph::{NodeKind, RealityGraph};
use crate::percent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Violations at or above this severity are fatal.
pub const FATAL_SEVERITY: f64 = 0.95;

/// Inevitability fires when the context index reaches this value.
pub const INEVITABILITY_THRESHOLD: f64 = 0.95;

/// Counterfactual scenarios at or above this criticality are critical.
pub const CRITICAL_SCENARIO: f64 = 0.7;

const EXISTENCE_SEVERITY: f64 = 0.8;
const COUNTERFACTUAL_SEVERITY_CAP: f64 = 0.9;
const HUMAN_DEPENDENCY_SEVERITY: f64 = 0.85;
const SILENT_ASSUMPTION_SEVERITY: f64 = 0.75;

/// The six axioms, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axiom {
    /// Every behavior derives from an explicit decision.
    Existence,
    /// Mutually unsatisfiable decisions invalidate the system.
    Contradiction,
    /// Inevitable failure is present failure.
    Inevitability,
    /// The system must survive reasonable alternate realities.
    CounterfactualValidity,
    /// Depending on a specific human is a single point of failure.
    HumanDependency,
    /// Unstated assumptions are hostile until stress-tested.
    SilentAssumption,
}

/// Violation classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnexplainedBehavior,
    Contradiction,
    Inevitability,
    CounterfactualFailure,
    HumanDependency,
    SilentAssumption,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::UnexplainedBehavior => "unexplained_behavior",
            ViolationKind::Contradiction => "contradiction",
            ViolationKind::Inevitability => "inevitability",
            ViolationKind::CounterfactualFailure => "counterfactual_failure",
            ViolationKind::HumanDependency => "human_dependency",
            ViolationKind::SilentAssumption => "silent_assumption",
        }
    }
}

/// A violation of one axiom. Produced fresh on every verification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxiomViolation {
    pub axiom: Axiom,
    pub kind: ViolationKind,
    pub severity: f64,
    pub evidence: Value,
    pub causal_chain: Vec<String>,
    pub explanation: String,
}

impl AxiomViolation {
    pub fn axiom_name(&self) -> &'static str {
        self.axiom.name()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity >= FATAL_SEVERITY
    }
}

fn chain(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}

impl Axiom {
    pub const ALL: [Axiom; 6] = [
        Axiom::Existence,
        Axiom::Contradiction,
        Axiom::Inevitability,
        Axiom::CounterfactualValidity,
        Axiom::HumanDependency,
        Axiom::SilentAssumption,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Axiom::Existence => "EXISTENCE_AXIOM",
            Axiom::Contradiction => "CONTRADICTION_LAW",
            Axiom::Inevitability => "INEVITABILITY_AXIOM",
            Axiom::CounterfactualValidity => "COUNTERFACTUAL_VALIDITY",
            Axiom::HumanDependency => "HUMAN_DEPENDENCY_PARADOX",
            Axiom::SilentAssumption => "SILENT_ASSUMPTION_LAW",
        }
    }

    /// Formal statement of the axiom.
    pub fn explain(&self) -> &'static str {
        match self {
            Axiom::Existence => {
                "EXISTENCE AXIOM: for every behavior B there is a decision D such that B derives \
                 from D. A behavior with no decision origin means the model is incomplete."
            }
            Axiom::Contradiction => {
                "CONTRADICTION LAW: if decisions D1 and D2 cannot both hold, the system is \
                 invalid. Time does not resolve contradictions."
            }
            Axiom::Inevitability => {
                "INEVITABILITY AXIOM: if collapse is certain across all execution paths, the \
                 system is failed at t=0."
            }
            Axiom::CounterfactualValidity => {
                "COUNTERFACTUAL VALIDITY: a valid system stays coherent under reasonable \
                 perturbations of its assumptions. Collapse under them is invalidity, not \
                 fragility."
            }
            Axiom::HumanDependency => {
                "HUMAN DEPENDENCY PARADOX: if some human H being unavailable implies the system \
                 fails, the system is invalid."
            }
            Axiom::SilentAssumption => {
                "SILENT ASSUMPTION LAW: every unstated assumption is hostile and is stress-tested \
                 until it breaks. A broken assumption invalidates the system."
            }
        }
    }

    /// Check this axiom against `graph` under `ctx`.
    pub fn verify(
        &self,
        graph: &RealityGraph,
        ctx: &VerificationContext,
    ) -> Option<AxiomViolation> {
        match self {
            Axiom::Existence => verify_existence(graph),
            Axiom::Contradiction => verify_contradiction(graph),
            Axiom::Inevitability => verify_inevitability(ctx),
            Axiom::CounterfactualValidity => verify_counterfactual_validity(ctx),
            Axiom::HumanDependency => verify_human_dependency(ctx),
            Axiom::SilentAssumption => verify_silent_assumption(ctx),
        }
    }
}

fn verify_existence(graph: &RealityGraph) -> Option<AxiomViolation> {
    let orphaned: Vec<&str> = graph
        .nodes_of_kind(NodeKind::Behavior)
        .into_iter()
        .filter(|b| !graph.has_decision_ancestry(&b.id))
        .map(|b| b.id.as_str())
        .collect();
    if orphaned.is_empty() {
        return None;
    }

    Some(AxiomViolation {
        axiom: Axiom::Existence,
        kind: ViolationKind::UnexplainedBehavior,
        severity: EXISTENCE_SEVERITY,
        evidence: json!({ "orphaned_behaviors": orphaned }),
        causal_chain: chain(&["undefined_origin", "behavior_without_decision"]),
        explanation: format!(
            "Found {} behaviors with no decision origin",
            orphaned.len()
        ),
    })
}

fn verify_contradiction(graph: &RealityGraph) -> Option<AxiomViolation> {
    let contradictions = graph.find_contradictions();
    // First-found wins among equally severe contradictions.
    let primary = contradictions
        .iter()
        .fold(None, |best: Option<&crate::graph::Contradiction>, c| match best {
            Some(b) if b.severity >= c.severity => Some(b),
            _ => Some(c),
        })?;

    Some(AxiomViolation {
        axiom: Axiom::Contradiction,
        kind: ViolationKind::Contradiction,
        severity: primary.severity,
        evidence: json!({
            "contradictions": contradictions,
            "primary": primary,
        }),
        causal_chain: primary.causal_chain.clone(),
        explanation: primary.explanation.clone(),
    })
}

fn verify_inevitability(ctx: &VerificationContext) -> Option<AxiomViolation> {
    let fii = ctx.failure_inevitability_index;
    if fii < INEVITABILITY_THRESHOLD {
        return None;
    }

    Some(AxiomViolation {
        axiom: Axiom::Inevitability,
        kind: ViolationKind::Inevitability,
        severity: fii,
        evidence: json!({
            "fii": fii,
            "failure_paths": ctx.failure_paths,
            "escape_paths": 0,
        }),
        causal_chain: chain(&["all_paths_analyzed", "no_escape_route", "collapse_certain"]),
        explanation: format!(
            "Failure Inevitability Index: {}. No viable execution path exists.",
            percent(fii)
        ),
    })
}

fn verify_counterfactual_validity(ctx: &VerificationContext) -> Option<AxiomViolation> {
    let results = &ctx.counterfactual_results;
    let failed: Vec<_> = results.iter().filter(|r| !r.survived).collect();
    let critical: Vec<_> = failed
        .iter()
        .filter(|r| r.scenario_criticality >= CRITICAL_SCENARIO)
        .collect();
    if critical.is_empty() {
        return None;
    }

    let failure_rate = failed.len() as f64 / results.len() as f64;
    let details: Vec<_> = critical.iter().take(3).collect();
    Some(AxiomViolation {
        axiom: Axiom::CounterfactualValidity,
        kind: ViolationKind::CounterfactualFailure,
        severity: failure_rate.min(COUNTERFACTUAL_SEVERITY_CAP),
        evidence: json!({
            "failed_scenarios": failed.len(),
            "critical_failures": critical.len(),
            "total_tested": results.len(),
            "details": details,
        }),
        causal_chain: chain(&["counterfactual_test", "critical_scenario_failure"]),
        explanation: format!(
            "System collapsed in {} critical alternate scenarios",
            critical.len()
        ),
    })
}

fn verify_human_dependency(ctx: &VerificationContext) -> Option<AxiomViolation> {
    let critical: Vec<_> = ctx.single_points_of_failure().collect();
    if critical.is_empty() {
        return None;
    }

    let humans: Vec<&str> = critical.iter().map(|h| h.identifier.as_str()).collect();
    let scenarios: Vec<&str> = critical
        .iter()
        .map(|h| h.failure_scenario.as_str())
        .collect();
    Some(AxiomViolation {
        axiom: Axiom::HumanDependency,
        kind: ViolationKind::HumanDependency,
        severity: HUMAN_DEPENDENCY_SEVERITY,
        evidence: json!({
            "critical_humans": humans,
            "failure_scenarios": scenarios,
        }),
        causal_chain: chain(&["human_identified", "no_redundancy", "single_point_of_failure"]),
        explanation: format!(
            "System stability depends on {} irreplaceable human(s)",
            critical.len()
        ),
    })
}

fn verify_silent_assumption(ctx: &VerificationContext) -> Option<AxiomViolation> {
    let violated: Vec<_> = ctx.failed_hostile_assumptions().collect();
    if violated.is_empty() {
        return None;
    }

    let details: Vec<_> = violated.iter().take(5).collect();
    Some(AxiomViolation {
        axiom: Axiom::SilentAssumption,
        kind: ViolationKind::SilentAssumption,
        severity: SILENT_ASSUMPTION_SEVERITY,
        evidence: json!({
            "total_assumptions": ctx.extracted_assumptions.len(),
            "violated": violated.len(),
            "details": details,
        }),
        causal_chain: chain(&["assumption_extracted", "stress_test", "assumption_violated"]),
        explanation: format!(
            "{} critical assumptions failed stress testing",
            violated.len()
        ),
    })
}

/// The fixed, ordered set of axioms.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxiomRegistry;

impl AxiomRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn axioms(&self) -> &'static [Axiom] {
        &Axiom::ALL
    }

    /// Run every axiom; return the violations in axiom order.
    pub fn verify_all(
        &self,
        graph: &RealityGraph,
        ctx: &VerificationContext,
    ) -> Vec<AxiomViolation> {
        let violations: Vec<AxiomViolation> = self
            .axioms()
            .iter()
            .filter_map(|axiom| axiom.verify(graph, ctx))
            .collect();
        for v in &violations {
            tracing::debug!(
                axiom = v.axiom_name(),
                severity = v.severity,
                fatal = v.is_fatal(),
                counterfactual = ctx.counterfactual_mode,
                "axiom violated"
            );
        }
        violations
    }

    pub fn fatal_violations<'a>(&self, violations: &'a [AxiomViolation]) -> Vec<&'a AxiomViolation> {
        violations.iter().filter(|v| v.is_fatal()).collect()
    }

    pub fn explain_all(&self) -> String {
        self.axioms()
            .iter()
            .map(Axiom::explain)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
