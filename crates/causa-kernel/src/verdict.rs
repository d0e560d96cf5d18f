//! Existence judge: the final, ordered decision procedure.
//!
//! Rules are checked top to bottom and the first match wins:
//!
//! 1. any fatal axiom violation        -> not permissible (1.0)
//! 2. fii >= 0.90                      -> not permissible (1.0)
//! 3. >= 2 critical scenario failures  -> not permissible (0.95)
//! 4. incomplete model                 -> unverified (0.5)
//! 5. fii >= 0.70 or > 3 violations    -> permissible, fragile (0.75)
//! 6. otherwise                        -> permissible, robust (1.0)
//!
//! Every branch emits a literal proof chain so identical inputs always
//! render identical verdicts.

use crate::axiom::{AxiomViolation, CRITICAL_SCENARIO};
use crate::counterfactual::CounterfactualResult;
use crate::graph::RealityGraph;
use crate::percent;
use serde::{Deserialize, Serialize};

pub const INEVITABLE_FII: f64 = 0.9;
pub const FRAGILE_FII: f64 = 0.7;
const FRAGILE_VIOLATION_COUNT: usize = 3;
const CRITICAL_FAILURES_TO_REJECT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Permissible,
    NotPermissible,
    Unverified,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Permissible => "LOGICALLY PERMISSIBLE",
            Verdict::NotPermissible => "NOT LOGICALLY PERMISSIBLE",
            Verdict::Unverified => "UNVERIFIED (Insufficient Data)",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The sole externally consumed artifact of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistenceVerdict {
    pub verdict: Verdict,
    pub certainty: f64,
    pub primary_reason: String,
    pub supporting_evidence: Vec<String>,
    pub fii: f64,
    pub violations: Vec<AxiomViolation>,
    pub counterfactual_failures: usize,
    pub proof_chain: Vec<String>,
}

impl ExistenceVerdict {
    pub fn is_permissible(&self) -> bool {
        self.verdict == Verdict::Permissible
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

fn steps<const N: usize>(labels: [&str; N]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

pub struct ExistenceJudge<'a> {
    graph: &'a RealityGraph,
    violations: &'a [AxiomViolation],
    fii: f64,
    results: &'a [CounterfactualResult],
}

impl<'a> ExistenceJudge<'a> {
    pub fn new(
        graph: &'a RealityGraph,
        violations: &'a [AxiomViolation],
        fii: f64,
        results: &'a [CounterfactualResult],
    ) -> Self {
        Self {
            graph,
            violations,
            fii,
            results,
        }
    }

    pub fn render(&self) -> ExistenceVerdict {
        let verdict = self.decide();
        tracing::info!(
            verdict = verdict.verdict.label(),
            certainty = verdict.certainty,
            fii = verdict.fii,
            violations = verdict.violations.len(),
            "existence verdict rendered"
        );
        verdict
    }

    fn decide(&self) -> ExistenceVerdict {
        if let Some(fatal) = self.violations.iter().find(|v| v.is_fatal()) {
            return self.fatal_violation(fatal);
        }
        if self.fii >= INEVITABLE_FII {
            return self.inevitable_failure();
        }

        let critical: Vec<&CounterfactualResult> = self
            .results
            .iter()
            .filter(|r| !r.survived && r.scenario.criticality >= CRITICAL_SCENARIO)
            .collect();
        if critical.len() >= CRITICAL_FAILURES_TO_REJECT {
            return self.counterfactual_failure(&critical);
        }

        let missing = self.missing_data();
        if !missing.is_empty() {
            return self.unverified(&missing);
        }

        if self.fii >= FRAGILE_FII || self.violations.len() > FRAGILE_VIOLATION_COUNT {
            return self.fragile();
        }
        self.robust()
    }

    fn verdict(
        &self,
        verdict: Verdict,
        certainty: f64,
        primary_reason: String,
        supporting_evidence: Vec<String>,
        proof_chain: Vec<String>,
    ) -> ExistenceVerdict {
        ExistenceVerdict {
            verdict,
            certainty,
            primary_reason,
            supporting_evidence,
            fii: self.fii,
            violations: self.violations.to_vec(),
            counterfactual_failures: self.results.iter().filter(|r| !r.survived).count(),
            proof_chain,
        }
    }

    fn fatal_violation(&self, violation: &AxiomViolation) -> ExistenceVerdict {
        let name = violation.axiom_name();
        self.verdict(
            Verdict::NotPermissible,
            1.0,
            format!("Fatal violation of {name}: {}", violation.explanation),
            vec![
                violation.explanation.clone(),
                format!("Severity: {}", percent(violation.severity)),
                format!("Violation type: {}", violation.kind.as_str()),
            ],
            vec![
                "AXIOM_VERIFICATION".to_string(),
                name.to_string(),
                violation.kind.as_str().to_string(),
                format!("severity={:.2}", violation.severity),
                "FATAL_VIOLATION".to_string(),
                "SYSTEM_INVALID".to_string(),
            ],
        )
    }

    fn inevitable_failure(&self) -> ExistenceVerdict {
        self.verdict(
            Verdict::NotPermissible,
            1.0,
            format!("Failure Inevitability Index: {}", percent(self.fii)),
            vec![
                "All execution paths lead to system collapse".to_string(),
                format!("FII threshold exceeded: {} ≥ 90%", percent(self.fii)),
                "Per Inevitability Axiom: system is logically failed".to_string(),
            ],
            vec![
                "FII_CALCULATION".to_string(),
                format!("fii={:.4}", self.fii),
                "fii >= 0.90".to_string(),
                "INEVITABILITY_AXIOM_TRIGGERED".to_string(),
                "COLLAPSE_CERTAIN".to_string(),
                "SYSTEM_INVALID".to_string(),
            ],
        )
    }

    fn counterfactual_failure(&self, failures: &[&CounterfactualResult]) -> ExistenceVerdict {
        let mut evidence: Vec<String> = failures
            .iter()
            .take(3)
            .map(|f| format!("Failed scenario: {}", f.scenario.name))
            .collect();
        evidence.push("Per Counterfactual Validity Axiom: system is fundamentally fragile".to_string());

        let first = failures[0];
        let mut verdict = self.verdict(
            Verdict::NotPermissible,
            0.95,
            format!("System collapsed in {} critical scenarios", failures.len()),
            evidence,
            vec![
                "COUNTERFACTUAL_SIMULATION".to_string(),
                format!("critical_failures={}", failures.len()),
                first.scenario.name.clone(),
                first.collapse_reason.clone().unwrap_or_default(),
                "COUNTERFACTUAL_VALIDITY_VIOLATED".to_string(),
                "SYSTEM_INVALID".to_string(),
            ],
        );
        verdict.counterfactual_failures = failures.len();
        verdict
    }

    fn unverified(&self, missing: &[String]) -> ExistenceVerdict {
        self.verdict(
            Verdict::Unverified,
            0.5,
            "Insufficient data to render verdict".to_string(),
            vec![
                format!("Missing: {}", missing.join(", ")),
                "Cannot verify system without complete model".to_string(),
                "Recommendation: Provide additional system specifications".to_string(),
            ],
            vec![
                "DATA_COMPLETENESS_CHECK".to_string(),
                "INCOMPLETE_MODEL".to_string(),
                format!("missing=[{}]", missing.join(", ")),
                "CANNOT_VERIFY".to_string(),
                "VERDICT_UNVERIFIED".to_string(),
            ],
        )
    }

    fn fragile(&self) -> ExistenceVerdict {
        let mut chain = steps(["AXIOM_VERIFICATION", "no_fatal_violations", "FII_CALCULATION"]);
        chain.push(format!("fii={:.4}", self.fii));
        chain.extend(steps([
            "fii < 0.90",
            "COUNTERFACTUAL_VALIDATION",
            "acceptable_failure_rate",
            "VERDICT_PERMISSIBLE_FRAGILE",
        ]));
        self.verdict(
            Verdict::Permissible,
            0.75,
            "System is logically permissible but exhibits fragility".to_string(),
            vec![
                format!("FII: {} (elevated but below threshold)", percent(self.fii)),
                format!("Axiom violations: {} (non-fatal)", self.violations.len()),
                "System may survive but requires careful operation".to_string(),
            ],
            chain,
        )
    }

    fn robust(&self) -> ExistenceVerdict {
        let mut chain = steps(["AXIOM_VERIFICATION", "no_fatal_violations", "FII_CALCULATION"]);
        chain.push(format!("fii={:.4}", self.fii));
        chain.extend(steps([
            "fii < 0.70",
            "COUNTERFACTUAL_VALIDATION",
            "critical_scenarios_survived",
            "VERDICT_PERMISSIBLE_ROBUST",
        ]));
        self.verdict(
            Verdict::Permissible,
            1.0,
            "System is logically permissible and robust".to_string(),
            vec![
                format!("FII: {} (low)", percent(self.fii)),
                format!(
                    "No fatal axiom violations ({} minor issues)",
                    self.violations.len()
                ),
                "Survived critical counterfactual scenarios".to_string(),
                "System demonstrates structural soundness".to_string(),
            ],
            chain,
        )
    }

    /// Missing model categories. Empty means the model is complete enough
    /// to judge.
    ///
    /// The four categories are reported independently; a model is only
    /// incomplete when decisions or edges are absent, or a behavior has no
    /// decision origin.
    fn missing_data(&self) -> Vec<String> {
        let stats = self.graph.stats();
        let orphaned = self
            .graph
            .nodes_of_kind(crate::graph::NodeKind::Behavior)
            .into_iter()
            .filter(|b| !self.graph.has_decision_ancestry(&b.id))
            .count();
        let incomplete = stats.decisions() == 0 || stats.total_edges == 0 || orphaned > 0;
        if !incomplete {
            return Vec::new();
        }

        let mut missing = Vec::new();
        if stats.decisions() == 0 {
            missing.push("engineering decisions".to_string());
        }
        if stats.behaviors() == 0 {
            missing.push("system behaviors".to_string());
        }
        if stats.total_edges == 0 {
            missing.push("causal relationships".to_string());
        }
        if stats.assumptions() == 0 {
            missing.push("system assumptions".to_string());
        }
        if orphaned > 0 {
            missing.push(format!("decision origin for {orphaned} behavior(s)"));
        }
        missing
    }
}
