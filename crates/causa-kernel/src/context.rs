//! Verification context: the side-channel signals the axioms consume.
//!
//! The graph alone does not say who the irreplaceable engineers are or which
//! hostile assumptions broke under stress testing. Those signals come from
//! the caller. Every recognized field is enumerated here; an absent field
//! deserializes to empty/zero, never to an error.

use serde::{Deserialize, Serialize};

/// A counterfactual outcome supplied by the caller.
///
/// Distinct from the simulator's own `CounterfactualResult`; this is the
/// minimal record the counterfactual-validity axiom needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualSignal {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scenario_name: String,
    pub survived: bool,
    #[serde(default)]
    pub scenario_criticality: f64,
}

/// A human the system depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanDependency {
    pub identifier: String,
    #[serde(default)]
    pub is_single_point_of_failure: bool,
    #[serde(default)]
    pub failure_scenario: String,
}

/// An assumption and the outcome of its stress test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionSignal {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stress_test_failed: bool,
}

/// Typed verification context, passed by reference into every axiom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationContext {
    pub failure_inevitability_index: f64,
    /// Informational; echoed into inevitability evidence.
    pub failure_paths: Vec<String>,
    pub counterfactual_results: Vec<CounterfactualSignal>,
    pub human_dependencies: Vec<HumanDependency>,
    pub extracted_assumptions: Vec<AssumptionSignal>,
    pub hostile_assumptions: Vec<AssumptionSignal>,
    /// Set when verifying a mutated clone inside the simulator.
    pub counterfactual_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

impl VerificationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ephemeral context used for one counterfactual scenario.
    pub fn counterfactual(scenario: impl Into<String>) -> Self {
        Self {
            counterfactual_mode: true,
            scenario: Some(scenario.into()),
            ..Self::default()
        }
    }

    pub fn with_failure_inevitability_index(mut self, fii: f64) -> Self {
        self.failure_inevitability_index = fii;
        self
    }

    pub fn single_points_of_failure(&self) -> impl Iterator<Item = &HumanDependency> {
        self.human_dependencies
            .iter()
            .filter(|h| h.is_single_point_of_failure)
    }

    pub fn failed_hostile_assumptions(&self) -> impl Iterator<Item = &AssumptionSignal> {
        self.hostile_assumptions
            .iter()
            .filter(|a| a.stress_test_failed)
    }
}
