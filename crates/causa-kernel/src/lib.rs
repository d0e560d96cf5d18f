//! # Causa Kernel
//!
//! Structural verification of a system's causal model. A reality graph of
//! decisions, resources, assumptions and behaviors is checked against a
//! fixed set of axioms, scored for failure inevitability, perturbed by
//! counterfactual scenarios, and finally judged.
//!
//! Every computation is a pure, synchronous function of its inputs:
//! identical graphs and contexts produce identical verdicts.
//!
//! ## Architecture
//!
//! ```text
//! RealityGraph            ← Nodes, typed causal edges, adjacency indices
//!     │
//! AxiomRegistry           ← Six fixed laws → AxiomViolation*
//!     │
//! InevitabilityCalculator ← Collapse paths + adjustments → FII ∈ [0,1]
//!     │
//! CounterfactualSimulator ← Clone, mutate, re-verify per scenario
//!     │
//! ExistenceJudge          ← Ordered rules → ExistenceVerdict + proof chain
//! ```

pub mod axiom;
pub mod context;
pub mod counterfactual;
pub mod document;
pub mod error;
pub mod graph;
pub mod inevitability;
pub mod pipeline;
pub mod verdict;

pub use axiom::{Axiom, AxiomRegistry, AxiomViolation, ViolationKind};
pub use context::{AssumptionSignal, CounterfactualSignal, HumanDependency, VerificationContext};
pub use counterfactual::{
    CounterfactualResult, CounterfactualScenario, CounterfactualSimulator, Mutation,
    ScenarioKind, SimulationSummary,
};
pub use document::{EdgeDocument, GraphDocument, graph_digest};
pub use error::{DocumentError, Endpoint, GraphError};
pub use graph::{
    Contradiction, ContradictionSource, Edge, EdgeId, EdgeKind, GraphStats, Node, NodeId,
    NodeKind, RealityGraph,
};
pub use inevitability::{
    CollapseKind, CollapsePath, FailureInevitability, FiiBand, InevitabilityCalculator,
    probabilistic_or,
};
pub use pipeline::{AnalysisOptions, AnalysisReport, analyze};
pub use verdict::{ExistenceJudge, ExistenceVerdict, Verdict};

/// Render a ratio as a percentage with two decimals (`0.5` → `50.00%`).
pub fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}
