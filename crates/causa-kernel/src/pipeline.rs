//! End-to-end analysis: axioms, FII, counterfactuals, verdict.

use crate::axiom::{AxiomRegistry, AxiomViolation};
use crate::context::VerificationContext;
use crate::counterfactual::{CounterfactualResult, CounterfactualSimulator, SimulationSummary};
use crate::error::GraphError;
use crate::graph::{GraphStats, RealityGraph};
use crate::inevitability::{FailureInevitability, InevitabilityCalculator};
use crate::verdict::{ExistenceJudge, ExistenceVerdict};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Run the counterfactual simulator.
    pub counterfactuals: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            counterfactuals: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub verdict: ExistenceVerdict,
    pub inevitability: FailureInevitability,
    pub counterfactuals: Vec<CounterfactualResult>,
    pub summary: SimulationSummary,
    pub stats: GraphStats,
}

/// Analyze `graph` under the caller's context.
///
/// The computed FII is fed back into the context (keeping the larger of
/// the caller's and the computed value) and the axioms are verified a
/// second time; that second pass is what the judge sees.
pub fn analyze(
    graph: &RealityGraph,
    context: &VerificationContext,
    options: AnalysisOptions,
) -> Result<AnalysisReport, GraphError> {
    let registry = AxiomRegistry::new();

    let first_pass = registry.verify_all(graph, context);
    let inevitability = InevitabilityCalculator::new(graph, &first_pass).compute();

    let mut ctx = context.clone();
    ctx.failure_inevitability_index = ctx.failure_inevitability_index.max(inevitability.fii);
    let violations: Vec<AxiomViolation> = registry.verify_all(graph, &ctx);

    let counterfactuals = if options.counterfactuals {
        CounterfactualSimulator::new(graph, registry).run()?
    } else {
        Vec::new()
    };

    let verdict =
        ExistenceJudge::new(graph, &violations, inevitability.fii, &counterfactuals).render();

    Ok(AnalysisReport {
        summary: SimulationSummary::from_results(&counterfactuals),
        stats: graph.stats(),
        verdict,
        inevitability,
        counterfactuals,
    })
}
