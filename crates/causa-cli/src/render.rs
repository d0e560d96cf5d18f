//! Terminal rendering of an analysis report.

use causa_kernel::counterfactual::critical_failures;
use causa_kernel::{AnalysisReport, ExistenceVerdict, percent};

const RULE_WIDTH: usize = 70;
const COLLAPSE_PATH_LIMIT: usize = 5;
const CRITICAL_FAILURE_LIMIT: usize = 5;

pub fn verdict_text(verdict: &ExistenceVerdict) -> String {
    let rule = "═".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "CAUSA EXISTENCE VERIFICATION".to_string(),
        rule.clone(),
        String::new(),
        "SYSTEM EXISTENCE VERDICT:".to_string(),
        format!("  {}", verdict.verdict),
        String::new(),
        "PRIMARY REASON:".to_string(),
        format!("  {}", verdict.primary_reason),
        String::new(),
    ];

    if !verdict.supporting_evidence.is_empty() {
        lines.push("SUPPORTING EVIDENCE:".to_string());
        lines.extend(verdict.supporting_evidence.iter().map(|e| format!("  • {e}")));
        lines.push(String::new());
    }

    lines.push("METRICS:".to_string());
    lines.push(format!("  Failure Inevitability Index: {}", percent(verdict.fii)));
    lines.push(format!("  Axiom Violations: {}", verdict.violation_count()));
    lines.push(format!(
        "  Counterfactual Failures: {}",
        verdict.counterfactual_failures
    ));
    lines.push(format!("  Verdict Certainty: {:.1}%", verdict.certainty * 100.0));
    lines.push(String::new());

    lines.push("PROOF CHAIN:".to_string());
    lines.extend(
        verdict
            .proof_chain
            .iter()
            .enumerate()
            .map(|(i, step)| format!("  {}. {step}", i + 1)),
    );
    lines.push(String::new());
    lines.push(rule);
    lines.join("\n")
}

pub fn report_text(report: &AnalysisReport) -> String {
    let mut out = verdict_text(&report.verdict);
    out.push_str("\n\n");

    let fii = &report.inevitability;
    out.push_str("FAILURE INEVITABILITY:\n");
    out.push_str(&format!(
        "  FII: {} ({})\n",
        percent(fii.fii),
        fii.band().describe()
    ));
    out.push_str(&format!("  Collapse paths: {}\n", fii.collapse_paths.len()));
    for path in fii.collapse_paths.iter().take(COLLAPSE_PATH_LIMIT) {
        out.push_str(&format!(
            "    - [{}] {} (certainty {})\n",
            path.kind.as_str(),
            path.explanation,
            percent(path.certainty)
        ));
    }

    if report.summary.total > 0 {
        let summary = &report.summary;
        out.push_str("\nCOUNTERFACTUAL SIMULATION:\n");
        out.push_str(&format!("  Scenarios tested: {}\n", summary.total));
        out.push_str(&format!("  Survived: {}\n", summary.survived));
        out.push_str(&format!("  Failed: {}\n", summary.failed));
        out.push_str(&format!(
            "  Failure rate: {:.1}%\n",
            summary.failure_rate * 100.0
        ));
        let critical = critical_failures(&report.counterfactuals);
        if critical.is_empty() {
            out.push_str("  No critical scenario failures detected.\n");
        } else {
            out.push_str(&format!("  Critical failures ({}):\n", critical.len()));
            for result in critical.iter().take(CRITICAL_FAILURE_LIMIT) {
                out.push_str(&format!("    - {}\n", result.scenario.name));
                if let Some(reason) = &result.collapse_reason {
                    out.push_str(&format!("      {reason}\n"));
                }
                out.push_str(&format!("      FII after: {}\n", percent(result.fii_after)));
            }
        }
    }

    out
}
