use crate::config::Config;
use crate::error::{CliError, display_path};
use crate::render::report_text;
use crate::support::{exit_with, load_context_or_exit, load_graph_or_exit, print_json};
use causa_kernel::{AnalysisOptions, Verdict, analyze};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::path::PathBuf;

pub struct Args {
    pub graph: PathBuf,
    pub context: Option<PathBuf>,
    pub json: bool,
    pub no_counterfactuals: bool,
}

/// Process exit code for a verdict.
pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Permissible => 0,
        Verdict::NotPermissible => 2,
        Verdict::Unverified => 3,
    }
}

pub fn run(args: Args, config: &Config) -> i32 {
    let (doc, graph) = load_graph_or_exit(&args.graph);
    let context = match &args.context {
        Some(path) => load_context_or_exit(path),
        None => doc.context.clone().unwrap_or_default(),
    };
    let options = AnalysisOptions {
        counterfactuals: config.analysis.counterfactuals && !args.no_counterfactuals,
    };

    let report = analyze(&graph, &context, options).unwrap_or_else(|e| {
        exit_with(&CliError::Document {
            path: display_path(&args.graph),
            source: e.into(),
        })
    });

    if config.wants_json(args.json) {
        let payload = json!({
            "graph": args.graph.display().to_string(),
            "digest": doc.digest(),
            "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "counterfactuals": options.counterfactuals,
            "report": report,
        });
        print_json(&payload);
    } else {
        println!("{}", report_text(&report));
    }

    exit_code(report.verdict.verdict)
}
