use crate::support::{Sample, load_graph_or_exit, print_json};
use causa_kernel::NodeId;
use serde_json::json;
use std::path::PathBuf;

pub struct Args {
    pub graph: PathBuf,
    pub from: String,
    pub to: String,
    pub limit: usize,
    pub json: bool,
}

pub fn run(args: Args) {
    let (_, graph) = load_graph_or_exit(&args.graph);
    let from = NodeId::new(args.from);
    let to = NodeId::new(args.to);
    for id in [&from, &to] {
        if !graph.contains_node(id) {
            eprintln!("error: unknown node id: {id}");
            std::process::exit(1);
        }
    }

    let rendered = graph.causal_paths(&from, &to).into_iter().map(|path| {
        path.iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    });
    let sample = Sample::take(rendered, args.limit);

    if args.json {
        let payload = json!({
            "from": from,
            "to": to,
            "path_count": sample.total,
            "paths_sample": sample.shown,
            "paths_truncated_count": sample.truncated,
        });
        print_json(&payload);
    } else {
        println!("causa paths {from} -> {to}");
        println!("  Paths: {}", sample.total);
        sample.print("Causal paths");
    }
}
