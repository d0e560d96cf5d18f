use crate::support::{load_graph_or_exit, print_json};
use causa_kernel::NodeKind;
use serde_json::json;
use std::path::PathBuf;

pub fn run(graph_path: PathBuf, json_output: bool) {
    let (doc, graph) = load_graph_or_exit(&graph_path);
    let stats = graph.stats();
    let digest = doc.digest();
    let contradictions = graph.find_contradictions().len();

    if json_output {
        let payload = json!({
            "graph": graph_path.display().to_string(),
            "digest": digest,
            "stats": stats,
            "contradictions": contradictions,
        });
        print_json(&payload);
    } else {
        println!("causa stats {}", graph_path.display());
        println!("  Digest: {digest}");
        println!("  Nodes: {}", stats.total_nodes);
        println!("  Edges: {}", stats.total_edges);
        println!("  Critical nodes: {}", stats.critical_nodes);
        println!("  Contradictions: {contradictions}");
        for kind in NodeKind::ALL {
            let count = stats.count(kind);
            if count > 0 {
                println!("  {kind}: {count}");
            }
        }
    }
}
