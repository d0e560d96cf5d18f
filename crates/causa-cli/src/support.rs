use crate::error::{CliError, display_path};
use causa_kernel::{GraphDocument, RealityGraph, VerificationContext};
use serde::Serialize;
use std::path::Path;

pub const PATH_SAMPLE_LIMIT: usize = 25;

pub fn exit_with(err: &CliError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: display_path(path),
        source,
    })
}

pub fn load_document(path: &Path) -> Result<GraphDocument, CliError> {
    let raw = read_file(path)?;
    GraphDocument::from_json_str(&raw).map_err(|source| CliError::Document {
        path: display_path(path),
        source,
    })
}

/// Load a graph document and build its graph.
pub fn load_graph(path: &Path) -> Result<(GraphDocument, RealityGraph), CliError> {
    let doc = load_document(path)?;
    let graph = doc.to_graph().map_err(|e| CliError::Document {
        path: display_path(path),
        source: e.into(),
    })?;
    tracing::debug!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok((doc, graph))
}

pub fn load_graph_or_exit(path: &Path) -> (GraphDocument, RealityGraph) {
    load_graph(path).unwrap_or_else(|e| exit_with(&e))
}

pub fn load_context(path: &Path) -> Result<VerificationContext, CliError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|source| CliError::Document {
        path: display_path(path),
        source: source.into(),
    })
}

pub fn load_context_or_exit(path: &Path) -> VerificationContext {
    load_context(path).unwrap_or_else(|e| exit_with(&e))
}

pub fn print_json<T: Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: failed to render json: {e}");
            std::process::exit(1);
        }
    }
}

/// The first `limit` items of a listing plus how many were left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<T> {
    pub total: usize,
    pub shown: Vec<T>,
    pub truncated: usize,
}

impl<T> Sample<T> {
    pub fn take(items: impl IntoIterator<Item = T>, limit: usize) -> Self {
        let mut total = 0;
        let mut shown = Vec::new();
        for item in items {
            total += 1;
            if shown.len() < limit {
                shown.push(item);
            }
        }
        Self {
            total,
            truncated: total - shown.len(),
            shown,
        }
    }
}

impl<T: std::fmt::Display> Sample<T> {
    /// Indented bullet list; prints nothing for an empty listing.
    pub fn print(&self, header: &str) {
        if self.shown.is_empty() {
            return;
        }
        println!("  {header} ({} of {}):", self.shown.len(), self.total);
        for item in &self.shown {
            println!("    - {item}");
        }
        if self.truncated > 0 {
            println!("    - ... {} more (raise --limit)", self.truncated);
        }
    }
}
