//! Graph-to-text dumps for debugging build correctness.
//!
//! Read-only: dumping never affects build results.

use std::fmt::Write;

use super::{OperationGraph, OperationKind};

/// Render the graph as Graphviz DOT for external visualization tooling.
pub fn as_dot(graph: &OperationGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph operations {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box];\n");
    for op in graph.operations() {
        let mut attrs = format!("label=\"{}: {}\"", op.id().index(), label(op.kind()));
        if op.is_complex() {
            attrs.push_str(", peripheries=2");
        }
        if graph.active_viewer() == Some(op.id()) {
            attrs.push_str(", style=bold");
        }
        let _ = writeln!(out, "  {} [{}];", op.id(), attrs);
    }
    for link in graph.links() {
        let _ = writeln!(
            out,
            "  {} -> {} [label=\"{}\"];",
            link.from.op,
            link.to.op,
            graph.output_type(link.from)
        );
    }
    out.push_str("}\n");
    out
}

/// One-line-per-item plain text dump.
pub fn as_text(graph: &OperationGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "graph phase={:?} operations={} links={}",
        graph.phase(),
        graph.operation_count(),
        graph.links().len()
    );
    for op in graph.operations() {
        let _ = writeln!(out, "  operation {}: {:?}", op.id(), op.kind());
    }
    for link in graph.links() {
        let _ = writeln!(
            out,
            "  link {}:{} -> {}:{}",
            link.from.op, link.from.index, link.to.op, link.to.index
        );
    }
    out
}

fn label(kind: &OperationKind) -> String {
    match kind {
        OperationKind::Constant(v) => format!("constant {:?}", v),
        OperationKind::Convert { from, to } => format!("convert {} -> {}", from, to),
        other => other.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConstantValue, InputRef, OperationKind, OutputRef};

    #[test]
    fn test_dot_contains_every_live_operation() {
        let mut graph = OperationGraph::new();
        let c = graph.add_operation(OperationKind::Constant(ConstantValue::color(
            1.0, 0.0, 0.0, 1.0,
        )));
        let viewer = graph.add_operation(OperationKind::Viewer);
        graph.add_link(OutputRef::new(c, 0), InputRef::new(viewer, 0));
        let dead = graph.add_operation(OperationKind::Invert);
        graph.remove_operation(dead);

        let dot = as_dot(&graph);
        assert!(dot.contains("op0"));
        assert!(dot.contains("op1"));
        assert!(!dot.contains("op2"));
        assert!(dot.contains("op0 -> op1"));
    }
}
