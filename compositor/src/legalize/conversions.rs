//! Data-type conversion insertion.

use crate::graph::{InputRef, Link, OperationGraph, OperationKind, OutputRef};

/// Insert a conversion operation on every link whose source output type
/// differs from the destination input's declared type.
///
/// Idempotent: after one run every link type-matches, so a second run
/// inserts nothing.
pub fn insert_conversions(graph: &mut OperationGraph) {
    let mismatched: Vec<Link> = graph
        .links()
        .iter()
        .copied()
        .filter(|link| graph.output_type(link.from) != graph.input_type(link.to))
        .collect();

    for link in mismatched {
        let from = graph.output_type(link.from);
        let to = graph.input_type(link.to);
        let convert = graph.add_operation(OperationKind::Convert { from, to });
        graph.remove_input_link(link.to);
        graph.add_link(link.from, InputRef::new(convert, 0));
        graph.add_link(OutputRef::new(convert, 0), link.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConstantValue, DataType, MathOp};

    #[test]
    fn test_mismatched_link_gets_conversion() {
        let mut graph = OperationGraph::new();
        let value = graph.add_operation(OperationKind::Constant(ConstantValue::value(0.7)));
        let invert = graph.add_operation(OperationKind::Invert);
        // Value output into the Color input.
        graph.add_link(OutputRef::new(value, 0), InputRef::new(invert, 1));

        insert_conversions(&mut graph);

        let link = graph.input_link(InputRef::new(invert, 1)).unwrap();
        let source = graph.operation(link.from.op);
        assert_eq!(
            source.kind(),
            &OperationKind::Convert {
                from: DataType::Value,
                to: DataType::Color
            }
        );
        assert_eq!(graph.links().len(), 2);
    }

    #[test]
    fn test_insertion_is_idempotent() {
        let mut graph = OperationGraph::new();
        let value = graph.add_operation(OperationKind::Constant(ConstantValue::value(0.7)));
        let invert = graph.add_operation(OperationKind::Invert);
        graph.add_link(OutputRef::new(value, 0), InputRef::new(invert, 1));

        insert_conversions(&mut graph);
        let ops = graph.operation_count();
        let links = graph.links().len();

        insert_conversions(&mut graph);
        assert_eq!(graph.operation_count(), ops);
        assert_eq!(graph.links().len(), links);
    }

    #[test]
    fn test_matching_link_untouched() {
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(OperationKind::Constant(ConstantValue::value(1.0)));
        let math = graph.add_operation(OperationKind::Math(MathOp::Add));
        graph.add_link(OutputRef::new(a, 0), InputRef::new(math, 0));

        insert_conversions(&mut graph);
        assert_eq!(graph.operation_count(), 2);
    }
}
