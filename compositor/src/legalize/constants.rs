//! Constant folding: unconnected inputs and all-constant operations.

use ordered_float::OrderedFloat;

use crate::graph::{
    ConstantValue, DataType, InputRef, MathOp, OperationGraph, OperationId, OperationKind,
    OutputRef,
};

/// Wire a constant-producing operation into every unconnected input.
///
/// The constant comes from the input's declared default. An input with
/// no default gets the type-appropriate zero value and a warning — a
/// broken branch degrades to black, it never blanks the composite.
pub fn fold_unconnected_inputs(graph: &mut OperationGraph) {
    let ids: Vec<OperationId> = graph.ids().collect();
    for id in ids {
        for index in 0..graph.operation(id).inputs().len() {
            let input = InputRef::new(id, index);
            if graph.input_link(input).is_some() {
                continue;
            }
            let declared = graph.operation(id).inputs()[index].data_type;
            let value = match graph.operation(id).inputs()[index].default {
                Some(default) => default,
                None => {
                    log::warn!(
                        "unconnected input {}:{} has no default, zero-filling",
                        id,
                        index
                    );
                    declared.zero()
                }
            };
            let constant = graph.add_operation(OperationKind::Constant(value));
            graph.add_link(OutputRef::new(constant, 0), input);
        }
    }
}

/// Replace every foldable operation whose inputs are all constants with
/// a single constant operation. Runs to fixpoint so chains of math
/// collapse. A pure size optimization; the orphaned input constants are
/// swept up by the pruner.
pub fn fold_constant_operations(graph: &mut OperationGraph) {
    loop {
        let mut folded = false;
        let ids: Vec<OperationId> = graph.ids().collect();
        for id in ids {
            if !graph.operation(id).can_be_constant() {
                continue;
            }
            let Some(value) = folded_value(graph, id) else {
                continue;
            };
            graph.replace_operation_with_constant(id, value);
            folded = true;
        }
        if !folded {
            break;
        }
    }
}

/// The constant an operation would produce, if all of its inputs are
/// constants.
fn folded_value(graph: &OperationGraph, id: OperationId) -> Option<ConstantValue> {
    let op = graph.operation(id);
    let mut inputs = Vec::with_capacity(op.inputs().len());
    for index in 0..op.inputs().len() {
        let link = graph.input_link(InputRef::new(id, index))?;
        match graph.operation(link.from.op).kind() {
            OperationKind::Constant(value) => inputs.push(*value),
            _ => return None,
        }
    }
    match op.kind() {
        OperationKind::Math(math) => match (inputs[0], inputs[1]) {
            (ConstantValue::Value(a), ConstantValue::Value(b)) => {
                Some(ConstantValue::value(eval_math(*math, a.0, b.0)))
            }
            _ => None,
        },
        OperationKind::Convert { to, .. } => Some(convert_constant(inputs[0], *to)),
        _ => None,
    }
}

fn eval_math(op: MathOp, a: f32, b: f32) -> f32 {
    match op {
        MathOp::Add => a + b,
        MathOp::Subtract => a - b,
        MathOp::Multiply => a * b,
        MathOp::Divide => {
            if b == 0.0 {
                0.0
            } else {
                a / b
            }
        }
        MathOp::Minimum => a.min(b),
        MathOp::Maximum => a.max(b),
    }
}

fn convert_constant(value: ConstantValue, to: DataType) -> ConstantValue {
    let channels: [f32; 3] = match value {
        ConstantValue::Value(v) => [v.0, v.0, v.0],
        ConstantValue::Vector([x, y, z]) => [x.0, y.0, z.0],
        ConstantValue::Color([r, g, b, _]) => [r.0, g.0, b.0],
    };
    match to {
        DataType::Value => {
            ConstantValue::Value(OrderedFloat((channels[0] + channels[1] + channels[2]) / 3.0))
        }
        DataType::Vector => ConstantValue::vector(channels[0], channels[1], channels[2]),
        DataType::Color => ConstantValue::color(channels[0], channels[1], channels[2], 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MixMode;

    #[test]
    fn test_default_becomes_constant() {
        let mut graph = OperationGraph::new();
        let math = graph.add_operation(OperationKind::Math(MathOp::Add));
        graph.set_input_default(InputRef::new(math, 0), Some(ConstantValue::value(0.5)));
        graph.set_input_default(InputRef::new(math, 1), Some(ConstantValue::value(0.5)));

        fold_unconnected_inputs(&mut graph);

        // One constant per input, no sharing.
        assert_eq!(graph.operation_count(), 3);
        for index in 0..2 {
            let link = graph.input_link(InputRef::new(math, index)).unwrap();
            assert_eq!(
                graph.operation(link.from.op).kind(),
                &OperationKind::Constant(ConstantValue::value(0.5))
            );
        }
    }

    #[test]
    fn test_missing_default_zero_fills() {
        let mut graph = OperationGraph::new();
        let mix = graph.add_operation(OperationKind::Mix(MixMode::Mix));

        fold_unconnected_inputs(&mut graph);

        let fac = graph.input_link(InputRef::new(mix, 0)).unwrap();
        assert_eq!(
            graph.operation(fac.from.op).kind(),
            &OperationKind::Constant(ConstantValue::value(0.0))
        );
        let image = graph.input_link(InputRef::new(mix, 1)).unwrap();
        assert_eq!(
            graph.operation(image.from.op).kind(),
            &OperationKind::Constant(ConstantValue::color(0.0, 0.0, 0.0, 1.0))
        );
    }

    #[test]
    fn test_all_constant_math_folds() {
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(OperationKind::Constant(ConstantValue::value(2.0)));
        let b = graph.add_operation(OperationKind::Constant(ConstantValue::value(3.0)));
        let math = graph.add_operation(OperationKind::Math(MathOp::Multiply));
        let sink = graph.add_operation(OperationKind::Viewer);
        graph.add_link(OutputRef::new(a, 0), InputRef::new(math, 0));
        graph.add_link(OutputRef::new(b, 0), InputRef::new(math, 1));
        graph.add_link(OutputRef::new(math, 0), InputRef::new(sink, 1));

        fold_constant_operations(&mut graph);

        assert!(!graph.contains(math));
        let link = graph.input_link(InputRef::new(sink, 1)).unwrap();
        assert_eq!(
            graph.operation(link.from.op).kind(),
            &OperationKind::Constant(ConstantValue::value(6.0))
        );
    }

    #[test]
    fn test_math_with_live_input_does_not_fold() {
        let mut graph = OperationGraph::new();
        let a = graph.add_operation(OperationKind::Constant(ConstantValue::value(2.0)));
        let source = graph.add_operation(OperationKind::ImageSource {
            path: "in.png".to_string(),
        });
        let math = graph.add_operation(OperationKind::Math(MathOp::Add));
        graph.add_link(OutputRef::new(a, 0), InputRef::new(math, 0));
        graph.add_link(OutputRef::new(source, 1), InputRef::new(math, 1));

        fold_constant_operations(&mut graph);
        assert!(graph.contains(math));
    }
}
