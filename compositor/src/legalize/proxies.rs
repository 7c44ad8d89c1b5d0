//! Proxy resolution — removes pass-through operations.

use crate::graph::{InputRef, OperationGraph, OperationId, OutputRef};

/// Remove every socket-proxy operation by relinking its predecessor's
/// output directly to each of its successors' inputs, preserving the
/// original fan-out. Works on chained proxies in any order: a resolved
/// proxy's consumers may themselves be proxies.
pub fn resolve_proxies(graph: &mut OperationGraph) {
    let ids: Vec<OperationId> = graph.ids().collect();
    for id in ids {
        if !graph.operation(id).kind().is_proxy() {
            continue;
        }
        // Constant folding ran first, so the single input is linked.
        let Some(source) = graph.input_link(InputRef::new(id, 0)) else {
            log::warn!("proxy {} has no incoming link, dropping it", id);
            graph.remove_operation(id);
            continue;
        };
        let consumers: Vec<InputRef> = graph
            .output_links(OutputRef::new(id, 0))
            .iter()
            .map(|link| link.to)
            .collect();
        for consumer in consumers {
            graph.remove_input_link(consumer);
            graph.add_link(source.from, consumer);
        }
        graph.remove_operation(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConstantValue, DataType, OperationKind};

    fn proxy(graph: &mut OperationGraph) -> OperationId {
        graph.add_operation(OperationKind::SocketProxy(DataType::Color))
    }

    #[test]
    fn test_proxy_chain_resolves_to_direct_links() {
        let mut graph = OperationGraph::new();
        let source =
            graph.add_operation(OperationKind::Constant(ConstantValue::color(1.0, 0.0, 0.0, 1.0)));
        let p1 = proxy(&mut graph);
        let p2 = proxy(&mut graph);
        let sink = graph.add_operation(OperationKind::Viewer);
        graph.add_link(OutputRef::new(source, 0), InputRef::new(p1, 0));
        graph.add_link(OutputRef::new(p1, 0), InputRef::new(p2, 0));
        graph.add_link(OutputRef::new(p2, 0), InputRef::new(sink, 0));

        resolve_proxies(&mut graph);

        assert_eq!(graph.operation_count(), 2);
        let link = graph.input_link(InputRef::new(sink, 0)).unwrap();
        assert_eq!(link.from.op, source);
    }

    #[test]
    fn test_fan_out_multiplicity_preserved() {
        let mut graph = OperationGraph::new();
        let source =
            graph.add_operation(OperationKind::Constant(ConstantValue::color(1.0, 0.0, 0.0, 1.0)));
        let p = proxy(&mut graph);
        let a = graph.add_operation(OperationKind::Invert);
        let b = graph.add_operation(OperationKind::Invert);
        graph.add_link(OutputRef::new(source, 0), InputRef::new(p, 0));
        graph.add_link(OutputRef::new(p, 0), InputRef::new(a, 1));
        graph.add_link(OutputRef::new(p, 0), InputRef::new(b, 1));

        resolve_proxies(&mut graph);

        for sink in [a, b] {
            let link = graph.input_link(InputRef::new(sink, 1)).unwrap();
            assert_eq!(link.from, OutputRef::new(source, 0));
        }
    }
}
