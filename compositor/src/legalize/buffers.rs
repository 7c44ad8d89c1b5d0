//! Buffer insertion around complex operations.
//!
//! A complex operation needs its full input buffers materialized before
//! it can start, so every one of its linked inputs is fed through a
//! write-buffer/read-buffer pair, and every consumer of its outputs
//! reads through one as well. The write→read link is a real graph link,
//! which is what later turns into a group boundary.

use crate::graph::{InputRef, OperationGraph, OperationId, OperationKind, OutputRef};

/// Isolate every complex operation behind buffer seams.
pub fn insert_complex_buffers(graph: &mut OperationGraph) {
    let complex: Vec<OperationId> = graph
        .ids()
        .filter(|&id| graph.operation(id).is_complex())
        .collect();

    for id in complex {
        for index in 0..graph.operation(id).inputs().len() {
            add_input_buffers(graph, InputRef::new(id, index));
        }
        for index in 0..graph.operation(id).outputs().len() {
            add_output_buffers(graph, OutputRef::new(id, index));
        }
    }
}

/// The write-buffer already attached to an output, if any. Reusing it on
/// fan-out keeps one full-frame buffer per output no matter how many
/// consumers read it.
pub fn find_attached_write_buffer_operation(
    graph: &OperationGraph,
    output: OutputRef,
) -> Option<OperationId> {
    graph
        .output_links(output)
        .iter()
        .find(|link| graph.operation(link.to.op).kind().is_write_buffer())
        .map(|link| link.to.op)
}

fn add_input_buffers(graph: &mut OperationGraph, input: InputRef) {
    let Some(link) = graph.input_link(input) else {
        return;
    };
    if graph.operation(link.from.op).kind().is_read_buffer() {
        return;
    }
    let data_type = graph.output_type(link.from);
    let write = find_attached_write_buffer_operation(graph, link.from).unwrap_or_else(|| {
        let write = graph.add_operation(OperationKind::WriteBuffer(data_type));
        graph.add_link(link.from, InputRef::new(write, 0));
        write
    });
    let read = graph.add_operation(OperationKind::ReadBuffer(data_type));
    graph.add_link(OutputRef::new(write, 0), InputRef::new(read, 0));
    graph.remove_input_link(input);
    graph.add_link(OutputRef::new(read, 0), input);
}

fn add_output_buffers(graph: &mut OperationGraph, output: OutputRef) {
    // Cache consumers first; buffer operations inserted below would
    // otherwise show up as consumers themselves.
    let consumers: Vec<InputRef> = graph
        .output_links(output)
        .iter()
        .map(|link| link.to)
        .filter(|to| !graph.operation(to.op).kind().is_buffer())
        .collect();
    if consumers.is_empty() {
        return;
    }
    let data_type = graph.output_type(output);
    let write = find_attached_write_buffer_operation(graph, output).unwrap_or_else(|| {
        let write = graph.add_operation(OperationKind::WriteBuffer(data_type));
        graph.add_link(output, InputRef::new(write, 0));
        write
    });
    for consumer in consumers {
        let read = graph.add_operation(OperationKind::ReadBuffer(data_type));
        graph.add_link(OutputRef::new(write, 0), InputRef::new(read, 0));
        graph.remove_input_link(consumer);
        graph.add_link(OutputRef::new(read, 0), consumer);
    }
}
