//! Dead-operation elimination.

use std::collections::{HashSet, VecDeque};

use crate::context::{BuildContext, ExecutionModel};
use crate::graph::{OperationGraph, OperationId, OperationKind};

/// Remove every operation not reachable by following links backward from
/// the requested outputs: the active viewer and previews for viewport
/// builds, composite and file outputs for renders.
///
/// Runs after legalization so conversion/buffer insertions whose
/// consumer died are swept up too.
pub fn prune_operations(graph: &mut OperationGraph, context: &BuildContext) {
    let roots: Vec<OperationId> = graph
        .ids()
        .filter(|&id| is_requested_output(graph, context, id))
        .collect();
    if roots.is_empty() {
        log::debug!("no requested outputs, pruning entire graph");
    }

    let mut reachable: HashSet<OperationId> = HashSet::new();
    let mut queue: VecDeque<OperationId> = roots.into();
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        for link in graph.links_into(id) {
            queue.push_back(link.from.op);
        }
    }

    let dead: Vec<OperationId> = graph.ids().filter(|id| !reachable.contains(id)).collect();
    for id in dead {
        log::debug!("pruning unreachable operation {}", id);
        graph.remove_operation(id);
    }
}

/// Whether an operation is one of the outputs this build was asked for.
fn is_requested_output(graph: &OperationGraph, context: &BuildContext, id: OperationId) -> bool {
    match graph.operation(id).kind() {
        OperationKind::Viewer => {
            context.model == ExecutionModel::Viewport && graph.active_viewer() == Some(id)
        }
        OperationKind::Preview => context.model == ExecutionModel::Viewport,
        OperationKind::CompositeOutput | OperationKind::FileOutput { .. } => context.is_rendering(),
        _ => false,
    }
}
