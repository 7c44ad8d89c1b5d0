//! Topological ordering of the pruned graph.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::CompositorError;
use crate::graph::{OperationGraph, OperationId};

/// Order operations so that every link's source precedes its
/// destination. Ties are broken by operation id, which follows insertion
/// order, so the result is stable across runs of the same tree.
///
/// A cycle here means a legalization pass miswired the graph; node trees
/// themselves cannot express one.
pub fn sort_operations(graph: &OperationGraph) -> Result<Vec<OperationId>, CompositorError> {
    let mut in_degree: HashMap<OperationId, usize> =
        graph.ids().map(|id| (id, 0)).collect();
    for link in graph.links() {
        *in_degree.get_mut(&link.to.op).ok_or_else(|| {
            CompositorError::internal(format!("link into unknown operation {}", link.to.op))
        })? += 1;
    }

    let mut ready: BinaryHeap<Reverse<OperationId>> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| Reverse(id))
        .collect();

    let mut sorted = Vec::with_capacity(graph.operation_count());
    while let Some(Reverse(id)) = ready.pop() {
        sorted.push(id);
        for link in graph.links_from(id) {
            let degree = in_degree
                .get_mut(&link.to.op)
                .ok_or_else(|| CompositorError::internal("in-degree table out of sync"))?;
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(link.to.op));
            }
        }
    }

    if sorted.len() != graph.operation_count() {
        return Err(CompositorError::internal(format!(
            "operation graph has a cycle, sorted {} of {} operations",
            sorted.len(),
            graph.operation_count()
        )));
    }
    Ok(sorted)
}
