//! Scheduler — prune, sort, and partition the legalized graph into
//! execution groups the tile engine can run.

mod group;
mod prune;
mod sort;

pub use group::{ExecutionGroup, GroupId, group_operations};
pub use prune::prune_operations;
pub use sort::sort_operations;

use crate::context::BuildContext;
use crate::error::CompositorError;
use crate::graph::{OperationGraph, OperationId, Phase};

/// The immutable result of a compile: the frozen graph, its topological
/// order and the execution groups derived from it.
///
/// Hand-off to the execution engine is build-once/read-many; nothing
/// here mutates after construction, so the plan can be shared across
/// worker threads freely.
pub struct ExecutionPlan {
    graph: OperationGraph,
    sorted: Vec<OperationId>,
    groups: Vec<ExecutionGroup>,
}

impl ExecutionPlan {
    pub fn graph(&self) -> &OperationGraph {
        &self.graph
    }

    /// Surviving operations in dependency order: for every link, the
    /// source appears before the destination.
    pub fn sorted(&self) -> &[OperationId] {
        &self.sorted
    }

    pub fn groups(&self) -> &[ExecutionGroup] {
        &self.groups
    }
}

/// Run the scheduling stages over a legalized graph.
pub fn plan(
    mut graph: OperationGraph,
    context: &BuildContext,
) -> Result<ExecutionPlan, CompositorError> {
    graph.expect_phase(Phase::Legalized)?;

    prune_operations(&mut graph, context);
    graph.advance_phase(Phase::Pruned)?;

    let sorted = sort_operations(&graph)?;
    graph.advance_phase(Phase::Sorted)?;

    let groups = group_operations(&graph, &sorted);
    graph.advance_phase(Phase::Grouped)?;

    Ok(ExecutionPlan {
        graph,
        sorted,
        groups,
    })
}
