//! Compositor graph compiler.
//!
//! Turns a node tree, as authored in the editor, into an execution plan:
//! the tree is lowered into an operation graph, legalized (type
//! conversions, constant folding, proxy removal, buffer seams around
//! complex operations, duplicate merging), pruned to the outputs the
//! build context requests, topologically sorted and partitioned into
//! execution groups.

pub mod build;
pub mod context;
pub mod error;
pub mod graph;
pub mod legalize;
pub mod nodes;
pub mod schedule;

pub use build::GraphBuilder;
pub use context::{BuildContext, ExecutionModel};
pub use error::CompositorError;
pub use graph::OperationGraph;
pub use nodes::NodeTree;
pub use schedule::ExecutionPlan;

/// Run the full pipeline over a node tree.
pub fn compile(
    tree: &NodeTree,
    context: &BuildContext,
) -> Result<ExecutionPlan, CompositorError> {
    let mut graph = GraphBuilder::new(tree, context).build()?;
    legalize::run(&mut graph)?;
    schedule::plan(graph, context)
}
