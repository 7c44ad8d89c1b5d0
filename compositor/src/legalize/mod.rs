//! Legalizer — rewrites the built graph until every link is executable.
//!
//! Passes run in a fixed order; later passes assume earlier ones
//! completed. Conversion insertion is the only pass that is safe to run
//! again on an already-legalized graph (it finds nothing to do).

mod buffers;
mod constants;
mod conversions;
mod merge;
mod proxies;

pub use buffers::{find_attached_write_buffer_operation, insert_complex_buffers};
pub use constants::{fold_constant_operations, fold_unconnected_inputs};
pub use conversions::insert_conversions;
pub use merge::merge_equal_operations;
pub use proxies::resolve_proxies;

use crate::error::CompositorError;
use crate::graph::{OperationGraph, Phase};

/// Run all legalization passes in order.
pub fn run(graph: &mut OperationGraph) -> Result<(), CompositorError> {
    graph.expect_phase(Phase::Built)?;

    insert_conversions(graph);
    fold_unconnected_inputs(graph);
    fold_constant_operations(graph);
    resolve_proxies(graph);
    insert_complex_buffers(graph);
    merge_equal_operations(graph);

    graph.advance_phase(Phase::Legalized)
}
