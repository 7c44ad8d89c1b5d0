//! Equal-operation merging.

use std::collections::HashMap;

use crate::graph::{InputRef, OperationGraph, OperationId, OperationKind, OutputRef};

/// Key under which two operations count as equal: same kind (settings
/// included) and the same resolved incoming link per input.
#[derive(PartialEq, Eq, Hash)]
struct MergeKey {
    kind: OperationKind,
    sources: Vec<Option<OutputRef>>,
}

/// Merge operations that are equal: redirect all of the duplicate's
/// outputs to the first-seen twin and drop the duplicate. A pure size
/// optimization — operations with observable side effects (viewer,
/// preview, outputs, buffers) are never merge-eligible. Runs to fixpoint
/// so merging two sources can make their consumers equal in turn.
pub fn merge_equal_operations(graph: &mut OperationGraph) {
    loop {
        let mut merged = false;
        let mut seen: HashMap<MergeKey, OperationId> = HashMap::new();
        let ids: Vec<OperationId> = graph.ids().collect();
        for id in ids {
            let op = graph.operation(id);
            if op.kind().has_side_effects() {
                continue;
            }
            let key = MergeKey {
                kind: op.kind().clone(),
                sources: (0..op.inputs().len())
                    .map(|index| {
                        graph
                            .input_link(InputRef::new(id, index))
                            .map(|link| link.from)
                    })
                    .collect(),
            };
            match seen.get(&key) {
                Some(&into) => {
                    merge_into(graph, id, into);
                    merged = true;
                }
                None => {
                    seen.insert(key, id);
                }
            }
        }
        if !merged {
            break;
        }
    }
}

fn merge_into(graph: &mut OperationGraph, from: OperationId, into: OperationId) {
    log::debug!("merging {} into {}", from, into);
    let output_count = graph.operation(from).outputs().len();
    for index in 0..output_count {
        graph.relink_output(OutputRef::new(from, index), OutputRef::new(into, index));
    }
    graph.remove_operation(from);
}
