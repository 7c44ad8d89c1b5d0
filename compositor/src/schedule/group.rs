//! Partitioning the sorted graph into execution groups.
//!
//! Each group is the set of operations a single output needs evaluated
//! together. Read-buffer seams end a group's backward walk and become
//! dependency edges instead, so a group only starts once the groups
//! filling its input buffers have finished.

use std::collections::HashMap;

use crate::graph::{InputRef, OperationGraph, OperationId, OperationKind};

/// Stable handle for an execution group, numbered along topological
/// order of the groups' output operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(crate) usize);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group{}", self.0)
    }
}

/// A unit of schedulable work: one output operation plus everything it
/// needs, minus work delegated to the groups it depends on.
pub struct ExecutionGroup {
    id: GroupId,
    operations: Vec<OperationId>,
    output_operation: OperationId,
    depends_on: Vec<GroupId>,
}

impl ExecutionGroup {
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Member operations in topological order.
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    /// The output this group exists to produce.
    pub fn output_operation(&self) -> OperationId {
        self.output_operation
    }

    /// Groups that must complete before this one starts.
    pub fn depends_on(&self) -> &[GroupId] {
        &self.depends_on
    }
}

/// Whether an operation seeds its own group.
fn is_group_output(kind: &OperationKind) -> bool {
    matches!(
        kind,
        OperationKind::Viewer
            | OperationKind::Preview
            | OperationKind::CompositeOutput
            | OperationKind::FileOutput { .. }
            | OperationKind::WriteBuffer(_)
    )
}

/// Partition the graph into execution groups. Every surviving operation
/// lands in exactly one group; groups come out ordered so that each one
/// only depends on groups before it.
///
/// Panics on a malformed graph (a read buffer whose write buffer was
/// never grouped, or cyclic group dependencies). Neither can arise from
/// a legalized acyclic graph, so hitting one is a pipeline bug worth
/// aborting on rather than handing to the execution engine.
pub fn group_operations(graph: &OperationGraph, sorted: &[OperationId]) -> Vec<ExecutionGroup> {
    let topo_position: HashMap<OperationId, usize> = sorted
        .iter()
        .enumerate()
        .map(|(position, &id)| (id, position))
        .collect();

    let mut assignment: HashMap<OperationId, GroupId> = HashMap::new();
    let mut groups: Vec<ExecutionGroup> = Vec::new();

    // Seeding in topological order guarantees a write buffer's group
    // exists by the time a read buffer of that seam is visited.
    let seeds = sorted
        .iter()
        .copied()
        .filter(|&id| is_group_output(graph.operation(id).kind()));

    for seed in seeds {
        let id = GroupId(groups.len());
        let mut members: Vec<OperationId> = Vec::new();
        let mut depends_on: Vec<GroupId> = Vec::new();
        let mut pending = vec![seed];

        while let Some(op) = pending.pop() {
            if let Some(&owner) = assignment.get(&op) {
                if owner != id {
                    depends_on.push(owner);
                }
                continue;
            }
            assignment.insert(op, id);
            members.push(op);

            if graph.operation(op).kind().is_read_buffer() {
                if let Some(link) = graph.input_link(InputRef::new(op, 0)) {
                    match assignment.get(&link.from.op) {
                        Some(&owner) => depends_on.push(owner),
                        None => panic!(
                            "read buffer {} grouped before its write buffer {}",
                            op, link.from.op
                        ),
                    }
                }
                continue;
            }
            for link in graph.links_into(op) {
                pending.push(link.from.op);
            }
        }

        members.sort_by_key(|op| topo_position[op]);
        depends_on.sort();
        depends_on.dedup();

        groups.push(ExecutionGroup {
            id,
            operations: members,
            output_operation: seed,
            depends_on,
        });
    }

    verify_acyclic(&groups);
    groups
}

fn verify_acyclic(groups: &[ExecutionGroup]) {
    for group in groups {
        for &dep in &group.depends_on {
            if dep >= group.id {
                panic!("execution groups form a cycle at {}", group.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConstantValue, DataType, OutputRef};
    use crate::schedule::sort_operations;

    fn link(graph: &mut OperationGraph, from: OperationId, to: OperationId, input: usize) {
        graph.add_link(OutputRef::new(from, 0), InputRef::new(to, input));
    }

    #[test]
    fn test_simple_graph_is_one_group() {
        let mut graph = OperationGraph::new();
        let source = graph.add_operation(OperationKind::Constant(ConstantValue::color(
            0.3, 0.3, 0.3, 1.0,
        )));
        let invert = graph.add_operation(OperationKind::Invert);
        let viewer = graph.add_operation(OperationKind::Viewer);
        link(&mut graph, source, invert, 1);
        link(&mut graph, invert, viewer, 0);

        let sorted = sort_operations(&graph).unwrap();
        let groups = group_operations(&graph, &sorted);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].operations(), &[source, invert, viewer]);
        assert_eq!(groups[0].output_operation(), viewer);
        assert!(groups[0].depends_on().is_empty());
    }

    #[test]
    fn test_buffer_seams_split_groups() {
        // source -> write -> read -> invert -> viewer
        let mut graph = OperationGraph::new();
        let source = graph.add_operation(OperationKind::Constant(ConstantValue::color(
            0.3, 0.3, 0.3, 1.0,
        )));
        let write = graph.add_operation(OperationKind::WriteBuffer(DataType::Color));
        let read = graph.add_operation(OperationKind::ReadBuffer(DataType::Color));
        let invert = graph.add_operation(OperationKind::Invert);
        let viewer = graph.add_operation(OperationKind::Viewer);
        link(&mut graph, source, write, 0);
        link(&mut graph, write, read, 0);
        link(&mut graph, read, invert, 1);
        link(&mut graph, invert, viewer, 0);

        let sorted = sort_operations(&graph).unwrap();
        let groups = group_operations(&graph, &sorted);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].operations(), &[source, write]);
        assert_eq!(groups[1].operations(), &[read, invert, viewer]);
        assert_eq!(groups[1].depends_on(), &[groups[0].id()]);
    }

    #[test]
    fn test_shared_operation_becomes_dependency_edge() {
        // One source feeding two render outputs; the source belongs to
        // the first group and the second depends on it.
        let mut graph = OperationGraph::new();
        let source = graph.add_operation(OperationKind::Constant(ConstantValue::color(
            0.3, 0.3, 0.3, 1.0,
        )));
        let composite = graph.add_operation(OperationKind::CompositeOutput);
        let file = graph.add_operation(OperationKind::FileOutput {
            path: "/tmp/out.png".into(),
        });
        link(&mut graph, source, composite, 0);
        link(&mut graph, source, file, 0);

        let sorted = sort_operations(&graph).unwrap();
        let groups = group_operations(&graph, &sorted);

        assert_eq!(groups.len(), 2);
        assert!(groups[0].operations().contains(&source));
        assert_eq!(groups[1].operations(), &[file]);
        assert_eq!(groups[1].depends_on(), &[groups[0].id()]);
    }

    #[test]
    fn test_every_operation_grouped_exactly_once() {
        let mut graph = OperationGraph::new();
        let source = graph.add_operation(OperationKind::Constant(ConstantValue::color(
            0.3, 0.3, 0.3, 1.0,
        )));
        let write = graph.add_operation(OperationKind::WriteBuffer(DataType::Color));
        let r1 = graph.add_operation(OperationKind::ReadBuffer(DataType::Color));
        let r2 = graph.add_operation(OperationKind::ReadBuffer(DataType::Color));
        let composite = graph.add_operation(OperationKind::CompositeOutput);
        let file = graph.add_operation(OperationKind::FileOutput {
            path: "/tmp/out.png".into(),
        });
        link(&mut graph, source, write, 0);
        link(&mut graph, write, r1, 0);
        link(&mut graph, write, r2, 0);
        link(&mut graph, r1, composite, 0);
        link(&mut graph, r2, file, 0);

        let sorted = sort_operations(&graph).unwrap();
        let groups = group_operations(&graph, &sorted);

        let mut grouped: Vec<OperationId> = groups
            .iter()
            .flat_map(|group| group.operations().iter().copied())
            .collect();
        grouped.sort();
        let mut all: Vec<OperationId> = graph.ids().collect();
        all.sort();
        assert_eq!(grouped, all);
    }
}
