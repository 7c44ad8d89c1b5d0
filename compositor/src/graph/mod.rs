//! Operation graph — the shared IR every compile stage operates on.
//!
//! Operations live in an arena indexed by [`OperationId`]; pruning leaves
//! tombstones so ids stay stable across the whole build. Links are owned
//! by the graph, never by the operations they connect.

pub mod dump;
pub mod operation;

pub use operation::{
    Complexity, ConstantValue, DataType, InputRef, MathOp, MixMode, Operation, OperationId,
    OperationInput, OperationKind, OperationOutput, OutputRef,
};

use crate::error::CompositorError;

/// A directed data dependency from an output socket to an input socket.
///
/// Invariant: every input appears in at most one link as destination; an
/// output may appear in many links as source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub from: OutputRef,
    pub to: InputRef,
}

/// Compile-pipeline phase. Stages advance the phase strictly in order;
/// running a stage out of order is an internal error, not a recoverable
/// condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Empty,
    Built,
    Legalized,
    Pruned,
    Sorted,
    Grouped,
}

impl Phase {
    fn next(self) -> Option<Phase> {
        match self {
            Phase::Empty => Some(Phase::Built),
            Phase::Built => Some(Phase::Legalized),
            Phase::Legalized => Some(Phase::Pruned),
            Phase::Pruned => Some(Phase::Sorted),
            Phase::Sorted => Some(Phase::Grouped),
            Phase::Grouped => None,
        }
    }
}

/// The execution graph under construction.
///
/// Created once per compositor evaluation, mutated in place by the
/// legalizer and pruner, then frozen inside an
/// [`ExecutionPlan`](crate::schedule::ExecutionPlan). Construction is
/// single-threaded; the graph owns exclusive access to its state for the
/// duration of the build.
pub struct OperationGraph {
    ops: Vec<Option<Operation>>,
    links: Vec<Link>,
    active_viewer: Option<OperationId>,
    phase: Phase,
}

impl OperationGraph {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            links: Vec::new(),
            active_viewer: None,
            phase: Phase::Empty,
        }
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Append an operation, deriving its sockets and complexity from the
    /// kind. Returns its stable identity.
    pub fn add_operation(&mut self, kind: OperationKind) -> OperationId {
        let id = OperationId(self.ops.len());
        self.ops.push(Some(Operation::new(id, kind)));
        id
    }

    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.ops.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Look up a live operation. Panics on a pruned or unknown id; use
    /// [`get`](Self::get) when liveness is in question.
    pub fn operation(&self, id: OperationId) -> &Operation {
        self.get(id)
            .unwrap_or_else(|| panic!("{} is not a live operation", id))
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live operations.
    pub fn operation_count(&self) -> usize {
        self.ops.iter().filter(|slot| slot.is_some()).count()
    }

    /// Ids of live operations, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.ops
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| OperationId(i)))
    }

    /// Live operations, in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter().filter_map(|slot| slot.as_ref())
    }

    /// Tombstone an operation and drop every link touching it.
    pub fn remove_operation(&mut self, id: OperationId) {
        if self.ops.get(id.0).map(|s| s.is_some()) != Some(true) {
            return;
        }
        self.ops[id.0] = None;
        self.links
            .retain(|link| link.from.op != id && link.to.op != id);
        if self.active_viewer == Some(id) {
            self.active_viewer = None;
        }
    }

    pub(crate) fn set_input_default(&mut self, input: InputRef, default: Option<ConstantValue>) {
        if let Some(slot) = self.ops.get_mut(input.op.0)
            && let Some(op) = slot.as_mut()
        {
            op.input_mut(input.index).default = default;
        }
    }

    // -----------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------

    /// Connect an output to an input. An existing link into the same
    /// input is replaced: last write wins, preserving the single-
    /// incoming-link invariant.
    pub fn add_link(&mut self, from: OutputRef, to: InputRef) {
        debug_assert!(from.index < self.operation(from.op).outputs().len());
        debug_assert!(to.index < self.operation(to.op).inputs().len());
        self.links.retain(|link| link.to != to);
        self.links.push(Link { from, to });
    }

    /// Clear an input's incoming link. Not an error if none exists.
    pub fn remove_input_link(&mut self, to: InputRef) {
        self.links.retain(|link| link.to != to);
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The single incoming link of an input, if any.
    pub fn input_link(&self, to: InputRef) -> Option<Link> {
        self.links.iter().copied().find(|link| link.to == to)
    }

    /// All links fanning out from one output socket.
    pub fn output_links(&self, from: OutputRef) -> Vec<Link> {
        self.links
            .iter()
            .copied()
            .filter(|link| link.from == from)
            .collect()
    }

    /// All links into any input of an operation.
    pub fn links_into(&self, op: OperationId) -> Vec<Link> {
        self.links
            .iter()
            .copied()
            .filter(|link| link.to.op == op)
            .collect()
    }

    /// All links out of any output of an operation.
    pub fn links_from(&self, op: OperationId) -> Vec<Link> {
        self.links
            .iter()
            .copied()
            .filter(|link| link.from.op == op)
            .collect()
    }

    /// Redirect every consumer of `old` to `new`. Used by proxy
    /// resolution and equal-operation merging.
    pub(crate) fn relink_output(&mut self, old: OutputRef, new: OutputRef) {
        for link in &mut self.links {
            if link.from == old {
                link.from = new;
            }
        }
    }

    pub fn output_type(&self, output: OutputRef) -> DataType {
        self.operation(output.op).outputs()[output.index].data_type
    }

    pub fn input_type(&self, input: InputRef) -> DataType {
        self.operation(input.op).inputs()[input.index].data_type
    }

    /// Replace a foldable single-output operation with a constant,
    /// redirecting all of its consumers. Returns the constant's id.
    pub fn replace_operation_with_constant(
        &mut self,
        id: OperationId,
        value: ConstantValue,
    ) -> OperationId {
        let constant = self.add_operation(OperationKind::Constant(value));
        let output_count = self.operation(id).outputs().len();
        for index in 0..output_count {
            self.relink_output(OutputRef::new(id, index), OutputRef::new(constant, 0));
        }
        self.remove_operation(id);
        constant
    }

    // -----------------------------------------------------------------
    // Viewer
    // -----------------------------------------------------------------

    /// Register the operation writing to the viewer image. Only one
    /// operation can occupy this place per build; a second registration
    /// is ignored so two operations never race for the display buffer.
    pub fn register_viewer(&mut self, id: OperationId) {
        if self.active_viewer.is_none() {
            self.active_viewer = Some(id);
        } else {
            log::debug!("viewer {} ignored, another viewer is active", id);
        }
    }

    pub fn active_viewer(&self) -> Option<OperationId> {
        self.active_viewer
    }

    // -----------------------------------------------------------------
    // Phase
    // -----------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn expect_phase(&self, phase: Phase) -> Result<(), CompositorError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(CompositorError::internal(format!(
                "expected graph phase {:?}, found {:?}",
                phase, self.phase
            )))
        }
    }

    pub(crate) fn advance_phase(&mut self, phase: Phase) -> Result<(), CompositorError> {
        if self.phase.next() == Some(phase) {
            self.phase = phase;
            Ok(())
        } else {
            Err(CompositorError::internal(format!(
                "cannot advance graph phase {:?} -> {:?}",
                self.phase, phase
            )))
        }
    }
}

impl Default for OperationGraph {
    fn default() -> Self {
        Self::new()
    }
}
