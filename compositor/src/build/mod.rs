//! Builder — lowers the user node tree into an operation graph.
//!
//! Lowering happens in two passes: every node is lowered to operations
//! (recording how node sockets map to operation sockets), then node
//! links are resolved through those maps into operation links. A node
//! the builder cannot lower is skipped with a warning and the rest of
//! the graph still builds; its downstream inputs are simply left
//! unconnected for the legalizer's constant folding to pick up.

mod lowering;

use std::collections::HashMap;

use crate::context::BuildContext;
use crate::error::CompositorError;
use crate::graph::{
    ConstantValue, InputRef, OperationGraph, OperationId, OperationKind, OutputRef, Phase,
};
use crate::nodes::{Node, NodeTree, PinId};

/// Builds an [`OperationGraph`] from a [`NodeTree`].
///
/// One builder per evaluation request; [`build`](GraphBuilder::build)
/// consumes it and hands the populated graph to the legalizer.
pub struct GraphBuilder<'a> {
    tree: &'a NodeTree,
    context: &'a BuildContext,
    graph: OperationGraph,
    /// Node input socket -> the operation inputs it lowers to. A node
    /// may lower to multiple operations, so one socket can map to
    /// several inputs.
    input_map: HashMap<PinId, Vec<InputRef>>,
    /// Node output socket -> the operation output it lowers to.
    output_map: HashMap<PinId, OutputRef>,
    /// Node input sockets whose upstream output should get a preview,
    /// resolved after link connection.
    preview_requests: Vec<PinId>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(tree: &'a NodeTree, context: &'a BuildContext) -> Self {
        Self {
            tree,
            context,
            graph: OperationGraph::new(),
            input_map: HashMap::new(),
            output_map: HashMap::new(),
            preview_requests: Vec::new(),
        }
    }

    pub fn context(&self) -> &BuildContext {
        self.context
    }

    /// Lower every node, connect the socket links, insert previews.
    pub fn build(mut self) -> Result<OperationGraph, CompositorError> {
        self.graph.expect_phase(Phase::Empty)?;

        let tree = self.tree;
        for node in &tree.nodes {
            lowering::lower_node(&mut self, node);
        }
        self.connect_socket_links();
        self.insert_previews();

        self.graph.advance_phase(Phase::Built)?;
        Ok(self.graph)
    }

    // -----------------------------------------------------------------
    // Lowering API, used by per-node lowering functions
    // -----------------------------------------------------------------

    /// Append an operation and return its stable identity.
    pub fn add_operation(&mut self, kind: OperationKind) -> OperationId {
        self.graph.add_operation(kind)
    }

    /// Record that a node input socket lowers to an operation input, and
    /// carry the socket's declared default onto that input so constant
    /// folding can resolve it if nothing connects.
    pub fn map_input_socket(&mut self, node: &Node, socket: &str, input: InputRef) {
        match node.input_socket(socket) {
            Some(def) => self.graph.set_input_default(input, def.default),
            None => log::warn!("node {} has no input socket '{}'", node.id, socket),
        }
        self.input_map
            .entry(PinId::new(node.id, socket))
            .or_default()
            .push(input);
    }

    /// Record that a node output socket lowers to an operation output.
    pub fn map_output_socket(&mut self, node: &Node, socket: &str, output: OutputRef) {
        if node.output_socket(socket).is_none() {
            log::warn!("node {} has no output socket '{}'", node.id, socket);
        }
        self.output_map.insert(PinId::new(node.id, socket), output);
    }

    /// Connect two operation sockets. Replaces an existing link into the
    /// destination input (last write wins).
    pub fn add_link(&mut self, from: OutputRef, to: InputRef) {
        self.graph.add_link(from, to);
    }

    /// Clear an input's incoming link. Not an error if none exists.
    pub fn remove_input_link(&mut self, to: InputRef) {
        self.graph.remove_input_link(to);
    }

    /// Shorthand for a constant operation wired into an input. Used by
    /// lowerings that bake node settings into operation inputs.
    pub fn add_input_constant(&mut self, value: ConstantValue, to: InputRef) -> OperationId {
        let constant = self.add_operation(OperationKind::Constant(value));
        self.add_link(OutputRef::new(constant, 0), to);
        constant
    }

    /// Replace a lowered operation with a constant, redirecting its
    /// consumers.
    pub fn replace_operation_with_constant(
        &mut self,
        id: OperationId,
        value: ConstantValue,
    ) -> OperationId {
        self.graph.replace_operation_with_constant(id, value)
    }

    /// Register the active viewer. First registration wins; later ones
    /// are ignored.
    pub fn register_viewer(&mut self, id: OperationId) {
        self.graph.register_viewer(id);
    }

    pub fn active_viewer(&self) -> Option<OperationId> {
        self.graph.active_viewer()
    }

    /// Attach a preview operation to an operation output. A second
    /// preview on the same output is skipped.
    pub fn add_preview(&mut self, output: OutputRef) {
        let already = self
            .graph
            .output_links(output)
            .iter()
            .any(|link| self.graph.operation(link.to.op).kind() == &OperationKind::Preview);
        if already {
            return;
        }
        let preview = self.graph.add_operation(OperationKind::Preview);
        self.graph.add_link(output, InputRef::new(preview, 0));
    }

    /// Request a preview of whatever feeds a node input socket. Resolved
    /// after all nodes have lowered, since the upstream node may not
    /// have been mapped yet.
    pub fn add_node_input_preview(&mut self, pin: PinId) {
        self.preview_requests.push(pin);
    }

    // -----------------------------------------------------------------
    // Link resolution
    // -----------------------------------------------------------------

    fn connect_socket_links(&mut self) {
        for link in &self.tree.links {
            let Some(&from) = self.output_map.get(&link.from) else {
                // Source node was skipped or the socket never mapped;
                // the destination stays unconnected and gets a constant.
                log::debug!(
                    "socket {}.{} is not mapped, leaving {}.{} unconnected",
                    link.from.node_id,
                    link.from.socket,
                    link.to.node_id,
                    link.to.socket
                );
                continue;
            };
            let Some(inputs) = self.input_map.get(&link.to) else {
                continue;
            };
            for &to in inputs {
                self.graph.add_link(from, to);
            }
        }
    }

    fn insert_previews(&mut self) {
        let requests = std::mem::take(&mut self.preview_requests);
        for pin in requests {
            let Some(node_link) = self.tree.input_link(&pin) else {
                continue;
            };
            let Some(&from) = self.output_map.get(&node_link.from) else {
                continue;
            };
            self.add_preview(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MathOp;
    use crate::nodes::NodeKind;

    fn viewport() -> BuildContext {
        BuildContext::viewport()
    }

    #[test]
    fn test_build_simple_chain() {
        let mut tree = NodeTree::new();
        let rgb = tree.add_node(NodeKind::Rgb {
            color: [0.2, 0.4, 0.6, 1.0],
        });
        let invert = tree.add_node(NodeKind::Invert);
        let viewer = tree.add_node(NodeKind::Viewer);
        tree.connect(PinId::new(rgb, "color"), PinId::new(invert, "color"));
        tree.connect(PinId::new(invert, "image"), PinId::new(viewer, "image"));

        let ctx = viewport().with_previews(false);
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        assert_eq!(graph.phase(), Phase::Built);
        assert_eq!(graph.operation_count(), 3);
        assert_eq!(graph.links().len(), 2);
        assert!(graph.active_viewer().is_some());
    }

    #[test]
    fn test_unknown_node_is_skipped_not_fatal() {
        let mut tree = NodeTree::new();
        let unknown = tree.add_node(NodeKind::Unknown);
        let viewer = tree.add_node(NodeKind::Viewer);
        tree.connect(PinId::new(unknown, "image"), PinId::new(viewer, "image"));

        let ctx = viewport().with_previews(false);
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        // Only the viewer lowered; its image input stays unconnected.
        assert_eq!(graph.operation_count(), 1);
        assert!(graph.links().is_empty());
    }

    #[test]
    fn test_defaults_carried_onto_operation_inputs() {
        let mut tree = NodeTree::new();
        tree.add_node(NodeKind::Math {
            operation: MathOp::Add,
        });

        let ctx = viewport();
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        let math = graph.operations().next().unwrap();
        assert_eq!(math.inputs()[0].default, Some(ConstantValue::value(0.5)));
        assert_eq!(math.inputs()[1].default, Some(ConstantValue::value(0.5)));
    }

    #[test]
    fn test_viewer_preview_inserted_in_viewport() {
        let mut tree = NodeTree::new();
        let rgb = tree.add_node(NodeKind::Rgb {
            color: [1.0, 1.0, 1.0, 1.0],
        });
        let viewer = tree.add_node(NodeKind::Viewer);
        tree.connect(PinId::new(rgb, "color"), PinId::new(viewer, "image"));

        let ctx = viewport();
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        let previews = graph
            .operations()
            .filter(|op| op.kind() == &OperationKind::Preview)
            .count();
        assert_eq!(previews, 1);
    }

    #[test]
    fn test_drop_shadow_lowers_to_multiple_operations() {
        let mut tree = NodeTree::new();
        let shadow = tree.add_node(NodeKind::DropShadow {
            size: 4.0,
            offset_x: 2.0,
            offset_y: -2.0,
        });
        let viewer = tree.add_node(NodeKind::Viewer);
        tree.connect(PinId::new(shadow, "image"), PinId::new(viewer, "image"));

        let ctx = viewport().with_previews(false);
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        let blurs = graph
            .operations()
            .filter(|op| matches!(op.kind(), OperationKind::Blur { .. }))
            .count();
        let mixes = graph
            .operations()
            .filter(|op| matches!(op.kind(), OperationKind::Mix(_)))
            .count();
        assert_eq!(blurs, 1);
        assert_eq!(mixes, 1);
        assert!(graph.operation_count() > 3);
    }

    #[test]
    fn test_switch_maps_selected_input_only() {
        let mut tree = NodeTree::new();
        let off_rgb = tree.add_node(NodeKind::Rgb {
            color: [0.0, 0.0, 0.0, 1.0],
        });
        let on_rgb = tree.add_node(NodeKind::Rgb {
            color: [1.0, 1.0, 1.0, 1.0],
        });
        let switch = tree.add_node(NodeKind::Switch { on: true });
        let viewer = tree.add_node(NodeKind::Viewer);
        tree.connect(PinId::new(off_rgb, "color"), PinId::new(switch, "off"));
        tree.connect(PinId::new(on_rgb, "color"), PinId::new(switch, "on"));
        tree.connect(PinId::new(switch, "image"), PinId::new(viewer, "image"));

        let ctx = viewport().with_previews(false);
        let graph = GraphBuilder::new(&tree, &ctx).build().unwrap();

        // The proxy has exactly one incoming link, from the "on" source.
        let proxy = graph
            .operations()
            .find(|op| op.kind().is_proxy())
            .expect("proxy operation");
        let link = graph
            .input_link(InputRef::new(proxy.id(), 0))
            .expect("proxy input link");
        let source = graph.operation(link.from.op);
        assert_eq!(
            source.kind(),
            &OperationKind::Constant(ConstantValue::color(1.0, 1.0, 1.0, 1.0))
        );
    }
}
