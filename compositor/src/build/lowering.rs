//! Per-node lowering — one arm per node kind.
//!
//! Dispatch is resolved once at build time by matching on the kind tag.
//! A kind with no arm here never aborts the build: it is skipped and its
//! downstream inputs fall back to constants.

use ordered_float::OrderedFloat;

use crate::graph::{ConstantValue, DataType, InputRef, MixMode, OperationKind, OutputRef};
use crate::nodes::{Node, NodeKind, PinId};

use super::GraphBuilder;

pub(super) fn lower_node(b: &mut GraphBuilder<'_>, node: &Node) {
    match &node.kind {
        NodeKind::Value { value } => {
            let op = b.add_operation(OperationKind::Constant(ConstantValue::value(*value)));
            b.map_output_socket(node, "value", OutputRef::new(op, 0));
        }
        NodeKind::Rgb { color } => {
            let [r, g, bl, a] = *color;
            let op = b.add_operation(OperationKind::Constant(ConstantValue::color(r, g, bl, a)));
            b.map_output_socket(node, "color", OutputRef::new(op, 0));
        }
        NodeKind::Image { path } => {
            let op = b.add_operation(OperationKind::ImageSource { path: path.clone() });
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
            b.map_output_socket(node, "alpha", OutputRef::new(op, 1));
        }
        NodeKind::RenderLayer { layer } => {
            // Empty layer setting means "the active view layer".
            let layer = if layer.is_empty() {
                b.context().view_layer.clone()
            } else {
                layer.clone()
            };
            let op = b.add_operation(OperationKind::RenderLayerSource { layer });
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
            b.map_output_socket(node, "alpha", OutputRef::new(op, 1));
            b.map_output_socket(node, "depth", OutputRef::new(op, 2));
        }
        NodeKind::Math { operation } => {
            let op = b.add_operation(OperationKind::Math(*operation));
            b.map_input_socket(node, "value1", InputRef::new(op, 0));
            b.map_input_socket(node, "value2", InputRef::new(op, 1));
            b.map_output_socket(node, "value", OutputRef::new(op, 0));
        }
        NodeKind::Mix { mode } => {
            let op = b.add_operation(OperationKind::Mix(*mode));
            b.map_input_socket(node, "fac", InputRef::new(op, 0));
            b.map_input_socket(node, "image1", InputRef::new(op, 1));
            b.map_input_socket(node, "image2", InputRef::new(op, 2));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::Invert => {
            let op = b.add_operation(OperationKind::Invert);
            b.map_input_socket(node, "fac", InputRef::new(op, 0));
            b.map_input_socket(node, "color", InputRef::new(op, 1));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::Blur { size_x, size_y } => {
            let op = b.add_operation(OperationKind::Blur {
                size_x: OrderedFloat(*size_x),
                size_y: OrderedFloat(*size_y),
            });
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            b.map_input_socket(node, "size", InputRef::new(op, 1));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::Translate => {
            let op = b.add_operation(OperationKind::Translate);
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            b.map_input_socket(node, "x", InputRef::new(op, 1));
            b.map_input_socket(node, "y", InputRef::new(op, 2));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::Scale => {
            let op = b.add_operation(OperationKind::Scale);
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            b.map_input_socket(node, "x", InputRef::new(op, 1));
            b.map_input_socket(node, "y", InputRef::new(op, 2));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::SeparateColor => {
            let op = b.add_operation(OperationKind::SeparateColor);
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            for (index, socket) in ["r", "g", "b", "a"].into_iter().enumerate() {
                b.map_output_socket(node, socket, OutputRef::new(op, index));
            }
        }
        NodeKind::CombineColor => {
            let op = b.add_operation(OperationKind::CombineColor);
            for (index, socket) in ["r", "g", "b", "a"].into_iter().enumerate() {
                b.map_input_socket(node, socket, InputRef::new(op, index));
            }
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::Reroute => {
            let op = b.add_operation(OperationKind::SocketProxy(DataType::Color));
            b.map_input_socket(node, "input", InputRef::new(op, 0));
            b.map_output_socket(node, "output", OutputRef::new(op, 0));
        }
        NodeKind::Switch { on } => {
            // Only the selected side maps onto the proxy; the other
            // branch dangles and gets pruned unless used elsewhere.
            let op = b.add_operation(OperationKind::SocketProxy(DataType::Color));
            let socket = if *on { "on" } else { "off" };
            b.map_input_socket(node, socket, InputRef::new(op, 0));
            b.map_output_socket(node, "image", OutputRef::new(op, 0));
        }
        NodeKind::DropShadow {
            size,
            offset_x,
            offset_y,
        } => lower_drop_shadow(b, node, *size, *offset_x, *offset_y),
        NodeKind::Viewer => {
            let op = b.add_operation(OperationKind::Viewer);
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            b.map_input_socket(node, "alpha", InputRef::new(op, 1));
            b.register_viewer(op);
            if b.context().use_previews {
                b.add_node_input_preview(PinId::new(node.id, "image"));
            }
        }
        NodeKind::Composite => {
            let op = b.add_operation(OperationKind::CompositeOutput);
            b.map_input_socket(node, "image", InputRef::new(op, 0));
            b.map_input_socket(node, "alpha", InputRef::new(op, 1));
        }
        NodeKind::FileOutput { path } => {
            let op = b.add_operation(OperationKind::FileOutput { path: path.clone() });
            b.map_input_socket(node, "image", InputRef::new(op, 0));
        }
        NodeKind::Unknown => {
            // One broken node must not break unrelated results.
            log::warn!("node {} has an unsupported type, skipping", node.id);
        }
    }
}

/// Multi-pass lowering: the shadow branch blurs and offsets the image,
/// then screens the original back over it. The node's single image
/// socket maps onto two operation inputs.
fn lower_drop_shadow(b: &mut GraphBuilder<'_>, node: &Node, size: f32, dx: f32, dy: f32) {
    let blur = b.add_operation(OperationKind::Blur {
        size_x: OrderedFloat(size),
        size_y: OrderedFloat(size),
    });
    b.add_input_constant(ConstantValue::value(1.0), InputRef::new(blur, 1));

    let translate = b.add_operation(OperationKind::Translate);
    b.add_link(OutputRef::new(blur, 0), InputRef::new(translate, 0));
    b.add_input_constant(ConstantValue::value(dx), InputRef::new(translate, 1));
    b.add_input_constant(ConstantValue::value(dy), InputRef::new(translate, 2));

    let mix = b.add_operation(OperationKind::Mix(MixMode::Screen));
    b.add_input_constant(ConstantValue::value(1.0), InputRef::new(mix, 0));
    b.add_link(OutputRef::new(translate, 0), InputRef::new(mix, 1));

    b.map_input_socket(node, "image", InputRef::new(blur, 0));
    b.map_input_socket(node, "image", InputRef::new(mix, 2));
    b.map_output_socket(node, "image", OutputRef::new(mix, 0));
}
