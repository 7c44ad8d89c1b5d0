//! Socket layout definitions per node kind.

use crate::graph::{ConstantValue, DataType};

use super::NodeKind;

/// Declared socket on a node type: name, data type and the default used
/// when an input is left unconnected.
#[derive(Clone, Debug, PartialEq)]
pub struct SocketDef {
    pub name: &'static str,
    pub data_type: DataType,
    pub default: Option<ConstantValue>,
}

fn inp(name: &'static str, data_type: DataType, default: ConstantValue) -> SocketDef {
    SocketDef {
        name,
        data_type,
        default: Some(default),
    }
}

fn out(name: &'static str, data_type: DataType) -> SocketDef {
    SocketDef {
        name,
        data_type,
        default: None,
    }
}

fn value(name: &'static str, default: f32) -> SocketDef {
    inp(name, DataType::Value, ConstantValue::value(default))
}

fn color(name: &'static str) -> SocketDef {
    inp(
        name,
        DataType::Color,
        ConstantValue::color(0.0, 0.0, 0.0, 1.0),
    )
}

pub(crate) fn input_sockets(kind: &NodeKind) -> Vec<SocketDef> {
    match kind {
        NodeKind::Value { .. }
        | NodeKind::Rgb { .. }
        | NodeKind::Image { .. }
        | NodeKind::RenderLayer { .. }
        | NodeKind::Unknown => vec![],
        NodeKind::Math { .. } => vec![value("value1", 0.5), value("value2", 0.5)],
        NodeKind::Mix { .. } => vec![value("fac", 0.5), color("image1"), color("image2")],
        NodeKind::Invert => vec![value("fac", 1.0), color("color")],
        NodeKind::Blur { .. } => vec![color("image"), value("size", 1.0)],
        NodeKind::Translate => vec![color("image"), value("x", 0.0), value("y", 0.0)],
        NodeKind::Scale => vec![color("image"), value("x", 1.0), value("y", 1.0)],
        NodeKind::SeparateColor => vec![color("image")],
        NodeKind::CombineColor => vec![
            value("r", 0.0),
            value("g", 0.0),
            value("b", 0.0),
            value("a", 1.0),
        ],
        NodeKind::Reroute => vec![SocketDef {
            name: "input",
            data_type: DataType::Color,
            default: None,
        }],
        NodeKind::Switch { .. } => vec![color("off"), color("on")],
        NodeKind::DropShadow { .. } => vec![color("image")],
        NodeKind::Viewer | NodeKind::Composite => vec![color("image"), value("alpha", 1.0)],
        NodeKind::FileOutput { .. } => vec![color("image")],
    }
}

pub(crate) fn output_sockets(kind: &NodeKind) -> Vec<SocketDef> {
    use DataType::*;
    match kind {
        NodeKind::Value { .. } => vec![out("value", Value)],
        NodeKind::Rgb { .. } => vec![out("color", Color)],
        NodeKind::Image { .. } => vec![out("image", Color), out("alpha", Value)],
        NodeKind::RenderLayer { .. } => {
            vec![out("image", Color), out("alpha", Value), out("depth", Value)]
        }
        NodeKind::Math { .. } => vec![out("value", Value)],
        NodeKind::Mix { .. }
        | NodeKind::Invert
        | NodeKind::Blur { .. }
        | NodeKind::Translate
        | NodeKind::Scale
        | NodeKind::CombineColor
        | NodeKind::Switch { .. }
        | NodeKind::DropShadow { .. } => vec![out("image", Color)],
        NodeKind::SeparateColor => vec![
            out("r", Value),
            out("g", Value),
            out("b", Value),
            out("a", Value),
        ],
        NodeKind::Reroute => vec![out("output", Color)],
        NodeKind::Viewer
        | NodeKind::Composite
        | NodeKind::FileOutput { .. }
        | NodeKind::Unknown => vec![],
    }
}
