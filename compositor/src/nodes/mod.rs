//! Input-side node tree model.
//!
//! This is the user-authored graph the builder consumes: logical nodes
//! with named, typed sockets and links between them. It is provided by
//! the node-editor/scene data layer and never mutated here. Socket
//! layouts (names, types, defaults) are derived from the node kind by
//! the definitions table.

mod definitions;

pub use definitions::SocketDef;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{DataType, MathOp, MixMode};

/// A logical node in the user graph. Settings live inside the kind
/// variant; socket layout is derived from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn input_sockets(&self) -> Vec<SocketDef> {
        definitions::input_sockets(&self.kind)
    }

    pub fn output_sockets(&self) -> Vec<SocketDef> {
        definitions::output_sockets(&self.kind)
    }

    pub fn input_socket(&self, name: &str) -> Option<SocketDef> {
        self.input_sockets().into_iter().find(|s| s.name == name)
    }

    pub fn output_socket(&self, name: &str) -> Option<SocketDef> {
        self.output_sockets().into_iter().find(|s| s.name == name)
    }
}

/// Node behavior tag plus per-node settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Value { value: f32 },
    Rgb { color: [f32; 4] },
    Image { path: String },
    RenderLayer { layer: String },
    Math { operation: MathOp },
    Mix { mode: MixMode },
    Invert,
    Blur { size_x: f32, size_y: f32 },
    Translate,
    Scale,
    SeparateColor,
    CombineColor,
    /// Identity forwarder; lowers to a proxy operation.
    Reroute,
    /// Forwards one of two inputs, selected by a build-time setting.
    Switch { on: bool },
    /// Multi-pass filter: lowers to a blur, translate and mix chain.
    DropShadow { size: f32, offset_x: f32, offset_y: f32 },
    Viewer,
    Composite,
    FileOutput { path: String },
    /// Anything this build does not understand. The builder skips it and
    /// keeps going.
    #[serde(other)]
    Unknown,
}

/// Addresses a named socket on a specific node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PinId {
    pub node_id: Uuid,
    pub socket: String,
}

impl PinId {
    pub fn new(node_id: Uuid, socket: &str) -> Self {
        Self {
            node_id,
            socket: socket.to_string(),
        }
    }
}

/// A link between two node sockets (an edge in the user graph).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeLink {
    pub from: PinId,
    pub to: PinId,
}

/// The user graph: ordered nodes plus socket links. Assumed acyclic —
/// cycle validation is the node editor's job, before the tree gets here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct NodeTree {
    pub nodes: Vec<Node>,
    pub links: Vec<NodeLink>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id.
    pub fn add_node(&mut self, kind: NodeKind) -> Uuid {
        let node = Node::new(kind);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: Uuid) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Connect two sockets. An existing link into the same input socket
    /// is replaced (inputs accept at most one link).
    pub fn connect(&mut self, from: PinId, to: PinId) {
        self.links.retain(|l| l.to != to);
        self.links.push(NodeLink { from, to });
    }

    /// The link feeding a node input socket, if any.
    pub fn input_link(&self, to: &PinId) -> Option<&NodeLink> {
        self.links.iter().find(|l| &l.to == to)
    }
}
