//! Operation model — the nodes of the lowered execution graph.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Stable identity of an operation inside one [`OperationGraph`].
///
/// Ids are arena indices: they are assigned in insertion order and never
/// reused, which makes insertion order the tie-break anchor for the
/// deterministic topological sort.
///
/// [`OperationGraph`]: super::OperationGraph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub(crate) usize);

impl OperationId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Addresses one input socket of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputRef {
    pub op: OperationId,
    pub index: usize,
}

impl InputRef {
    pub fn new(op: OperationId, index: usize) -> Self {
        Self { op, index }
    }
}

/// Addresses one output socket of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub op: OperationId,
    pub index: usize,
}

impl OutputRef {
    pub fn new(op: OperationId, index: usize) -> Self {
        Self { op, index }
    }
}

/// Socket data type. These are the three pixel data types that flow
/// through the execution graph; everything else lives in per-operation
/// settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Single float channel.
    Value,
    /// XYZ triple.
    Vector,
    /// RGBA quadruple.
    Color,
}

impl DataType {
    /// Type-appropriate zero, used when an unconnected input has no
    /// declared default. Colors zero-fill to opaque black so a broken
    /// branch stays visible as black rather than punching alpha holes.
    pub fn zero(self) -> ConstantValue {
        match self {
            DataType::Value => ConstantValue::value(0.0),
            DataType::Vector => ConstantValue::vector(0.0, 0.0, 0.0),
            DataType::Color => ConstantValue::color(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Value => "Value",
            DataType::Vector => "Vector",
            DataType::Color => "Color",
        };
        write!(f, "{}", s)
    }
}

/// A typed constant. Floats are wrapped in `OrderedFloat` so constants
/// are `Eq + Hash` and equal-operation merging can key on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantValue {
    Value(OrderedFloat<f32>),
    Vector([OrderedFloat<f32>; 3]),
    Color([OrderedFloat<f32>; 4]),
}

impl ConstantValue {
    pub fn value(v: f32) -> Self {
        ConstantValue::Value(OrderedFloat(v))
    }

    pub fn vector(x: f32, y: f32, z: f32) -> Self {
        ConstantValue::Vector([OrderedFloat(x), OrderedFloat(y), OrderedFloat(z)])
    }

    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        ConstantValue::Color([
            OrderedFloat(r),
            OrderedFloat(g),
            OrderedFloat(b),
            OrderedFloat(a),
        ])
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ConstantValue::Value(_) => DataType::Value,
            ConstantValue::Vector(_) => DataType::Vector,
            ConstantValue::Color(_) => DataType::Color,
        }
    }
}

/// Scalar math operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Minimum,
    Maximum,
}

/// Blend modes for the mix operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    Mix,
    Add,
    Multiply,
    Screen,
}

/// Execution complexity classification.
///
/// `Complex` operations need their full input buffers materialized before
/// they can start (e.g. area filters); the legalizer isolates them behind
/// read/write buffer seams. `Simple` operations stream tile by tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Complex,
}

/// The pixel-processing behavior of an operation.
///
/// The variant tag is the dispatch key the execution engine switches on;
/// per-operation settings live inside the variants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Produces a constant value/vector/color for every pixel.
    Constant(ConstantValue),
    ImageSource {
        path: String,
    },
    RenderLayerSource {
        layer: String,
    },
    Math(MathOp),
    Mix(MixMode),
    Invert,
    /// Area blur; requires the full input buffer.
    Blur {
        size_x: OrderedFloat<f32>,
        size_y: OrderedFloat<f32>,
    },
    Translate,
    Scale,
    SeparateColor,
    CombineColor,
    /// Data-type conversion inserted by the legalizer.
    Convert {
        from: DataType,
        to: DataType,
    },
    /// Identity pass-through; modelled node-group boundary or switch
    /// sockets. Removed by proxy resolution.
    SocketProxy(DataType),
    /// Reads a materialized full-frame buffer produced by a paired
    /// write-buffer operation.
    ReadBuffer(DataType),
    /// Materializes its input into a full-frame buffer.
    WriteBuffer(DataType),
    /// Writes to the interactive viewer image.
    Viewer,
    /// Low-priority thumbnail of an output socket.
    Preview,
    /// Final render result.
    CompositeOutput,
    FileOutput {
        path: String,
    },
}

impl OperationKind {
    pub fn complexity(&self) -> Complexity {
        match self {
            OperationKind::Blur { .. } => Complexity::Complex,
            _ => Complexity::Simple,
        }
    }

    /// Whether a constant-folding pass may replace this operation with a
    /// constant when all of its inputs are constants.
    pub fn can_be_constant(&self) -> bool {
        matches!(
            self,
            OperationKind::Math(_) | OperationKind::Convert { .. }
        )
    }

    /// Operations with observable side effects are never merged and never
    /// replaced: they write somewhere other than their output sockets.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self,
            OperationKind::Viewer
                | OperationKind::Preview
                | OperationKind::CompositeOutput
                | OperationKind::FileOutput { .. }
                | OperationKind::ReadBuffer(_)
                | OperationKind::WriteBuffer(_)
        )
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, OperationKind::Constant(_))
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, OperationKind::SocketProxy(_))
    }

    pub fn is_read_buffer(&self) -> bool {
        matches!(self, OperationKind::ReadBuffer(_))
    }

    pub fn is_write_buffer(&self) -> bool {
        matches!(self, OperationKind::WriteBuffer(_))
    }

    pub fn is_buffer(&self) -> bool {
        self.is_read_buffer() || self.is_write_buffer()
    }

    /// Short tag for diagnostics output.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Constant(_) => "constant",
            OperationKind::ImageSource { .. } => "image_source",
            OperationKind::RenderLayerSource { .. } => "render_layer_source",
            OperationKind::Math(_) => "math",
            OperationKind::Mix(_) => "mix",
            OperationKind::Invert => "invert",
            OperationKind::Blur { .. } => "blur",
            OperationKind::Translate => "translate",
            OperationKind::Scale => "scale",
            OperationKind::SeparateColor => "separate_color",
            OperationKind::CombineColor => "combine_color",
            OperationKind::Convert { .. } => "convert",
            OperationKind::SocketProxy(_) => "socket_proxy",
            OperationKind::ReadBuffer(_) => "read_buffer",
            OperationKind::WriteBuffer(_) => "write_buffer",
            OperationKind::Viewer => "viewer",
            OperationKind::Preview => "preview",
            OperationKind::CompositeOutput => "composite_output",
            OperationKind::FileOutput { .. } => "file_output",
        }
    }

    /// Declared socket layout: (input types, output types).
    fn socket_layout(&self) -> (Vec<DataType>, Vec<DataType>) {
        use DataType::*;
        match self {
            OperationKind::Constant(v) => (vec![], vec![v.data_type()]),
            OperationKind::ImageSource { .. } => (vec![], vec![Color, Value]),
            OperationKind::RenderLayerSource { .. } => (vec![], vec![Color, Value, Value]),
            OperationKind::Math(_) => (vec![Value, Value], vec![Value]),
            OperationKind::Mix(_) => (vec![Value, Color, Color], vec![Color]),
            OperationKind::Invert => (vec![Value, Color], vec![Color]),
            OperationKind::Blur { .. } => (vec![Color, Value], vec![Color]),
            OperationKind::Translate | OperationKind::Scale => {
                (vec![Color, Value, Value], vec![Color])
            }
            OperationKind::SeparateColor => (vec![Color], vec![Value, Value, Value, Value]),
            OperationKind::CombineColor => (vec![Value, Value, Value, Value], vec![Color]),
            OperationKind::Convert { from, to } => (vec![*from], vec![*to]),
            OperationKind::SocketProxy(dt) => (vec![*dt], vec![*dt]),
            OperationKind::ReadBuffer(dt) | OperationKind::WriteBuffer(dt) => {
                (vec![*dt], vec![*dt])
            }
            OperationKind::Viewer => (vec![Color, Value], vec![]),
            OperationKind::Preview => (vec![Color], vec![]),
            OperationKind::CompositeOutput => (vec![Color, Value], vec![]),
            OperationKind::FileOutput { .. } => (vec![Color], vec![]),
        }
    }
}

/// Input socket of an operation. Holds at most one incoming link (the
/// link itself is owned by the graph) and an optional default used by
/// constant folding when nothing connects.
#[derive(Clone, Debug)]
pub struct OperationInput {
    pub data_type: DataType,
    pub default: Option<ConstantValue>,
}

/// Output socket of an operation. May fan out to many inputs.
#[derive(Clone, Debug)]
pub struct OperationOutput {
    pub data_type: DataType,
}

/// One pixel-processing unit in the lowered execution graph.
///
/// Owned exclusively by the graph arena once added; referenced everywhere
/// else by [`OperationId`].
#[derive(Clone, Debug)]
pub struct Operation {
    id: OperationId,
    kind: OperationKind,
    inputs: Vec<OperationInput>,
    outputs: Vec<OperationOutput>,
    complexity: Complexity,
    can_be_constant: bool,
}

impl Operation {
    pub(crate) fn new(id: OperationId, kind: OperationKind) -> Self {
        let (inputs, outputs) = kind.socket_layout();
        let complexity = kind.complexity();
        let can_be_constant = kind.can_be_constant();
        Self {
            id,
            inputs: inputs
                .into_iter()
                .map(|data_type| OperationInput {
                    data_type,
                    default: None,
                })
                .collect(),
            outputs: outputs
                .into_iter()
                .map(|data_type| OperationOutput { data_type })
                .collect(),
            kind,
            complexity,
            can_be_constant,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[OperationInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OperationOutput] {
        &self.outputs
    }

    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    pub fn is_complex(&self) -> bool {
        self.complexity == Complexity::Complex
    }

    pub fn can_be_constant(&self) -> bool {
        self.can_be_constant
    }

    pub(crate) fn input_mut(&mut self, index: usize) -> &mut OperationInput {
        &mut self.inputs[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_layout_matches_kind() {
        let op = Operation::new(OperationId(0), OperationKind::Mix(MixMode::Mix));
        assert_eq!(op.inputs().len(), 3);
        assert_eq!(op.inputs()[0].data_type, DataType::Value);
        assert_eq!(op.outputs().len(), 1);
        assert_eq!(op.outputs()[0].data_type, DataType::Color);
    }

    #[test]
    fn test_blur_is_complex() {
        let op = Operation::new(
            OperationId(0),
            OperationKind::Blur {
                size_x: 2.0.into(),
                size_y: 2.0.into(),
            },
        );
        assert!(op.is_complex());
        assert!(!op.can_be_constant());
    }

    #[test]
    fn test_zero_values_are_typed() {
        assert_eq!(DataType::Value.zero().data_type(), DataType::Value);
        assert_eq!(DataType::Color.zero(), ConstantValue::color(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_side_effect_kinds() {
        assert!(OperationKind::Viewer.has_side_effects());
        assert!(OperationKind::WriteBuffer(DataType::Color).has_side_effects());
        assert!(!OperationKind::Invert.has_side_effects());
    }
}
