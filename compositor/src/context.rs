//! Build context — explicit per-build settings, no ambient global state.

/// What kind of evaluation the compiled graph is destined for.
///
/// Viewport builds keep viewer and preview operations as requested
/// outputs; final-render builds keep composite and file outputs instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionModel {
    Viewport,
    Render,
}

/// Settings for one compositor build.
///
/// A `BuildContext` is created per evaluation request and passed
/// explicitly through every stage, so two builds with the same context
/// and the same node tree produce identical results.
#[derive(Clone, Debug)]
pub struct BuildContext {
    pub model: ExecutionModel,
    /// Active view layer, used when a render-layer node leaves its layer
    /// setting empty.
    pub view_layer: String,
    pub render_width: u32,
    pub render_height: u32,
    /// Insert preview operations downstream of viewer inputs.
    pub use_previews: bool,
}

impl BuildContext {
    /// Context for an interactive viewport evaluation.
    pub fn viewport() -> Self {
        Self {
            model: ExecutionModel::Viewport,
            view_layer: String::new(),
            render_width: 1920,
            render_height: 1080,
            use_previews: true,
        }
    }

    /// Context for a final render at the given output size.
    pub fn render(width: u32, height: u32) -> Self {
        Self {
            model: ExecutionModel::Render,
            view_layer: String::new(),
            render_width: width,
            render_height: height,
            use_previews: false,
        }
    }

    pub fn with_view_layer(mut self, layer: &str) -> Self {
        self.view_layer = layer.to_string();
        self
    }

    pub fn with_previews(mut self, on: bool) -> Self {
        self.use_previews = on;
        self
    }

    pub fn is_rendering(&self) -> bool {
        self.model == ExecutionModel::Render
    }
}
