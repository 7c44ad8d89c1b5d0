use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Graph error: {0}")]
    Graph(String),
    #[error("Internal consistency error: {0}")]
    Internal(String),
}

impl CompositorError {
    pub fn graph(msg: impl Into<String>) -> Self {
        CompositorError::Graph(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        CompositorError::Internal(msg.into())
    }
}
