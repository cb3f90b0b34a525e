//! Shared handler state.

use std::sync::Arc;

use askdocs_rag::pipeline::QaPipeline;

/// State injected into every handler: the pipeline with its store and
/// provider connections, constructed once at startup and shared.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QaPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<QaPipeline>) -> Self {
        Self { pipeline }
    }
}
