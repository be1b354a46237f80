//! Process-wide pipeline configuration, immutable after construction.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::auth::DEFAULT_CACHE_CAPACITY;

use super::context::RequestContext;
use super::results::Renderer;

pub type NotFoundHandler = Arc<dyn Fn(&RequestContext) -> Response + Send + Sync>;

fn default_not_found(_ctx: &RequestContext) -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

/// Construction-time configuration for [`DispatchPipeline`].
///
/// [`DispatchPipeline`]: super::DispatchPipeline
#[derive(Clone)]
pub struct PipelineConfig {
    sessions_enabled: bool,
    cache_capacity: usize,
    not_found: NotFoundHandler,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            not_found: Arc::new(default_not_found),
            renderer: None,
        }
    }

    /// Disable session resolution entirely; requests stay anonymous.
    #[must_use]
    pub fn with_sessions_enabled(mut self, enabled: bool) -> Self {
        self.sessions_enabled = enabled;
        self
    }

    /// Authentication cache capacity; 0 disables caching.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_not_found(mut self, handler: NotFoundHandler) -> Self {
        self.not_found = handler;
        self
    }

    /// The template set used by name-based template results.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn sessions_enabled(&self) -> bool {
        self.sessions_enabled
    }

    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    #[must_use]
    pub(super) fn not_found(&self) -> &NotFoundHandler {
        &self.not_found
    }

    #[must_use]
    pub(super) fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }
}
