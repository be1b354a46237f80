//! Controller results: the single `execute` capability and its built-ins.

use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Renders named templates from the configured template set.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> anyhow::Result<String>;
}

/// A self-contained template object carried by an [`EngineView`].
///
/// This is the pluggable variant: the engine travels with the result instead
/// of being looked up by name.
pub trait TemplateEngine: Send {
    fn render(&self, data: &Value) -> anyhow::Result<String>;
}

/// What a result may reach during execution.
pub struct RenderEnv<'a> {
    renderer: Option<&'a dyn Renderer>,
}

impl<'a> RenderEnv<'a> {
    #[must_use]
    pub fn new(renderer: Option<&'a dyn Renderer>) -> Self {
        Self { renderer }
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&'a dyn Renderer> {
        self.renderer
    }
}

/// The polymorphic return value of a controller.
///
/// Any type with this single capability is accepted; the pipeline executes
/// it against the response target. Rendering failures are reported as a
/// server error, never panics.
pub trait ControllerResult: Send {
    fn execute(self: Box<Self>, env: &RenderEnv<'_>) -> Response;
}

pub type BoxedResult = Box<dyn ControllerResult>;

fn render_failure(what: &str, err: &dyn std::fmt::Display) -> Response {
    error!(%err, "{what}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Render a named template from the configured set.
pub struct TemplateView {
    template: String,
    data: Value,
}

impl TemplateView {
    #[must_use]
    pub fn new(template: impl Into<String>, data: Value) -> BoxedResult {
        Box::new(Self {
            template: template.into(),
            data,
        })
    }
}

impl ControllerResult for TemplateView {
    fn execute(self: Box<Self>, env: &RenderEnv<'_>) -> Response {
        let Some(renderer) = env.renderer() else {
            error!(
                template = %self.template,
                "template result without a configured renderer"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        };
        match renderer.render(&self.template, &self.data) {
            Ok(body) => Html(body).into_response(),
            Err(err) => render_failure("template rendering failed", &err),
        }
    }
}

/// Structured-data (JSON) result.
pub struct JsonView {
    status: StatusCode,
    data: Result<Value, serde_json::Error>,
}

impl JsonView {
    #[must_use]
    pub fn new(data: impl Serialize) -> Self {
        Self {
            status: StatusCode::OK,
            data: serde_json::to_value(data),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn boxed(self) -> BoxedResult {
        Box::new(self)
    }
}

impl ControllerResult for JsonView {
    fn execute(self: Box<Self>, _env: &RenderEnv<'_>) -> Response {
        match self.data {
            Ok(value) => (
                self.status,
                [(CONTENT_TYPE, "application/json")],
                value.to_string(),
            )
                .into_response(),
            Err(err) => render_failure("json serialization failed", &err),
        }
    }
}

/// Render through a template object supplied by the controller itself.
pub struct EngineView {
    engine: Box<dyn TemplateEngine>,
    data: Value,
}

impl EngineView {
    #[must_use]
    pub fn new(engine: Box<dyn TemplateEngine>, data: Value) -> BoxedResult {
        Box::new(Self { engine, data })
    }
}

impl ControllerResult for EngineView {
    fn execute(self: Box<Self>, _env: &RenderEnv<'_>) -> Response {
        match self.engine.render(&self.data) {
            Ok(body) => Html(body).into_response(),
            Err(err) => render_failure("template engine rendering failed", &err),
        }
    }
}
