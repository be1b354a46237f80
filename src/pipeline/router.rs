//! Route matching: the contract the pipeline consumes, plus a default table.

use axum::http::Method;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::RequestContext;
use super::params::Params;
use super::results::BoxedResult;

/// A controller maps (context, parameters) to a result.
pub type ControllerFuture = Pin<Box<dyn Future<Output = BoxedResult> + Send>>;
pub type Controller = Arc<dyn Fn(RequestContext, Params) -> ControllerFuture + Send + Sync>;

/// Wrap an async function as a [`Controller`].
pub fn controller<F, Fut>(f: F) -> Controller
where
    F: Fn(RequestContext, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BoxedResult> + Send + 'static,
{
    Arc::new(move |ctx, params| -> ControllerFuture { Box::pin(f(ctx, params)) })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter(String),
}

/// A named route: method, path pattern, controller.
///
/// Pattern segments are literals or `{name}` parameters, for example
/// `/users/{id}/profile`.
pub struct Route {
    name: String,
    method: Method,
    segments: Vec<Segment>,
    controller: Controller,
}

impl Route {
    fn parse(name: &str, method: Method, pattern: &str, controller: Controller) -> Self {
        let segments = split_path(pattern)
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                    .map_or_else(
                        || Segment::Literal(segment.to_string()),
                        |name| Segment::Parameter(name.to_string()),
                    )
            })
            .collect();
        Self {
            name: name.to_string(),
            method,
            segments,
            controller,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn controller(&self) -> Controller {
        Arc::clone(&self.controller)
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if self.method != *method {
            return false;
        }
        let mut offered = split_path(path);
        for segment in &self.segments {
            match (segment, offered.next()) {
                (Segment::Literal(expected), Some(actual)) if expected == actual => {}
                (Segment::Parameter(_), Some(actual)) if !actual.is_empty() => {}
                _ => return false,
            }
        }
        offered.next().is_none()
    }

    /// Recover the values of `{name}` segments from a concrete path.
    #[must_use]
    pub fn extract_parameters(&self, path: &str) -> Params {
        let mut params = Params::new();
        for (segment, actual) in self.segments.iter().zip(split_path(path)) {
            if let Segment::Parameter(name) = segment {
                params.add(name.clone(), actual);
            }
        }
        params
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
}

/// Matches an inbound request to a controller.
pub trait Router: Send + Sync {
    fn match_route(&self, method: &Method, path: &str) -> Option<Arc<Route>>;
}

/// Default router: first registered route that matches wins.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: &str,
        pattern: &str,
        method: Method,
        controller: Controller,
    ) -> &mut Self {
        self.routes
            .push(Arc::new(Route::parse(name, method, pattern, controller)));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Router for RouteTable {
    fn match_route(&self, method: &Method, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.matches(method, path))
            .map(Arc::clone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::results::JsonView;
    use serde_json::json;

    fn noop() -> Controller {
        controller(|_ctx, _params| async { JsonView::new(json!({})).boxed() })
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.add("home", "/", Method::GET, noop());
        table.add("user", "/users/{id}", Method::GET, noop());
        table.add("create", "/users", Method::POST, noop());
        table
    }

    #[test]
    fn literal_and_root_paths_match() {
        let table = table();
        assert_eq!(table.match_route(&Method::GET, "/").unwrap().name(), "home");
        assert_eq!(
            table.match_route(&Method::POST, "/users").unwrap().name(),
            "create"
        );
    }

    #[test]
    fn method_participates_in_matching() {
        let table = table();
        assert!(table.match_route(&Method::DELETE, "/users").is_none());
    }

    #[test]
    fn parameter_segments_match_and_extract() {
        let table = table();
        let route = table.match_route(&Method::GET, "/users/42").unwrap();
        assert_eq!(route.name(), "user");
        assert_eq!(route.extract_parameters("/users/42").get("id"), Some("42"));
    }

    #[test]
    fn trailing_slash_is_tolerated() {
        let table = table();
        assert!(table.match_route(&Method::GET, "/users/42/").is_some());
    }

    #[test]
    fn segment_count_must_match() {
        let table = table();
        assert!(table.match_route(&Method::GET, "/users/42/extra").is_none());
        assert!(table.match_route(&Method::GET, "/unknown").is_none());
    }
}
