//! The request-dispatch pipeline: session resolution, authentication
//! resolution, routing, controller invocation, and result execution, in
//! that order for every inbound request.

use axum::body::Body;
use axum::extract::{ConnectInfo, Extension};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::auth::{
    AuthenticationCache, AuthenticationStore, Authenticator, RequestAuthenticator, normalize_ip,
};
use crate::session::SessionProvider;

pub mod config;
pub mod context;
pub mod params;
pub mod results;
pub mod router;

pub use config::{NotFoundHandler, PipelineConfig};
pub use context::RequestContext;
pub use params::Params;
pub use results::{
    BoxedResult, ControllerResult, EngineView, JsonView, RenderEnv, Renderer, TemplateEngine,
    TemplateView,
};
pub use router::{Controller, ControllerFuture, Route, RouteTable, Router, controller};

use context::Services;

/// Upper bound on parsed form bodies.
const FORM_BODY_LIMIT: usize = 1024 * 1024;

/// Orders every inbound request through one fixed pipeline.
///
/// Holds the only process-wide mutable state (the authentication cache,
/// internally synchronized) and is shared across all concurrent requests.
/// Nothing downstream of a controller feeds back into authentication state
/// within the same request.
pub struct DispatchPipeline {
    services: Arc<Services>,
    router: Arc<dyn Router>,
    sessions: Arc<dyn SessionProvider>,
    config: PipelineConfig,
}

impl DispatchPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn AuthenticationStore>,
        router: Arc<dyn Router>,
        sessions: Arc<dyn SessionProvider>,
        config: PipelineConfig,
    ) -> Self {
        let authenticator = Authenticator::new(store);
        let cache = Arc::new(AuthenticationCache::new(config.cache_capacity()));
        let request_auth = RequestAuthenticator::new(authenticator.clone(), cache);
        Self {
            services: Arc::new(Services {
                authenticator,
                request_auth,
            }),
            router,
            sessions,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.services.authenticator
    }

    #[must_use]
    pub fn request_authenticator(&self) -> &RequestAuthenticator {
        &self.services.request_auth
    }

    /// Run one request through the pipeline.
    ///
    /// `remote_addr` is the raw connection address as the transport reports
    /// it; the port suffix is stripped before any authentication use.
    pub async fn handle(&self, remote_addr: Option<&str>, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let (session, set_cookie) = if self.config.sessions_enabled() {
            let handle = self.sessions.get_or_create(&parts.headers).await;
            (Some(handle.session), handle.set_cookie)
        } else {
            (None, None)
        };

        let client_ip = remote_addr.map(normalize_ip);

        let user = match (&session, &client_ip) {
            (Some(session), Some(ip)) => {
                self.services
                    .request_auth
                    .authenticate(session.id(), ip)
                    .await
            }
            _ => None,
        };

        let ctx = RequestContext::new(
            parts.method.clone(),
            path.clone(),
            parts.headers.clone(),
            session,
            user,
            client_ip,
            Arc::clone(&self.services),
        );

        let Some(route) = self.router.match_route(&parts.method, &path) else {
            let mut response = (self.config.not_found())(&ctx);
            append_cookie(&mut response, set_cookie);
            return response;
        };

        // Path values first; submitted values accumulate after them.
        let mut request_params = route.extract_parameters(&path);
        let mut submitted = Params::new();
        if let Some(query) = parts.uri.query() {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                submitted.add(key.into_owned(), value.into_owned());
            }
        }
        if is_form_content(&parts.headers) {
            match axum::body::to_bytes(body, FORM_BODY_LIMIT).await {
                Ok(bytes) => {
                    for (key, value) in url::form_urlencoded::parse(&bytes) {
                        submitted.add(key.into_owned(), value.into_owned());
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to read form body");
                }
            }
        }
        request_params.merge(submitted);

        let result = (route.controller())(ctx, request_params).await;

        let env = RenderEnv::new(self.config.renderer().map(|renderer| renderer.as_ref()));
        let mut response = result.execute(&env);
        append_cookie(&mut response, set_cookie);
        response
    }
}

fn is_form_content(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn append_cookie(response: &mut Response, set_cookie: Option<HeaderValue>) {
    if let Some(cookie) = set_cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
}

/// The axum entry point: mount as a fallback so every request reaches the
/// pipeline's own router.
pub async fn dispatch(
    Extension(pipeline): Extension<Arc<DispatchPipeline>>,
    request: Request<Body>,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string());
    pipeline.handle(remote_addr.as_deref(), request).await
}
