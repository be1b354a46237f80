//! The shipped authentication service: route table, server assembly, and
//! controllers built on the dispatch pipeline.

use anyhow::{Context, Result};
use axum::Extension;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::auth::PgStore;
use crate::pipeline::{DispatchPipeline, PipelineConfig, dispatch};
use crate::session::CookieSessions;

pub mod controllers;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: PipelineConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let pipeline = Arc::new(DispatchPipeline::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(controllers::routes()),
        Arc::new(CookieSessions::new()),
        config,
    ));

    let app = axum::Router::new()
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(pipeline)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown handler");
        return;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.path = request.uri().path(),
        request_id
    )
}
