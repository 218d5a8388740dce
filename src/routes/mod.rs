mod device;
mod session;
mod system;

use crate::middlewares::{TraceId, TraceIdLayer, require_session};
use crate::state::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::time::Duration;
use tracing::Span;

pub fn build(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/session", get(session::current))
        .route("/api/devices", post(device::record))
        .route("/api/devices", get(device::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/version", get(system::version))
        .merge(protected)
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    match request.extensions().get::<TraceId>() {
                        Some(trace_id) => tracing::debug_span!("request", trace_id = %trace_id),
                        None => tracing::debug_span!("request"),
                    }
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::trace!(
                        method = %req.method(),
                        uri = %req.uri(),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::trace!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(TraceIdLayer)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .expose_headers(tower_http::cors::Any)
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        )
}
