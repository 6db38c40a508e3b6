//! Route builders.

mod common;
mod resource;
pub use common::probe_routes;
pub use resource::resource_routes;

use crate::state::AppState;
use crate::telemetry;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Full application router: probe routes at the root, resources under `/api`, wrapped in
/// request-id and tracing layers. Bodies over `max_body_bytes` are rejected by the body
/// extractor so the 413 carries the usual error body.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    probe_routes(state.clone())
        .nest("/api", resource_routes(state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(telemetry::request_span))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
