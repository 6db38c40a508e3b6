//! Liveness, readiness and build info.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Probe {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<&'static str>,
}

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    resources: usize,
}

async fn health() -> Json<Probe> {
    Json(Probe {
        status: "ok",
        store: None,
    })
}

/// 503 until the store answers a ping.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Probe>) {
    match state.service.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Probe {
                status: "ok",
                store: Some("ok"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Probe {
                    status: "degraded",
                    store: Some("unavailable"),
                }),
            )
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        resources: state.service.model().resources.len(),
    })
}

/// GET /health, GET /ready, GET /version.
pub fn probe_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
