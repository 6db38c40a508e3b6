#![allow(dead_code)]

use agency_resources::{app, builtin_config, resolve, AppState, CrudService, MemoryStore, Store};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub fn service() -> CrudService {
    let model = Arc::new(resolve(&builtin_config().unwrap()).unwrap());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    CrudService::new(store, model)
}

pub fn router() -> Router {
    router_with_limit(1024 * 1024)
}

pub fn router_with_limit(max_body_bytes: usize) -> Router {
    let model = Arc::new(resolve(&builtin_config().unwrap()).unwrap());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    app(AppState::new(store, model), max_body_bytes)
}

pub fn blog_post(slug: &str) -> Value {
    json!({
        "title": "A",
        "slug": slug,
        "content": "x",
        "excerpt": "y",
        "thumbnailUrl": "z",
        "category": "Tech",
        "authorName": "Bob",
        "authorId": 1,
        "readTime": 5
    })
}

pub fn body(v: &Value) -> Vec<u8> {
    serde_json::to_vec(v).unwrap()
}

/// Send one request through the router and decode the JSON response.
pub async fn send(router: &Router, method: &str, uri: &str, payload: Option<&Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match payload {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(body(v)))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(router, req).await
}

pub async fn send_request(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
