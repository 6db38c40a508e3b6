//! Resource CRUD routes. One parameterized path serves every resource in the model;
//! handlers resolve the resource by name.

use crate::handlers::resource::{
    create, delete, delete_by_path, index, list_or_read, read_by_path, update, update_by_path,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/:resource",
            get(list_or_read).post(create).put(update).delete(delete),
        )
        .route(
            "/:resource/:id",
            get(read_by_path).put(update_by_path).delete(delete_by_path),
        )
        .with_state(state)
}
