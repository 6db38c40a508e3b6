//! Resource CRUD handlers. The record id comes from `?id=` or from the path segment after the
//! resource name; both forms run the same service operations. Bodies are read as raw bytes and
//! parsed by the service, so body rejections surface as [`AppError`]s.

use crate::error::AppError;
use crate::response;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;

/// GET /api: resource names in catalog order.
pub async fn index(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.model().names().into_iter().map(str::to_string).collect())
}

/// GET /api/:resource: a single record when `id` is present, otherwise a filtered page.
pub async fn list_or_read(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let resource = state.service.resource(&name)?;
    if let Some(id) = params.get("id") {
        let record = state.service.read(resource, Some(id.as_str())).await?;
        return Ok(response::ok(record).into_response());
    }
    let records = state.service.list(resource, &params).await?;
    Ok(response::many(records).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let body = body?;
    let record = state.service.create(resource, &body).await?;
    Ok(response::created(record))
}

pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let body = body?;
    let record = state
        .service
        .update(resource, params.get("id").map(String::as_str), &body)
        .await?;
    Ok(response::ok(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let record = state
        .service
        .delete(resource, params.get("id").map(String::as_str))
        .await?;
    Ok(response::deleted(&resource.label, record))
}

pub async fn read_by_path(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let record = state.service.read(resource, Some(id.as_str())).await?;
    Ok(response::ok(record))
}

pub async fn update_by_path(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let body = body?;
    let record = state.service.update(resource, Some(id.as_str()), &body).await?;
    Ok(response::ok(record))
}

pub async fn delete_by_path(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.service.resource(&name)?;
    let record = state.service.delete(resource, Some(id.as_str())).await?;
    Ok(response::deleted(&resource.label, record))
}
