//! Success response helpers. Records are returned bare; deletes wrap the prior record.

use crate::store::Record;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Deleted {
    pub message: String,
    pub deleted: Record,
}

pub fn created(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::CREATED, Json(record))
}

pub fn ok(record: Record) -> (StatusCode, Json<Record>) {
    (StatusCode::OK, Json(record))
}

pub fn many(records: Vec<Record>) -> (StatusCode, Json<Vec<Record>>) {
    (StatusCode::OK, Json(records))
}

pub fn deleted(label: &str, record: Record) -> (StatusCode, Json<Deleted>) {
    (
        StatusCode::OK,
        Json(Deleted {
            message: format!("{} deleted successfully", label),
            deleted: record,
        }),
    )
}
