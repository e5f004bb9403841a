use axum::{extract::{rejection::JsonRejection, Path, State}, http::StatusCode, Json};
use serde_json::Value;
use tracing::info;

use service::storage::{Record, RecordId, Table};
use service::validation::{self, Mode};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

/// Tables reachable through the generic admin API (everything but `admins`).
pub(crate) fn managed_table(name: &str) -> Result<Table, JsonApiError> {
    match name.parse::<Table>() {
        Ok(t) if t.is_admin_managed() => Ok(t),
        _ => Err(JsonApiError::not_found(format!("no such collection '{name}'"))),
    }
}

pub(crate) fn body_object(body: Value) -> Result<Record, JsonApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(JsonApiError::bad_request("request body must be a JSON object")),
    }
}

#[utoipa::path(get, path = "/admin/{table}", tag = "admin",
    params(("table" = String, Path, description = "Collection name")),
    responses((status = 200, description = "All records"), (status = 401, description = "Unauthorized")))]
pub async fn list_records(State(state): State<ServerState>, Path(table): Path<String>) -> Result<Json<Vec<Record>>, JsonApiError> {
    let table = managed_table(&table)?;
    Ok(Json(state.store.read(table).await))
}

#[utoipa::path(post, path = "/admin/{table}", tag = "admin",
    params(("table" = String, Path, description = "Collection name")),
    responses((status = 201, description = "Created"), (status = 400, description = "Validation error"), (status = 401, description = "Unauthorized")))]
pub async fn create_record(
    State(state): State<ServerState>,
    Path(table): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    let table = managed_table(&table)?;
    let Json(body) = body?;
    let mut record = validation::sanitize_record(body_object(body)?);
    validation::validate(table, &mut record, Mode::Create)?;
    let created = state.store.insert(table, &record).await?;
    info!(table = %table, id = ?created.get("id"), "record created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/admin/{table}/{id}", tag = "admin",
    params(("table" = String, Path, description = "Collection name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Record"), (status = 404, description = "Not found")))]
pub async fn get_record(State(state): State<ServerState>, Path((table, id)): Path<(String, String)>) -> Result<Json<Record>, JsonApiError> {
    let table = managed_table(&table)?;
    state
        .store
        .find_by_id(table, &RecordId::parse(&id))
        .await
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found(format!("{table} {id} not found")))
}

#[utoipa::path(put, path = "/admin/{table}/{id}", tag = "admin",
    params(("table" = String, Path, description = "Collection name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Merged record"), (status = 400, description = "Validation error"), (status = 404, description = "Not found")))]
pub async fn update_record(
    State(state): State<ServerState>,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, JsonApiError> {
    let table = managed_table(&table)?;
    let Json(body) = body?;
    let mut partial = validation::sanitize_record(body_object(body)?);
    validation::validate(table, &mut partial, Mode::Patch)?;
    match state.store.update(table, &RecordId::parse(&id), partial).await? {
        Some(updated) => {
            info!(table = %table, id = %id, "record updated");
            Ok(Json(updated))
        }
        None => Err(JsonApiError::not_found(format!("{table} {id} not found"))),
    }
}

#[utoipa::path(delete, path = "/admin/{table}/{id}", tag = "admin",
    params(("table" = String, Path, description = "Collection name"), ("id" = String, Path, description = "Record id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete_record(State(state): State<ServerState>, Path((table, id)): Path<(String, String)>) -> Result<StatusCode, JsonApiError> {
    let table = managed_table(&table)?;
    if state.store.delete(table, &RecordId::parse(&id)).await? {
        info!(table = %table, id = %id, "record deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found(format!("{table} {id} not found")))
    }
}
