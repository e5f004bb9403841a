use axum::{extract::{Path, State}, Json};
use service::storage::{Record, RecordId, Table};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

/// Resolve a table readable without a token; anything else is a 404.
fn public_table(name: &str) -> Result<Table, JsonApiError> {
    match name.parse::<Table>() {
        Ok(t) if t.is_public() => Ok(t),
        _ => Err(JsonApiError::not_found(format!("no such collection '{name}'"))),
    }
}

#[utoipa::path(get, path = "/api/{table}", tag = "public",
    params(("table" = String, Path, description = "products | services | gallery | videos | profiles")),
    responses((status = 200, description = "All records in table order"), (status = 404, description = "Unknown collection")))]
pub async fn list(State(state): State<ServerState>, Path(table): Path<String>) -> Result<Json<Vec<Record>>, JsonApiError> {
    let table = public_table(&table)?;
    Ok(Json(state.store.read(table).await))
}

#[utoipa::path(get, path = "/api/{table}/{id}", tag = "public",
    params(("table" = String, Path, description = "Collection name"), ("id" = String, Path, description = "Record id")),
    responses((status = 200, description = "Record"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<ServerState>, Path((table, id)): Path<(String, String)>) -> Result<Json<Record>, JsonApiError> {
    let table = public_table(&table)?;
    state
        .store
        .find_by_id(table, &RecordId::parse(&id))
        .await
        .map(Json)
        .ok_or_else(|| JsonApiError::not_found(format!("{table} {id} not found")))
}
