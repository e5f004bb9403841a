use axum::{body::Bytes, extract::{multipart::MultipartError, Multipart, State}, http::StatusCode, Json};
use serde_json::Value;
use tracing::{info, warn};

use service::errors::{ServiceError, UploadRejection};
use service::file::{StoredUpload, UploadKind};
use service::storage::{Record, Table};
use service::validation::{self, Mode};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

struct FilePart {
    file_name: Option<String>,
    content_type: String,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> JsonApiError {
    let status = e.status();
    let title = if status == StatusCode::PAYLOAD_TOO_LARGE { "Upload Rejected" } else { "Validation Error" };
    JsonApiError::new(status, title, Some(e.body_text()))
}

/// Split a multipart body into the `file` part and the remaining text fields.
async fn read_form(mut multipart: Multipart) -> Result<(Option<FilePart>, Record), JsonApiError> {
    let mut file = None;
    let mut fields = Record::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            file = Some(FilePart { file_name, content_type, bytes });
        } else if !name.is_empty() {
            let text = field.text().await.map_err(multipart_error)?;
            fields.insert(name, Value::String(text));
        }
    }
    Ok((file, fields))
}

#[utoipa::path(post, path = "/admin/uploads", tag = "admin",
    responses((status = 201, description = "File stored"), (status = 413, description = "Too large"), (status = 415, description = "Not an image or video")))]
pub async fn upload_file(State(state): State<ServerState>, multipart: Multipart) -> Result<(StatusCode, Json<StoredUpload>), JsonApiError> {
    let (file, _) = read_form(multipart).await?;
    let file = file.ok_or_else(|| JsonApiError::bad_request("multipart field 'file' is required"))?;
    let stored = state.uploads.save(file.file_name.as_deref(), &file.content_type, &file.bytes).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(post, path = "/admin/uploads/gallery", tag = "admin",
    responses((status = 201, description = "Gallery item created"), (status = 415, description = "Not an image")))]
pub async fn upload_gallery(State(state): State<ServerState>, multipart: Multipart) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    upload_with_record(state, multipart, Table::Gallery, UploadKind::Image, "image_url").await
}

#[utoipa::path(post, path = "/admin/uploads/videos", tag = "admin",
    responses((status = 201, description = "Video created"), (status = 415, description = "Not a video")))]
pub async fn upload_video(State(state): State<ServerState>, multipart: Multipart) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    upload_with_record(state, multipart, Table::Videos, UploadKind::Video, "video_url").await
}

/// Save the file, then insert a record pointing at it.
///
/// The two steps are not coordinated: if the insert fails the file stays in
/// the upload directory and is only reported in the log.
async fn upload_with_record(
    state: ServerState,
    multipart: Multipart,
    table: Table,
    expected: UploadKind,
    url_field: &str,
) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    let (file, fields) = read_form(multipart).await?;
    let file = file.ok_or_else(|| JsonApiError::bad_request("multipart field 'file' is required"))?;
    if UploadKind::from_content_type(&file.content_type)? != expected {
        return Err(ServiceError::Upload(UploadRejection::UnsupportedType(file.content_type)).into());
    }

    // Check the text fields before anything is written; the url is filled in after saving.
    let mut record = validation::sanitize_record(fields);
    record.insert(url_field.to_string(), Value::String("pending".into()));
    validation::validate(table, &mut record, Mode::Create)?;

    let stored = state.uploads.save(file.file_name.as_deref(), &file.content_type, &file.bytes).await?;
    record.insert(url_field.to_string(), Value::String(stored.public_url.clone()));
    match state.store.insert(table, &record).await {
        Ok(created) => {
            info!(table = %table, file = %stored.file_name, "upload recorded");
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(e) => {
            warn!(table = %table, orphaned = %state.uploads.path_of(&stored.file_name).display(), "record insert failed after upload; file left on disk");
            Err(e.into())
        }
    }
}
