//! `/file` endpoint handlers.

use super::AppState;
use super::types::{ApiResponse, DeleteSummary, OwnerFiles, UploadRequest};
use crate::registry::{FileLookup, RegistryError};
use crate::storage::ObjectStorage;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// HTTP status for a registry failure. Batch aborts report their cause.
pub fn status_for(err: &RegistryError) -> StatusCode {
    match err.root_cause() {
        RegistryError::Validation { .. } => StatusCode::BAD_REQUEST,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::Backend(_) | RegistryError::BatchAborted { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: RegistryError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Registry operation failed: {}", err);
    } else {
        tracing::warn!("Registry operation rejected: {}", err);
    }
    (status, Json(ApiResponse::error(err.to_string()))).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(message)),
    )
        .into_response()
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    if body.is_empty() {
        return Err(bad_request("Request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid request body: {e}")))
}

fn attachment(file_id: &str, content: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"file_{file_id}\""),
            ),
        ],
        content,
    )
        .into_response()
}

/// `GET /file`
pub async fn list_all<S, L>(State(state): State<AppState<S, L>>) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.list_all().await {
        Ok(records) => (StatusCode::OK, Json(ApiResponse::ok(records))).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /file`
pub async fn upload<S, L>(State(state): State<AppState<S, L>>, body: Bytes) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    let request: UploadRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let (owner_id, item) = match request.into_item() {
        Ok(decoded) => decoded,
        Err(e) => return bad_request(format!("fileData is not valid base64: {e}")),
    };

    match state.registry.upload(&owner_id, item).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message("File uploaded", record)),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /file/multiple`
///
/// Every item is stored under the owner named by the first item.
pub async fn upload_many<S, L>(State(state): State<AppState<S, L>>, body: Bytes) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    let requests: Vec<UploadRequest> = match parse_body(&body) {
        Ok(requests) => requests,
        Err(response) => return response,
    };
    let Some(owner_id) = requests.first().map(|r| r.user_id.clone()) else {
        return bad_request("At least one file is required");
    };

    let mut items = Vec::with_capacity(requests.len());
    for (index, request) in requests.into_iter().enumerate() {
        match request.into_item() {
            Ok((_, item)) => items.push(item),
            Err(e) => {
                return bad_request(format!("fileData of item {index} is not valid base64: {e}"));
            }
        }
    }

    match state.registry.upload_many(&owner_id, items).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                format!("{} files uploaded", records.len()),
                records,
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /file/user/{userId}`
pub async fn list_by_owner<S, L>(
    State(state): State<AppState<S, L>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.list_by_owner(&user_id).await {
        Ok(files) => (
            StatusCode::OK,
            Json(ApiResponse::ok(OwnerFiles { user_id, files })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /file/user/{userId}/{fileId}`
pub async fn download_for_owner<S, L>(
    State(state): State<AppState<S, L>>,
    Path((user_id, file_id)): Path<(String, String)>,
) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.download_for_owner(&user_id, &file_id).await {
        Ok(content) => attachment(&file_id, content),
        Err(e) => error_response(e),
    }
}

/// `GET /file/{fileId}`
pub async fn fetch_by_id<S, L>(
    State(state): State<AppState<S, L>>,
    Path(file_id): Path<String>,
) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.fetch_by_id(&file_id).await {
        Ok(content) => attachment(&file_id, content),
        Err(e) => error_response(e),
    }
}

/// `DELETE /file`
pub async fn delete_all<S, L>(State(state): State<AppState<S, L>>) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.delete_all().await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                "All files deleted",
                DeleteSummary { deleted },
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /file/presign/{userId}/{fileName}`
pub async fn presign_upload<S, L>(
    State(state): State<AppState<S, L>>,
    Path((user_id, file_name)): Path<(String, String)>,
) -> Response
where
    S: ObjectStorage,
    L: FileLookup,
{
    match state.registry.presign_upload(&user_id, &file_name).await {
        Ok(presigned) => (StatusCode::OK, Json(ApiResponse::ok(presigned))).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&RegistryError::Validation {
                content_type: "text/plain".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&RegistryError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&RegistryError::BackendUnavailable("no creds".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&RegistryError::Backend(StorageError::StorageError(
                "boom".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_batch_abort_reports_cause_status() {
        let err = RegistryError::BatchAborted {
            index: 1,
            file_name: "b.txt".into(),
            committed: 1,
            source: Box::new(RegistryError::Validation {
                content_type: "text/plain".into(),
            }),
        };
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }
}
