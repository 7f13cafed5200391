//! Request and response bodies for the `/file` routes.

use crate::registry::{FileRecordWithContent, UploadItem};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// One file in an upload request. `file_data` is standard base64.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub user_id: String,
    pub file_name: String,
    pub content_type: String,
    pub file_data: String,
}

impl UploadRequest {
    pub fn into_item(self) -> Result<(String, UploadItem), base64::DecodeError> {
        let content = BASE64_STANDARD.decode(self.file_data.as_bytes())?;
        Ok((
            self.user_id,
            UploadItem::new(self.file_name, self.content_type, content),
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerFiles {
    pub user_id: String,
    pub files: Vec<FileRecordWithContent>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
}
