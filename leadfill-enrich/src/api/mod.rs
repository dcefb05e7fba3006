//! HTTP API handlers for leadfill-enrich
//!
//! - `GET /`, `POST /`: HTML upload form and completion page
//! - `POST /enrich`: upload, enrich, respond with the CSV
//! - `GET /download/:filename`: stream a stored output, then delete it
//! - `GET /health`

pub mod download;
pub mod enrich;
pub mod health;
pub mod ui;

pub use download::download_routes;
pub use enrich::enrich_routes;
pub use health::health_routes;
pub use ui::ui_routes;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the uploaded CSV
pub const UPLOAD_FIELD: &str = "file";

/// Uploaded file contents
#[derive(Debug)]
pub struct Upload {
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// Pull the `file` field out of a multipart upload
pub async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { file_name, data });
    }

    Err(ApiError::BadRequest(format!(
        "Multipart upload must include a '{}' field",
        UPLOAD_FIELD
    )))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Remember server-side failures for the health endpoint
pub(crate) async fn note_error(state: &AppState, error: &ApiError) {
    if error.status().is_server_error() {
        *state.last_error.write().await = Some(error.to_string());
    }
}
