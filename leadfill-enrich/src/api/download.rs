//! Enriched file download
//!
//! **GET /download/:filename**: streams a stored output. The response body
//! owns the file's [`TempOutput`] guard, so the file is removed once the body
//! has been sent or dropped.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::header,
    response::Response,
    routing::get,
    Router,
};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::storage::TempOutput;
use crate::AppState;

/// File byte stream that keeps its cleanup guard alive until dropped
struct GuardedStream {
    inner: ReaderStream<tokio::fs::File>,
    _guard: TempOutput,
}

impl Stream for GuardedStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// GET /download/:filename
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    serve_output(&state, &filename).await
}

/// Stream a stored output as a CSV attachment, deleting it afterwards
pub(crate) async fn serve_output(state: &AppState, filename: &str) -> ApiResult<Response> {
    let (file, guard) = state
        .outputs
        .open(filename)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", filename)))?;

    tracing::info!(file = %filename, "Serving enriched output");

    let stream = GuardedStream {
        inner: ReaderStream::new(file),
        _guard: guard,
    };

    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(format!("Failed to build download response: {}", e)))
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new().route("/download/:filename", get(download_file))
}
