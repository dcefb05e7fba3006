//! Enrichment upload handler
//!
//! **POST /enrich**: multipart upload with a `file` field; responds with the
//! enriched CSV as an attachment, or `{"error": ...}` when the file is
//! unusable.

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Router,
};
use tracing::info;

use super::{download::serve_output, note_error, read_upload, Upload};
use crate::batch::{enrich_csv, BatchCounts};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// An enriched upload written to the output store
#[derive(Debug)]
pub struct StoredOutput {
    pub file_name: String,
    pub counts: BatchCounts,
}

/// Run the batch for one upload and store the result
pub(crate) async fn enrich_upload(state: &AppState, upload: Upload) -> ApiResult<StoredOutput> {
    let result = run_upload(state, upload).await;
    if let Err(ref e) = result {
        note_error(state, e).await;
    }
    result
}

async fn run_upload(state: &AppState, upload: Upload) -> ApiResult<StoredOutput> {
    info!(
        upload = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.data.len(),
        "Enrichment upload received"
    );

    let output = enrich_csv(upload.data.to_vec(), &state.config.columns, &state.policy).await?;
    let file_name = state.outputs.save(&output.contents).await.map_err(ApiError::Io)?;

    Ok(StoredOutput {
        file_name,
        counts: output.counts,
    })
}

/// POST /enrich
pub async fn enrich_file(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let upload = read_upload(multipart).await?;
    let stored = enrich_upload(&state, upload).await?;
    serve_output(&state, &stored.file_name).await
}

/// Build enrichment API routes
pub fn enrich_routes() -> Router<AppState> {
    Router::new().route("/enrich", post(enrich_file))
}
