//! Browser pages
//!
//! **GET /**: upload form. **POST /**: runs the enrichment and links the
//! stored result at `/download/<file>`.

use axum::{
    extract::{Multipart, State},
    response::Html,
    routing::get,
    Router,
};

use super::enrich::enrich_upload;
use super::read_upload;
use crate::error::ApiResult;
use crate::AppState;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Leadfill - Contact Enrichment</title>
</head>
<body style="text-align:center; font-family:sans-serif;">
    <h2>Enrich Agent Contacts</h2>
    <p>Upload a CSV with MLS Number, First Name and Last Name columns.</p>
    <form action="/" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept=".csv,text/csv" required>
        <button type="submit">Enrich</button>
    </form>
</body>
</html>
"#;

/// GET /
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// POST /
pub async fn upload_and_link(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Html<String>> {
    let upload = read_upload(multipart).await?;
    let stored = enrich_upload(&state, upload).await?;
    let counts = stored.counts;

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<body style="text-align:center; font-family:sans-serif;">
    <h2>Enrichment Complete</h2>
    <p>{total} rows: {ok} matched, {no_match} not found, {skipped} skipped, {error} unreadable</p>
    <a href="/download/{file}" download>Download Enriched CSV</a>
</body>
</html>
"#,
        total = counts.total(),
        ok = counts.ok,
        no_match = counts.no_match,
        skipped = counts.skipped,
        error = counts.error,
        file = stored.file_name,
    )))
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(upload_form).post(upload_and_link))
}
