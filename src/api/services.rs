use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use tracing::info;

use super::models::{
    DebugSearchRequest, DebugSearchResponse, DownloadRequest, HealthResponse, JobAcceptedResponse,
};
use super::state::AppState;
use super::utils::{attachment_disposition, read_body, require_json};
use super::validation::validate_request;
use crate::api::error::ApiError;
use crate::worker::{self, BatchDownloadJob, Sink, SinkTarget};

/// Job submission endpoint (POST /download)
///
/// Validates the request, registers a job in `starting` and hands it to a
/// background task. Responds 202 right away; the client polls
/// `/status/{job_id}` afterwards.
pub async fn start_download(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    require_json(&headers)?;
    let body = read_body(body, state.config.server.max_payload_bytes.as_usize()).await?;
    let request: DownloadRequest = serde_json::from_slice(&body)?;
    let query = validate_request(&request, &state.config.server)?;

    let entry = state.registry.create(&query);
    let job_id = entry.id().to_string();

    let job = BatchDownloadJob::builder()
        .query(query)
        .search(state.search.clone())
        .fetcher(state.fetcher.clone())
        .target(SinkTarget::Archive)
        .fetch_timeout(state.config.fetch.timeout())
        .politeness_delay(state.config.fetch.politeness_delay())
        .metrics(state.metrics.clone())
        .build();

    worker::spawn(job, entry);
    state.metrics.job_accepted();

    let response = JobAcceptedResponse {
        success: true,
        job_id,
        message: "Download started".to_string(),
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Job status endpoint (GET /status/{job_id})
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.registry.get(&job_id)?;
    Ok((StatusCode::OK, Json(snapshot)))
}

/// Result retrieval endpoint (GET /download/{job_id})
///
/// Serves the finished archive. Can be called any number of times once the
/// job is `completed`; 409 before that.
pub async fn download_archive(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (filename, bytes) = match state.registry.retrieve_sink(&job_id)? {
        Sink::Archive {
            filename, bytes, ..
        } => (filename, bytes),
        Sink::Folder { path, .. } => {
            return Err(ApiError::Internal(format!(
                "job {} wrote to {}, not an archive",
                job_id,
                path.display()
            )));
        }
    };

    info!(job_id = %job_id, filename = %filename, size = bytes.len(), "Serving archive");

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
        (header::CONTENT_DISPOSITION, attachment_disposition(&filename)?),
    ];

    Ok((StatusCode::OK, headers, bytes))
}

/// Cancellation endpoint (POST /cancel/{job_id})
///
/// Returns the snapshot at the time of the request; the job reaches `failed`
/// shortly after, at its next cancellation point.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.registry.cancel(&job_id)?;
    Ok((StatusCode::OK, Json(snapshot)))
}

/// Provider inspection endpoint (POST /debug-search)
///
/// Runs a one-result search and echoes the raw record with its field names.
pub async fn debug_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    require_json(&headers)?;
    let body = read_body(body, state.config.server.max_payload_bytes.as_usize()).await?;
    let request: DebugSearchRequest = serde_json::from_slice(&body)?;

    let text = request.query.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidPayload("Query is required".to_string()));
    }

    let records = state.search.search_raw(text, 1).await?;
    let Some(first) = records.into_iter().next() else {
        return Err(ApiError::NotFound("No results found".to_string()));
    };

    let available_fields = first
        .as_object()
        .map(|fields| fields.keys().cloned().collect())
        .unwrap_or_default();

    let response = DebugSearchResponse {
        success: true,
        result_count: 1,
        first_result: first,
        available_fields,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.registry.len(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
