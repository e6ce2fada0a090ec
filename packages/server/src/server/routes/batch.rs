//! Batch submission and status endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use batcher::{
    BatchJob, OutputFormat, OutputLocations, ScrapeOptions, SubmitMode, SubmitOptions,
    SubmitOutcome,
};

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Request body for `POST /v1/batch`.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub mode: SubmitMode,
    #[serde(default)]
    pub collate: bool,
    pub callback_url: Option<String>,
    #[serde(default)]
    pub callback_headers: HashMap<String, String>,
    /// Output formats per item; defaults to markdown.
    pub formats: Option<Vec<OutputFormat>>,
    /// Per-item scrape timeout; defaults to the server's configured value.
    pub timeout_secs: Option<u64>,
}

/// Response for an accepted async submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status_url: String,
    pub items: Vec<SubmittedItemResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collated_location: Option<String>,
}

/// One submitted URL with its predicted output locations.
#[derive(Debug, Serialize)]
pub struct SubmittedItemResponse {
    pub url: String,
    pub outputs: OutputLocations,
}

/// Submit a batch of URLs.
///
/// Async mode (the default) responds as soon as the job row exists, with
/// predicted output locations; sync mode blocks until the job is terminal
/// and responds with the full snapshot.
pub async fn submit_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    let scrape = ScrapeOptions {
        formats: request
            .formats
            .unwrap_or_else(|| vec![OutputFormat::Markdown]),
        timeout_secs: request
            .timeout_secs
            .unwrap_or(state.config.scrape_timeout_secs),
    };
    let options = SubmitOptions {
        urls: request.urls,
        mode: request.mode,
        collate: request.collate,
        callback_url: request.callback_url,
        callback_headers: request.callback_headers,
        scrape,
    };

    match state.dispatcher.submit(options).await? {
        SubmitOutcome::Accepted(submission) => {
            let response = SubmitResponse {
                job_id: submission.job_id,
                status_url: state.config.status_url(submission.job_id),
                items: submission
                    .items
                    .into_iter()
                    .map(|item| SubmittedItemResponse {
                        url: item.url,
                        outputs: item.outputs,
                    })
                    .collect(),
                collated_location: submission.collated_location,
            };
            Ok(Json(response).into_response())
        }
        SubmitOutcome::Finished(job) => Ok(Json(job).into_response()),
    }
}

/// Current snapshot of a job. Unknown (or unparseable) ids are 404s.
pub async fn status_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchJob>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found(format!("job not found: {id}")))?;
    let job = state.dispatcher.status(id).await?;
    Ok(Json(job))
}
