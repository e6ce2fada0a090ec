//! Artifact retrieval endpoint.
//!
//! Serves stored artifacts by object path, making predicted locations
//! resolvable through the same addressing mechanism that produced them.
//! Returns 404 until the artifact has been written.

use axum::{
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
};

use batcher::ArtifactStore;

use crate::server::app::AppState;
use crate::server::error::ApiError;

/// `GET /v1/artifacts/{path}`
pub async fn artifact_handler(
    Extension(state): Extension<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state
        .artifacts
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("artifact not found: {path}")))?;

    Ok((
        [(header::CONTENT_TYPE, artifact.content_type)],
        artifact.bytes,
    )
        .into_response())
}
