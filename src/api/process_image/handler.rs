// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image processing endpoint handler

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::Multipart;
use std::sync::Arc;
use tracing::info;

use super::request::{check_declared_length, read_upload};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::ProcessedImageResult;

/// POST /process-image - Analyze an uploaded image
///
/// Runs handwriting recognition, shape annotation and object detection over
/// the same upload and merges the results.
///
/// # Request
/// - `multipart/form-data` with a `file` field holding the image bytes
///
/// # Response
/// - `text`: Recognized handwritten lines
/// - `annotations`: Circles, rectangles and text regions
/// - `confidence`: Mean object detection score (0.0 when nothing detected)
///
/// A sub-service that fails contributes its empty value; the request still
/// succeeds.
///
/// # Errors
/// - 4xx: Body is not multipart (rejected by the extractor)
/// - 413 Payload Too Large: Upload exceeds the body limit
/// - 422 Unprocessable Entity: No `file` field
/// - 500 Internal Server Error: Upload unreadable or a worker was cancelled
pub async fn process_image_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ProcessedImageResult>, ApiError> {
    check_declared_length(&headers, state.max_upload_bytes)?;
    let bytes = read_upload(&mut multipart).await?;

    let result = state.pipeline.process_image(bytes).await?;

    info!(
        "Image processed: {} lines, {} annotations, confidence {:.3}",
        result.text.len(),
        result.annotations.len(),
        result.confidence
    );

    Ok(Json(result))
}
