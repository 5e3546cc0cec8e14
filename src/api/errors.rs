// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::PipelineError;

/// JSON error body: `{"detail": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Field required: {0}")]
    MissingField(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Failed to read upload: {0}")]
    UploadRead(String),

    #[error("Error processing image: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            detail: self.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UploadRead(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.status_code() {
            status if status.is_server_error() => tracing::error!("❌ {}", self),
            _ => tracing::warn!("{}", self),
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
