// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reading the image out of a multipart upload

use axum::http::{header::CONTENT_LENGTH, HeaderMap, StatusCode};
use axum_extra::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use tracing::debug;

use crate::api::errors::ApiError;

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Refuse a declared body size above `limit` before reading anything
///
/// Bodies without a usable `Content-Length` are left to the streaming limit.
pub fn check_declared_length(headers: &HeaderMap, limit: usize) -> Result<(), ApiError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match declared {
        Some(length) if length > limit as u64 => Err(ApiError::PayloadTooLarge(format!(
            "{} bytes exceeds the {} byte limit",
            length, limit
        ))),
        _ => Ok(()),
    }
}

/// Collect the bytes of the `file` field
///
/// Other fields are skipped. The bytes are not validated here; each
/// sub-service decodes them on its own.
///
/// # Errors
/// - `MissingField` if no `file` field is present
/// - `PayloadTooLarge` if the body exceeds the configured limit
/// - `UploadRead` if the multipart stream cannot be read
pub async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().map(str::to_string);
        if name.as_deref() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", name);
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(upload_error)?;
        debug!(
            "Received upload {:?}: {} bytes",
            file_name.as_deref().unwrap_or("<unnamed>"),
            bytes.len()
        );
        return Ok(bytes);
    }

    Err(ApiError::MissingField(FILE_FIELD.to_string()))
}

fn upload_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(error.body_text())
    } else {
        ApiError::UploadRead(error.body_text())
    }
}
