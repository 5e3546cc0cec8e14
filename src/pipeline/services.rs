// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! The three sub-services as blocking functions over raw upload bytes
//!
//! Each decodes the bytes itself and turns every error into a typed
//! `ServiceOutcome::Failed`, logging it once here.

use tracing::{debug, warn};

use super::outcome::{ServiceFailure, ServiceOutcome};
use crate::vision::annotation::{Annotation, ShapeAnnotator};
use crate::vision::detection::{DetectionReport, ObjectDetector};
use crate::vision::handwriting::HandwritingRecognizer;
use crate::vision::image_utils::decode_image_bytes;

/// Handwritten text lines, or a failure
pub fn recognize_text(
    recognizer: Option<&HandwritingRecognizer>,
    bytes: &[u8],
) -> ServiceOutcome<Vec<String>> {
    let outcome = match recognizer {
        None => ServiceOutcome::Failed(ServiceFailure::model_unavailable("handwriting")),
        Some(recognizer) => match decode_image_bytes(bytes) {
            Err(e) => ServiceOutcome::Failed(e.into()),
            Ok((image, _)) => match recognizer.recognize(&image) {
                Ok(result) => {
                    debug!(
                        lines = result.lines.len(),
                        tokens = result.token_count,
                        elapsed_ms = result.processing_time_ms,
                        "Handwriting recognized"
                    );
                    ServiceOutcome::Completed(result.lines)
                }
                Err(e) => ServiceOutcome::Failed(ServiceFailure::inference(&e)),
            },
        },
    };
    log_failure("handwriting", &outcome);
    outcome
}

/// Circles, rectangles and text regions, or a failure
pub fn detect_annotations(annotator: &ShapeAnnotator, bytes: &[u8]) -> ServiceOutcome<Vec<Annotation>> {
    let outcome = ServiceOutcome::from(annotator.detect_annotations(bytes));
    log_failure("annotation", &outcome);
    outcome
}

/// Object detections with their mean confidence, or a failure
pub fn detect_objects(detector: Option<&ObjectDetector>, bytes: &[u8]) -> ServiceOutcome<DetectionReport> {
    let outcome = match detector {
        None => ServiceOutcome::Failed(ServiceFailure::model_unavailable("detection")),
        Some(detector) => match decode_image_bytes(bytes) {
            Err(e) => ServiceOutcome::Failed(e.into()),
            Ok((image, _)) => match detector.detect(&image) {
                Ok(report) => ServiceOutcome::Completed(report),
                Err(e) => ServiceOutcome::Failed(ServiceFailure::inference(&e)),
            },
        },
    };
    log_failure("detection", &outcome);
    outcome
}

fn log_failure<T>(service: &str, outcome: &ServiceOutcome<T>) {
    if let Some(failure) = outcome.failure() {
        warn!(service, kind = %failure.kind, "⚠️ {} service failed: {}", service, failure.message);
    }
}
