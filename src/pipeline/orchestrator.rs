// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request orchestration: one upload, three concurrent sub-services

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use super::outcome::{FailureKind, ServiceFailure, ServiceOutcome};
use super::services;
use crate::version;
use crate::vision::annotation::{Annotation, ShapeAnnotator};
use crate::vision::detection::DetectionReport;
use crate::vision::model_manager::{VisionModelInfo, VisionModelManager};

/// Failures that abort the whole request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{service} service task failed: {message}")]
    TaskFailed {
        service: &'static str,
        message: String,
    },
}

/// Settle one joined worker
///
/// A panicking worker counts as that service failing, like any other error
/// inside it. Only a cancelled worker aborts the request.
fn settle<T>(
    service: &'static str,
    joined: Result<ServiceOutcome<T>, JoinError>,
) -> Result<ServiceOutcome<T>, PipelineError> {
    match joined {
        Ok(outcome) => Ok(outcome),
        Err(error) if error.is_panic() => {
            let failure = ServiceFailure::new(FailureKind::Inference, "worker panicked");
            warn!(service, kind = %failure.kind, "⚠️ {} service failed: {}", service, failure.message);
            Ok(ServiceOutcome::Failed(failure))
        }
        Err(error) => Err(PipelineError::TaskFailed {
            service,
            message: error.to_string(),
        }),
    }
}

/// Merged response body of `/process-image`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessedImageResult {
    pub text: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Mean score of the kept object detections; 0.0 when none
    pub confidence: f32,
}

/// Per-service outcomes before degradation
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub text: ServiceOutcome<Vec<String>>,
    pub annotations: ServiceOutcome<Vec<Annotation>>,
    pub detection: ServiceOutcome<DetectionReport>,
}

impl PipelineReport {
    /// Collapse into the wire result, substituting degraded values
    pub fn into_result(self) -> ProcessedImageResult {
        ProcessedImageResult {
            text: self.text.into_degraded(),
            annotations: self.annotations.into_degraded(),
            confidence: self.detection.into_degraded().confidence,
        }
    }
}

/// Body of `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub models: Vec<VisionModelInfo>,
}

/// Fans each upload out to the recognizer, annotator and detector
#[derive(Debug, Clone)]
pub struct ImagePipeline {
    models: Arc<VisionModelManager>,
    annotator: Arc<ShapeAnnotator>,
}

impl ImagePipeline {
    pub fn new(models: Arc<VisionModelManager>, annotator: ShapeAnnotator) -> Self {
        Self {
            models,
            annotator: Arc::new(annotator),
        }
    }

    pub fn models(&self) -> &Arc<VisionModelManager> {
        &self.models
    }

    /// Run all three sub-services and keep their individual outcomes
    ///
    /// The services run on the blocking pool concurrently, each over the same
    /// shared bytes. A worker that panics degrades its own service; only a cancelled
    /// worker fails the call.
    pub async fn analyze(&self, bytes: Bytes) -> Result<PipelineReport, PipelineError> {
        let start = Instant::now();
        debug!("Processing upload of {} bytes", bytes.len());

        let text_task = {
            let recognizer = self.models.recognizer();
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || services::recognize_text(recognizer.as_deref(), &bytes))
        };
        let annotation_task = {
            let annotator = Arc::clone(&self.annotator);
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || services::detect_annotations(&annotator, &bytes))
        };
        let detection_task = {
            let detector = self.models.detector();
            tokio::task::spawn_blocking(move || services::detect_objects(detector.as_deref(), &bytes))
        };

        let (text, annotations, detection) = tokio::join!(text_task, annotation_task, detection_task);

        let report = PipelineReport {
            text: settle("handwriting", text)?,
            annotations: settle("annotation", annotations)?,
            detection: settle("detection", detection)?,
        };

        info!(
            text_failed = report.text.is_failed(),
            annotations_failed = report.annotations.is_failed(),
            detection_failed = report.detection.is_failed(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Image processed"
        );

        Ok(report)
    }

    /// Process an upload into the merged response body
    pub async fn process_image(&self, bytes: Bytes) -> Result<ProcessedImageResult, PipelineError> {
        Ok(self.analyze(bytes).await?.into_result())
    }

    /// Liveness plus model availability
    pub fn health_check(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            version: version::VERSION,
            models: self.models.list_models(),
        }
    }
}
